//! Domain model for relayed channel posts.
//!
//! No teloxide/reqwest types here; adapters map into these.

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A rich-text entity span. Offset and length are in UTF-16 code units, the
/// unit the source entity model reports.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    /// Inline link carrying an explicit destination URL.
    TextLink { url: String },
    /// Bare URL written out in the text.
    Url,
    /// `@username` mention.
    Mention,
    /// Anything else (bold, code, hashtag, ...); ignored by link extraction.
    Other,
}

/// One size variant of a photo.
#[derive(Clone, Debug)]
pub struct PhotoVariant {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u32,
}

/// Pick the highest-resolution variant: the one with the greatest reported
/// byte size.
pub fn best_variant(variants: &[PhotoVariant]) -> Option<&PhotoVariant> {
    variants.iter().max_by_key(|v| v.file_size)
}

/// Inline keyboard as received from the source platform. Buttons whose
/// action is not a URL (callback data, web apps, ...) carry `url: None`.
#[derive(Clone, Debug)]
pub struct SourceKeyboard {
    pub rows: Vec<Vec<SourceButton>>,
}

#[derive(Clone, Debug)]
pub struct SourceButton {
    pub text: String,
    pub url: Option<String>,
}

/// Inline keyboard in the destination schema: URL buttons only. Serializes
/// to the wire form `{"inline_keyboard": [[{"text", "url"}]]}`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<UrlButton>>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct UrlButton {
    pub text: String,
    pub url: String,
}

/// Body of a channel post. Posts that are neither text nor photo are not
/// mapped into the domain at all.
#[derive(Clone, Debug)]
pub enum PostBody {
    Text {
        text: String,
        entities: Vec<Entity>,
    },
    Photo {
        variants: Vec<PhotoVariant>,
        caption: String,
        caption_entities: Vec<Entity>,
    },
}

/// One inbound channel post, immutable once mapped from the wire.
#[derive(Clone, Debug)]
pub struct ChannelPost {
    pub message_id: MessageId,
    pub chat_id: ChatId,
    pub body: PostBody,
    pub keyboard: Option<SourceKeyboard>,
    pub media_group_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_variant_prefers_largest_file_size() {
        let variants = vec![
            PhotoVariant {
                file_id: "small".to_string(),
                width: 90,
                height: 60,
                file_size: 1_200,
            },
            PhotoVariant {
                file_id: "large".to_string(),
                width: 1280,
                height: 853,
                file_size: 210_000,
            },
            PhotoVariant {
                file_id: "medium".to_string(),
                width: 320,
                height: 213,
                file_size: 18_000,
            },
        ];
        assert_eq!(best_variant(&variants).unwrap().file_id, "large");
    }

    #[test]
    fn best_variant_of_empty_is_none() {
        assert!(best_variant(&[]).is_none());
    }

    #[test]
    fn keyboard_serializes_to_wire_form() {
        let kb = InlineKeyboard {
            inline_keyboard: vec![vec![UrlButton {
                text: "Open".to_string(),
                url: "https://example.com".to_string(),
            }]],
        };
        let json = serde_json::to_string(&kb).unwrap();
        assert_eq!(
            json,
            r#"{"inline_keyboard":[[{"text":"Open","url":"https://example.com"}]]}"#
        );
    }
}
