//! teloxide wire types → domain mapping.

use teloxide::types::{
    InlineKeyboardButtonKind, InlineKeyboardMarkup, Message, MessageEntity, MessageEntityKind,
    PhotoSize,
};

use tbf_core::domain::{
    ChannelPost, ChatId, Entity, EntityKind, MessageId, PhotoVariant, PostBody, SourceButton,
    SourceKeyboard,
};

/// Map one inbound message (or channel post) into the domain model.
///
/// Returns `None` for messages that are neither text nor photo; the relay
/// has nothing to do with those.
pub fn map_post(msg: &Message) -> Option<ChannelPost> {
    let body = if let Some(text) = msg.text() {
        PostBody::Text {
            text: text.to_string(),
            entities: map_entities(msg.entities()),
        }
    } else if let Some(photos) = msg.photo() {
        PostBody::Photo {
            variants: photos.iter().map(map_variant).collect(),
            caption: msg.caption().unwrap_or_default().to_string(),
            caption_entities: map_entities(msg.caption_entities()),
        }
    } else {
        return None;
    };

    Some(ChannelPost {
        message_id: MessageId(msg.id.0),
        chat_id: ChatId(msg.chat.id.0),
        body,
        keyboard: msg.reply_markup().map(map_keyboard),
        media_group_id: msg.media_group_id().map(str::to_string),
    })
}

fn map_entities(entities: Option<&[MessageEntity]>) -> Vec<Entity> {
    entities
        .unwrap_or_default()
        .iter()
        .map(|e| Entity {
            kind: match &e.kind {
                MessageEntityKind::TextLink { url } => EntityKind::TextLink {
                    url: url.to_string(),
                },
                MessageEntityKind::Url => EntityKind::Url,
                MessageEntityKind::Mention => EntityKind::Mention,
                _ => EntityKind::Other,
            },
            offset: e.offset,
            length: e.length,
        })
        .collect()
}

fn map_variant(photo: &PhotoSize) -> PhotoVariant {
    PhotoVariant {
        file_id: photo.file.id.clone(),
        width: photo.width,
        height: photo.height,
        file_size: photo.file.size,
    }
}

fn map_keyboard(markup: &InlineKeyboardMarkup) -> SourceKeyboard {
    SourceKeyboard {
        rows: markup
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| SourceButton {
                        text: button.text.clone(),
                        url: match &button.kind {
                            InlineKeyboardButtonKind::Url(url) => Some(url.to_string()),
                            _ => None,
                        },
                    })
                    .collect()
            })
            .collect(),
    }
}
