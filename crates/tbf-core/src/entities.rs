//! Entity-span handling: UTF-16 offset conversion and link extraction.
//!
//! The source platform reports entity offsets in UTF-16 code units while the
//! local text is UTF-8, so every span access goes through
//! [`utf16_to_byte_offset`].

use crate::domain::{Entity, EntityKind};

/// A (display text, destination URL) pair extracted from one entity.
pub type Link = (String, String);

/// Map a UTF-16 code-unit offset to a byte offset into `text`.
///
/// An offset that lands inside a surrogate pair resolves to the start of that
/// character (the truncated half is dropped, mirroring a lossy UTF-16
/// decode); offsets past the end clamp to `text.len()`. Identity for
/// pure-ASCII text.
pub fn utf16_to_byte_offset(text: &str, utf16_offset: usize) -> usize {
    let mut remaining = utf16_offset;
    for (byte_idx, ch) in text.char_indices() {
        let units = ch.len_utf16();
        if remaining < units {
            return byte_idx;
        }
        remaining -= units;
    }
    text.len()
}

/// Extract hyperlink-like entities as ordered (text, url) pairs.
///
/// Keeps explicit links, bare URLs and mentions, in ascending source-offset
/// order (stable, so entities sharing an offset keep their original order).
/// Explicit links pair the spanned text with their carried URL and are
/// dropped if either side is empty. Bare URLs pair the text with itself.
/// Mentions must start with `@`; the display text keeps the `@` while the
/// URL is synthesized from the bare handle. Duplicates are allowed.
pub fn extract_links(text: &str, entities: &[Entity]) -> Vec<Link> {
    let mut linkish: Vec<&Entity> = entities
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EntityKind::TextLink { .. } | EntityKind::Url | EntityKind::Mention
            )
        })
        .collect();
    linkish.sort_by_key(|e| e.offset);

    let mut links = Vec::new();
    for entity in linkish {
        let start = utf16_to_byte_offset(text, entity.offset);
        let end = utf16_to_byte_offset(text, entity.offset + entity.length);
        let span = text[start..end].trim();

        match &entity.kind {
            EntityKind::TextLink { url } => {
                if !span.is_empty() && !url.is_empty() {
                    links.push((span.to_string(), url.clone()));
                }
            }
            EntityKind::Url => {
                if !span.is_empty() {
                    links.push((span.to_string(), span.to_string()));
                }
            }
            EntityKind::Mention => {
                if let Some(handle) = span.strip_prefix('@') {
                    links.push((span.to_string(), format!("https://t.me/{handle}")));
                }
            }
            EntityKind::Other => {}
        }
    }
    links
}
