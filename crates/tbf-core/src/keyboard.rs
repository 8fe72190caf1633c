//! Source → destination inline keyboard translation.

use crate::domain::{InlineKeyboard, SourceKeyboard, UrlButton};

/// Translate a source keyboard grid to the destination schema.
///
/// Only buttons with both a non-empty display text and a URL survive;
/// callback-data and web-app buttons have no destination equivalent and are
/// dropped. Rows that end up empty are omitted, and a grid with zero
/// surviving rows translates to `None`. Row order and intra-row order are
/// preserved.
pub fn translate_keyboard(keyboard: &SourceKeyboard) -> Option<InlineKeyboard> {
    let rows: Vec<Vec<UrlButton>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|button| {
                    let url = button.url.as_deref()?;
                    if button.text.is_empty() || url.is_empty() {
                        return None;
                    }
                    Some(UrlButton {
                        text: button.text.clone(),
                        url: url.to_string(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboard {
            inline_keyboard: rows,
        })
    }
}
