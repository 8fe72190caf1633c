use async_trait::async_trait;

use crate::{domain::InlineKeyboard, Result};

/// Source-platform file retrieval port.
///
/// Retrieval is two-step on the wire (resolve the file id to a transient
/// path, then fetch the bytes); implementations hide both steps behind one
/// call.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// Destination-platform delivery port.
///
/// Implementations own the one-shot formatting-relaxation retry; an `Err`
/// from these methods is terminal for the item being sent.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Send markdown text, optionally with an inline keyboard.
    async fn send_text(&self, text: &str, keyboard: Option<&InlineKeyboard>) -> Result<()>;

    /// Send a photo album. Single photos go through the same path so
    /// captions and keyboards behave identically to grouped posts.
    async fn send_album(
        &self,
        photos: Vec<Vec<u8>>,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()>;
}
