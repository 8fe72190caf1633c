//! Telegram adapter (teloxide).
//!
//! Implements the inbound side of the relay: source-channel resolution,
//! update → domain mapping, the polling router and the `tbf-core`
//! FileFetcher port (two-step getFile + download, into memory).

use std::io::Cursor;

use async_trait::async_trait;
use teloxide::{net::Download, prelude::*, types::Recipient};
use tracing::info;

pub mod mapper;
pub mod router;

use tbf_core::{domain::ChatId, errors::Error, ports::FileFetcher, Result};

#[derive(Clone)]
pub struct TelegramFiles {
    bot: Bot,
}

impl TelegramFiles {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl FileFetcher for TelegramFiles {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(file_id.to_string())
            .await
            .map_err(|e| Error::Http(format!("telegram getFile error: {e}")))?;

        let mut buf = Cursor::new(Vec::new());
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .map_err(|e| Error::Http(format!("telegram download error: {e}")))?;

        Ok(buf.into_inner())
    }
}

/// Resolve the configured source channel (numeric id or `@username`) to its
/// chat id, logging what it turned out to be.
pub async fn resolve_source(bot: &Bot, source: &str) -> Result<ChatId> {
    let recipient = match source.parse::<i64>() {
        Ok(id) => Recipient::Id(teloxide::types::ChatId(id)),
        Err(_) => Recipient::ChannelUsername(source.to_string()),
    };

    let chat = bot
        .get_chat(recipient)
        .await
        .map_err(|e| Error::Http(format!("telegram getChat error: {e}")))?;

    info!(
        "source channel resolved: {} (id: {}, kind: {})",
        chat.title().unwrap_or("unknown"),
        chat.id.0,
        kind_label(&chat)
    );
    Ok(ChatId(chat.id.0))
}

fn kind_label(chat: &teloxide::types::Chat) -> &'static str {
    if chat.is_channel() {
        "channel"
    } else if chat.is_supergroup() {
        "supergroup"
    } else if chat.is_group() {
        "group"
    } else {
        "private"
    }
}
