use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use tracing::info;

use tbf_bale::BaleClient;
use tbf_core::{config::Config, logging, pipeline::Pipeline};
use tbf_telegram::{resolve_source, router, TelegramFiles};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("tbf");

    let cfg = Arc::new(Config::load().context("configuration")?);

    // Startup connectivity checks: any failure here aborts before polling.
    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let me = bot.get_me().await.context("telegram getMe failed")?;
    info!("telegram api: connected (@{})", me.username());

    let source_chat = resolve_source(&bot, &cfg.source_channel)
        .await
        .context("failed to resolve source channel; make sure the bot is admin in the channel")?;

    let bale = BaleClient::new(
        &cfg.bale_bot_token,
        cfg.bale_chat_id.clone(),
        cfg.http_timeout,
        cfg.upload_timeout,
    );
    bale.check_connection().await.context("bale getMe failed")?;
    info!("bale api: connected");

    let pipeline = Arc::new(Pipeline::new(
        Arc::new(TelegramFiles::new(bot.clone())),
        Arc::new(bale),
    ));

    info!(
        "source channel: {} (id: {})",
        cfg.source_channel, source_chat.0
    );
    info!("target chat: {}", cfg.bale_chat_id);
    info!("relaying channel posts; press Ctrl+C to stop");

    router::run_polling(bot, cfg, source_chat, pipeline).await;

    Ok(())
}
