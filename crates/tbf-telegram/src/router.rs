use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use tbf_core::{
    config::Config,
    domain::{ChannelPost, ChatId},
    media_group::{BoxFuture, MediaGroupBuffer},
    pipeline::Pipeline,
};

use crate::mapper;

pub struct AppState {
    pub source_chat: ChatId,
    pub pipeline: Arc<Pipeline>,
    pub groups: Arc<MediaGroupBuffer>,
    pub permits: Arc<Semaphore>,
}

/// Run the long-poll dispatch loop until the process is stopped.
///
/// The update cursor and the poll retry/backoff live inside teloxide's
/// polling listener. This layer filters updates to the source channel,
/// buffers media-group siblings, and hands everything else to the pipeline
/// under a bounded permit pool; posts processed concurrently have no
/// ordering guarantee relative to each other.
pub async fn run_polling(
    bot: Bot,
    cfg: Arc<Config>,
    source_chat: ChatId,
    pipeline: Arc<Pipeline>,
) {
    let permits = Arc::new(Semaphore::new(cfg.max_in_flight));

    let groups = {
        let pipeline = pipeline.clone();
        let permits = permits.clone();
        MediaGroupBuffer::new(
            cfg.media_group_window,
            Arc::new(move |posts: Vec<ChannelPost>| {
                let pipeline = pipeline.clone();
                let permits = permits.clone();
                let fut: BoxFuture = Box::pin(async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    pipeline.process_group(posts).await;
                });
                fut
            }),
        )
    };

    let state = Arc::new(AppState {
        source_chat,
        pipeline,
        groups,
        permits,
    });

    let handler = dptree::entry()
        .branch(Update::filter_channel_post().endpoint(handle_post))
        .branch(Update::filter_message().endpoint(handle_post));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;
}

async fn handle_post(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.chat.id.0 != state.source_chat.0 {
        debug!("ignoring message from other chat: {}", msg.chat.id.0);
        return Ok(());
    }

    let Some(post) = mapper::map_post(&msg) else {
        debug!("ignoring unsupported message kind: {}", msg.id.0);
        return Ok(());
    };
    info!("new channel post: {}", post.message_id.0);

    if let Some(group_id) = post.media_group_id.clone() {
        state.groups.add(group_id, post).await;
        return Ok(());
    }

    let permits = state.permits.clone();
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        let Ok(_permit) = permits.acquire_owned().await else {
            return;
        };
        pipeline.process_post(post).await;
    });

    Ok(())
}
