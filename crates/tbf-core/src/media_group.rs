//! Media-group aggregation.
//!
//! Photos posted as one album arrive as separate updates sharing a
//! `media_group_id`. Each group moves Empty → Collecting → Flushed: the
//! first sibling arms a one-shot timer for the collection window, later
//! siblings append without re-arming it (the window is measured from group
//! creation), and when the timer fires the accumulated posts are popped
//! atomically and handed to the flush callback. A flushed id is never reused
//! for the life of the process: duplicate flushes are no-ops and siblings
//! arriving after the flush are dropped.

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    pin::Pin,
    sync::Arc,
    time::Duration,
};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::ChannelPost;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type FlushFn = Arc<dyn Fn(Vec<ChannelPost>) -> BoxFuture + Send + Sync>;

#[derive(Default)]
struct GroupState {
    pending: HashMap<String, Vec<ChannelPost>>,
    flushed: HashSet<String>,
}

pub struct MediaGroupBuffer {
    window: Duration,
    flush: FlushFn,
    state: Mutex<GroupState>,
}

impl MediaGroupBuffer {
    pub fn new(window: Duration, flush: FlushFn) -> Arc<Self> {
        Arc::new(Self {
            window,
            flush,
            state: Mutex::new(GroupState::default()),
        })
    }

    /// Add one sibling to its group, creating the group and arming the
    /// window timer if this is the first sibling seen for `group_id`.
    pub async fn add(self: &Arc<Self>, group_id: String, post: ChannelPost) {
        let mut state = self.state.lock().await;

        if state.flushed.contains(&group_id) {
            warn!("late sibling for already-flushed media group {group_id}; dropping");
            return;
        }

        if let Some(posts) = state.pending.get_mut(&group_id) {
            posts.push(post);
            return;
        }

        state.pending.insert(group_id.clone(), vec![post]);
        drop(state);

        let buffer = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(buffer.window).await;
            buffer.flush_group(&group_id).await;
        });
    }

    /// Pop the group and hand its posts to the flush callback.
    ///
    /// Pop-or-nothing: the removal and the flushed-marker update happen under
    /// one lock, so a duplicate flush for an already-removed id is a no-op.
    pub async fn flush_group(self: &Arc<Self>, group_id: &str) {
        let posts = {
            let mut state = self.state.lock().await;
            state.flushed.insert(group_id.to_string());
            state.pending.remove(group_id)
        };

        let Some(posts) = posts else {
            debug!("duplicate flush for media group {group_id} ignored");
            return;
        };

        (self.flush)(posts).await;
    }
}
