//! Post-processing pipeline: turns mapped channel posts into deliveries.
//!
//! Every per-post failure is logged and absorbed here; nothing escalates to
//! the polling loop.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    domain::{best_variant, ChannelPost, InlineKeyboard, PostBody, SourceKeyboard},
    entities::extract_links,
    formatting::format_message,
    keyboard::translate_keyboard,
    ports::{FileFetcher, Outbound},
};

pub struct Pipeline {
    files: Arc<dyn FileFetcher>,
    outbound: Arc<dyn Outbound>,
}

impl Pipeline {
    pub fn new(files: Arc<dyn FileFetcher>, outbound: Arc<dyn Outbound>) -> Self {
        Self { files, outbound }
    }

    /// Process one standalone post (text or single photo).
    pub async fn process_post(&self, post: ChannelPost) {
        match &post.body {
            PostBody::Text { text, entities } => {
                let links = extract_links(text, entities);
                let body = format_message(text, &links);
                let keyboard = translated(&post.keyboard);
                info!(
                    "forwarding text post {}: {} links{}",
                    post.message_id.0,
                    links.len(),
                    keyboard_info(&keyboard)
                );
                if let Err(e) = self.outbound.send_text(&body, keyboard.as_ref()).await {
                    error!("failed to forward text post {}: {e}", post.message_id.0);
                }
            }
            PostBody::Photo {
                variants,
                caption,
                caption_entities,
            } => {
                let Some(best) = best_variant(variants) else {
                    warn!("photo post {} has no size variants", post.message_id.0);
                    return;
                };
                let bytes = match self.files.fetch(&best.file_id).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!(
                            "failed to download photo for post {}: {e}",
                            post.message_id.0
                        );
                        return;
                    }
                };

                let links = extract_links(caption, caption_entities);
                let caption = format_message(caption, &links);
                let keyboard = translated(&post.keyboard);
                info!(
                    "forwarding single photo {}: {} links{}",
                    post.message_id.0,
                    links.len(),
                    keyboard_info(&keyboard)
                );
                // One-photo album: keeps caption/keyboard behavior identical
                // to grouped posts.
                if let Err(e) = self
                    .outbound
                    .send_album(vec![bytes], &caption, keyboard.as_ref())
                    .await
                {
                    error!("failed to forward photo post {}: {e}", post.message_id.0);
                }
            }
        }
    }

    /// Process a flushed media group.
    ///
    /// The first sibling's caption, entities and keyboard represent the whole
    /// group (captions on later siblings are ignored by platform convention).
    /// Delivery proceeds only if at least one photo downloads.
    pub async fn process_group(&self, posts: Vec<ChannelPost>) {
        let Some(first) = posts.first() else {
            return;
        };
        info!("processing media group with {} items", posts.len());

        let (caption, caption_entities) = match &first.body {
            PostBody::Photo {
                caption,
                caption_entities,
                ..
            } => (caption.clone(), caption_entities.clone()),
            // A non-photo sibling has no caption to contribute.
            PostBody::Text { .. } => (String::new(), Vec::new()),
        };
        let keyboard = translated(&first.keyboard);

        let mut photos = Vec::new();
        for post in &posts {
            let PostBody::Photo { variants, .. } = &post.body else {
                continue;
            };
            let Some(best) = best_variant(variants) else {
                continue;
            };
            match self.files.fetch(&best.file_id).await {
                Ok(bytes) => photos.push(bytes),
                Err(e) => warn!(
                    "failed to download group photo (post {}): {e}",
                    post.message_id.0
                ),
            }
        }

        if photos.is_empty() {
            warn!("no photos could be downloaded from media group; dropping");
            return;
        }

        let links = extract_links(&caption, &caption_entities);
        let caption = format_message(&caption, &links);
        info!(
            "forwarding media group: {} photos, {} links{}",
            photos.len(),
            links.len(),
            keyboard_info(&keyboard)
        );
        if let Err(e) = self
            .outbound
            .send_album(photos, &caption, keyboard.as_ref())
            .await
        {
            error!("failed to forward media group: {e}");
        }
    }
}

fn translated(keyboard: &Option<SourceKeyboard>) -> Option<InlineKeyboard> {
    keyboard.as_ref().and_then(translate_keyboard)
}

fn keyboard_info(keyboard: &Option<InlineKeyboard>) -> String {
    match keyboard {
        Some(kb) => format!(", {} keyboard rows", kb.inline_keyboard.len()),
        None => String::new(),
    }
}
