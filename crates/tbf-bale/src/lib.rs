//! Bale adapter.
//!
//! Bale exposes a Telegram-Bot-API-compatible HTTP surface at
//! `tapi.bale.ai`; this crate implements the `tbf-core` Outbound port over
//! it with an explicit request/response type per endpoint. Photo uploads are
//! built as in-memory multipart forms.
//!
//! A send whose error description mentions `parse` or `markdown` is retried
//! exactly once with formatting disabled; the text then keeps its literal
//! `[text](url)` sequences, which is an accepted degradation.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use tbf_core::{
    domain::InlineKeyboard,
    errors::Error,
    ports::Outbound,
    Result,
};

const MARKDOWN: &str = "Markdown";

#[derive(Clone)]
pub struct BaleClient {
    http: reqwest::Client,
    base_url: String,
    chat_id: String,
    upload_timeout: Duration,
}

/// Common `ok`/`description` envelope on every Bale response. The `result`
/// payload is never needed here and is left unparsed.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboard>,
}

/// One slot of a `sendMediaGroup` payload, referencing its multipart part
/// via `attach://`.
#[derive(Debug, Serialize)]
struct InputMediaPhoto<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// Does this error description indicate the markup was rejected?
fn is_markup_rejection(description: &str) -> bool {
    let d = description.to_lowercase();
    d.contains("parse") || d.contains("markdown")
}

/// An album degrades to repeated single-photo sends when it has one photo
/// (nothing to group) or carries a keyboard (`sendMediaGroup` cannot attach
/// one).
fn sends_as_singles(photo_count: usize, has_keyboard: bool) -> bool {
    photo_count == 1 || has_keyboard
}

/// Build the `media` slots for a multi-photo send. Caption and parse mode
/// ride on the first slot only (platform convention).
fn media_slots(count: usize, caption: &str, markdown: bool) -> Vec<InputMediaPhoto<'_>> {
    (0..count)
        .map(|i| InputMediaPhoto {
            kind: "photo",
            media: format!("attach://photo_{}", i + 1),
            caption: (i == 0 && !caption.is_empty()).then_some(caption),
            parse_mode: (i == 0 && !caption.is_empty() && markdown).then_some(MARKDOWN),
        })
        .collect()
}

impl BaleClient {
    pub fn new(
        token: &str,
        chat_id: impl Into<String>,
        http_timeout: Duration,
        upload_timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .expect("reqwest client build");
        Self {
            http,
            base_url: format!("https://tapi.bale.ai/bot{token}"),
            chat_id: chat_id.into(),
            upload_timeout,
        }
    }

    /// Connectivity probe (`getMe`). Fatal at startup if it fails.
    pub async fn check_connection(&self) -> Result<()> {
        let resp = self
            .http
            .get(format!("{}/getMe", self.base_url))
            .send()
            .await
            .map_err(|e| Error::Http(format!("bale getMe request error: {e}")))?;
        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| Error::Http(format!("bale getMe response error: {e}")))?;
        if !body.ok {
            return Err(Error::Api(
                body.description
                    .unwrap_or_else(|| "getMe returned ok=false".to_string()),
            ));
        }
        Ok(())
    }

    /// Run one send attempt, retrying exactly once with formatting disabled
    /// when the destination rejects the markup. Any other rejection, and a
    /// rejection of the retry itself, is terminal.
    async fn deliver<F, Fut>(&self, method: &str, has_formatting: bool, send: F) -> Result<()>
    where
        F: Fn(bool) -> Fut,
        Fut: Future<Output = Result<ApiResponse>>,
    {
        let resp = send(has_formatting).await?;
        if resp.ok {
            return Ok(());
        }
        let description = resp
            .description
            .unwrap_or_else(|| "unknown error".to_string());
        error!("bale {method} error: {description}");

        if has_formatting && is_markup_rejection(&description) {
            info!("retrying {method} without markdown parsing");
            let retry = send(false).await?;
            if retry.ok {
                return Ok(());
            }
            return Err(Error::Api(retry.description.unwrap_or(description)));
        }

        Err(Error::Api(description))
    }

    async fn send_message_once(
        &self,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        markdown: bool,
    ) -> Result<ApiResponse> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: markdown.then_some(MARKDOWN),
            reply_markup: keyboard,
        };
        let resp = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("bale sendMessage request error: {e}")))?;
        resp.json()
            .await
            .map_err(|e| Error::Http(format!("bale sendMessage response error: {e}")))
    }

    async fn send_photo_once(
        &self,
        photo: &[u8],
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
        markdown: bool,
    ) -> Result<ApiResponse> {
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .part(
                "photo",
                reqwest::multipart::Part::bytes(photo.to_vec())
                    .file_name("photo.jpg")
                    .mime_str("image/jpeg")
                    .map_err(|e| Error::Http(format!("bale multipart error: {e}")))?,
            );

        if !caption.is_empty() {
            form = form.text("caption", caption.to_string());
            if markdown {
                form = form.text("parse_mode", MARKDOWN);
            }
        }
        if let Some(kb) = keyboard {
            form = form.text("reply_markup", serde_json::to_string(kb)?);
        }

        let resp = self
            .http
            .post(format!("{}/sendPhoto", self.base_url))
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| Error::Http(format!("bale sendPhoto request error: {e}")))?;
        resp.json()
            .await
            .map_err(|e| Error::Http(format!("bale sendPhoto response error: {e}")))
    }

    async fn send_media_group_once(
        &self,
        photos: &[Vec<u8>],
        caption: &str,
        markdown: bool,
    ) -> Result<ApiResponse> {
        let slots = media_slots(photos.len(), caption, markdown);
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("media", serde_json::to_string(&slots)?);

        for (i, photo) in photos.iter().enumerate() {
            let name = format!("photo_{}", i + 1);
            form = form.part(
                name.clone(),
                reqwest::multipart::Part::bytes(photo.clone())
                    .file_name(format!("{name}.jpg"))
                    .mime_str("image/jpeg")
                    .map_err(|e| Error::Http(format!("bale multipart error: {e}")))?,
            );
        }

        let resp = self
            .http
            .post(format!("{}/sendMediaGroup", self.base_url))
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| Error::Http(format!("bale sendMediaGroup request error: {e}")))?;
        resp.json()
            .await
            .map_err(|e| Error::Http(format!("bale sendMediaGroup response error: {e}")))
    }
}

#[async_trait]
impl Outbound for BaleClient {
    async fn send_text(&self, text: &str, keyboard: Option<&InlineKeyboard>) -> Result<()> {
        self.deliver("sendMessage", true, |markdown| {
            self.send_message_once(text, keyboard, markdown)
        })
        .await
    }

    async fn send_album(
        &self,
        photos: Vec<Vec<u8>>,
        caption: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        if photos.is_empty() {
            return Err(Error::Api("empty photo album".to_string()));
        }

        if sends_as_singles(photos.len(), keyboard.is_some()) {
            for (i, photo) in photos.iter().enumerate() {
                let (caption, keyboard) = if i == 0 { (caption, keyboard) } else { ("", None) };
                self.deliver("sendPhoto", !caption.is_empty(), |markdown| {
                    self.send_photo_once(photo, caption, keyboard, markdown)
                })
                .await?;
            }
            return Ok(());
        }

        self.deliver("sendMediaGroup", !caption.is_empty(), |markdown| {
            self.send_media_group_once(&photos, caption, markdown)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn client() -> BaleClient {
        BaleClient::new(
            "token",
            "@target",
            Duration::from_secs(30),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn markup_rejections_are_recognized_case_insensitively() {
        assert!(is_markup_rejection("Bad Request: can't parse entities"));
        assert!(is_markup_rejection("MARKDOWN formatting invalid"));
        assert!(!is_markup_rejection("chat not found"));
        assert!(!is_markup_rejection("FLOOD_WAIT_3"));
    }

    #[test]
    fn albums_with_a_keyboard_or_one_photo_send_as_singles() {
        assert!(sends_as_singles(1, false));
        assert!(sends_as_singles(3, true));
        assert!(!sends_as_singles(3, false));
    }

    #[test]
    fn caption_rides_on_the_first_slot_only() {
        let slots = media_slots(3, "hello", true);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].caption, Some("hello"));
        assert_eq!(slots[0].parse_mode, Some(MARKDOWN));
        assert_eq!(slots[0].media, "attach://photo_1");
        for slot in &slots[1..] {
            assert_eq!(slot.caption, None);
            assert_eq!(slot.parse_mode, None);
        }
    }

    #[test]
    fn plain_retry_strips_the_parse_mode_from_every_slot() {
        let slots = media_slots(2, "hello", false);
        assert_eq!(slots[0].caption, Some("hello"));
        assert!(slots.iter().all(|s| s.parse_mode.is_none()));
    }

    #[test]
    fn empty_caption_leaves_all_slots_bare() {
        let slots = media_slots(2, "", true);
        assert!(slots.iter().all(|s| s.caption.is_none()));
        assert!(slots.iter().all(|s| s.parse_mode.is_none()));
    }

    #[tokio::test]
    async fn parse_rejection_retries_exactly_once_without_markdown() {
        let client = client();
        let calls: Mutex<Vec<bool>> = Mutex::new(Vec::new());

        let result = client
            .deliver("sendMessage", true, |markdown| {
                calls.lock().unwrap().push(markdown);
                async move {
                    if markdown {
                        Ok(ApiResponse {
                            ok: false,
                            description: Some("Bad Request: can't parse entities".to_string()),
                        })
                    } else {
                        Ok(ApiResponse {
                            ok: true,
                            description: None,
                        })
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(*calls.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn non_markup_rejection_does_not_retry() {
        let client = client();
        let calls: Mutex<Vec<bool>> = Mutex::new(Vec::new());

        let result = client
            .deliver("sendMessage", true, |markdown| {
                calls.lock().unwrap().push(markdown);
                async move {
                    Ok(ApiResponse {
                        ok: false,
                        description: Some("chat not found".to_string()),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn rejected_retry_is_terminal() {
        let client = client();
        let calls: Mutex<Vec<bool>> = Mutex::new(Vec::new());

        let result = client
            .deliver("sendPhoto", true, |markdown| {
                calls.lock().unwrap().push(markdown);
                async move {
                    Ok(ApiResponse {
                        ok: false,
                        description: Some("can't parse entities".to_string()),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn unformatted_send_never_retries() {
        let client = client();
        let calls: Mutex<Vec<bool>> = Mutex::new(Vec::new());

        let result = client
            .deliver("sendPhoto", false, |markdown| {
                calls.lock().unwrap().push(markdown);
                async move {
                    Ok(ApiResponse {
                        ok: false,
                        description: Some("can't parse entities".to_string()),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), vec![false]);
    }

    #[test]
    fn send_message_request_serializes_expected_fields() {
        let kb = InlineKeyboard {
            inline_keyboard: vec![vec![tbf_core::domain::UrlButton {
                text: "Open".to_string(),
                url: "https://example.com".to_string(),
            }]],
        };
        let request = SendMessageRequest {
            chat_id: "@target",
            text: "hi",
            parse_mode: Some(MARKDOWN),
            reply_markup: Some(&kb),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_id"], "@target");
        assert_eq!(json["parse_mode"], "Markdown");
        assert_eq!(
            json["reply_markup"]["inline_keyboard"][0][0]["url"],
            "https://example.com"
        );

        let plain = SendMessageRequest {
            chat_id: "@target",
            text: "hi",
            parse_mode: None,
            reply_markup: None,
        };
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("parse_mode").is_none());
        assert!(json.get("reply_markup").is_none());
    }
}
