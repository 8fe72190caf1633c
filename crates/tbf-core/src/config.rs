use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration for the relay.
///
/// Four identifiers are required; everything else has defaults tuned to the
/// platforms' rate and timeout expectations.
#[derive(Clone, Debug)]
pub struct Config {
    /// Inbound bot credential (Telegram).
    pub telegram_bot_token: String,
    /// Outbound bot credential (Bale).
    pub bale_bot_token: String,
    /// Outbound destination chat (numeric id or `@channel`).
    pub bale_chat_id: String,
    /// Inbound source channel (numeric id or `@channel`).
    pub source_channel: String,

    /// Collection window for media groups, measured from the first sibling.
    pub media_group_window: Duration,
    /// Cap on concurrently processed posts.
    pub max_in_flight: usize,
    /// Per-call timeout for JSON API requests.
    pub http_timeout: Duration,
    /// Per-call timeout for photo uploads.
    pub upload_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = require_env("TELEGRAM_BOT_TOKEN")?;
        let bale_bot_token = require_env("BALE_BOT_TOKEN")?;
        let bale_chat_id = require_env("BALE_CHAT_ID")?;
        let source_channel = require_env("SOURCE_CHANNEL")?;

        let media_group_window =
            Duration::from_secs(env_u64("MEDIA_GROUP_TIMEOUT").unwrap_or(5));
        let max_in_flight = env_usize("MAX_IN_FLIGHT").unwrap_or(8).max(1);
        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT").unwrap_or(30));
        let upload_timeout = Duration::from_secs(env_u64("UPLOAD_TIMEOUT").unwrap_or(60));

        Ok(Self {
            telegram_bot_token,
            bale_bot_token,
            bale_chat_id,
            source_channel,
            media_group_window,
            max_in_flight,
            http_timeout,
            upload_timeout,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    match env_str(key).and_then(non_empty) {
        Some(v) => Ok(v),
        None => Err(Error::Config(format!(
            "{key} environment variable is required"
        ))),
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_loads_without_overriding_existing_env() {
        let path = std::path::PathBuf::from(format!("/tmp/tbf-dotenv-{}", std::process::id()));
        std::fs::write(
            &path,
            "# comment\nTBF_TEST_FRESH=from_file\nTBF_TEST_TAKEN=from_file\nTBF_TEST_QUOTED='q'\n",
        )
        .unwrap();

        env::set_var("TBF_TEST_TAKEN", "from_env");
        load_dotenv_if_present(&path);

        assert_eq!(env::var("TBF_TEST_FRESH").unwrap(), "from_file");
        assert_eq!(env::var("TBF_TEST_TAKEN").unwrap(), "from_env");
        assert_eq!(env::var("TBF_TEST_QUOTED").unwrap(), "q");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_dotenv_file_is_ignored() {
        load_dotenv_if_present(Path::new("/tmp/tbf-no-such-file"));
    }

    #[test]
    fn required_env_rejects_blank_values() {
        env::set_var("TBF_TEST_BLANK", "   ");
        assert!(require_env("TBF_TEST_BLANK").is_err());
        assert!(require_env("TBF_TEST_ABSENT").is_err());
    }
}
