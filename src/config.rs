//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

/// Responder configuration, constructed once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Label applied to messages that have been replied to.
    pub label_name: String,
    /// Provider label id marking inbox membership (removed after replying).
    pub inbox_label: String,
    /// Lower bound of the jittered reply delay, inclusive (seconds).
    pub reply_delay_min_secs: u64,
    /// Upper bound of the jittered reply delay, inclusive (seconds).
    pub reply_delay_max_secs: u64,
    /// Fixed re-poll delay when no candidates were found, and after a
    /// failed inbox listing.
    pub idle_delay: Duration,
    /// Path to the OAuth client credentials JSON.
    pub credentials_path: PathBuf,
    /// Path to the cached token JSON.
    pub token_path: PathBuf,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            label_name: "VacationReplies".to_string(),
            inbox_label: "INBOX".to_string(),
            reply_delay_min_secs: 45,
            reply_delay_max_secs: 120,
            idle_delay: Duration::from_secs(60),
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
        }
    }
}

impl ResponderConfig {
    /// Build config from environment variables. Only the file paths are
    /// overridable; the label name and delay bounds are fixed constants.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("GMAIL_CREDENTIALS_PATH") {
            config.credentials_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("GMAIL_TOKEN_PATH") {
            config.token_path = PathBuf::from(path);
        }
        config
    }
}
