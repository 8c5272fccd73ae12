//! Error types for the vacation responder.

/// Startup authentication errors. These are fatal: the process exits
/// non-zero instead of starting the loop without a usable token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Cannot read credentials file {path}: {reason}")]
    CredentialsUnreadable { path: String, reason: String },

    #[error("Invalid credentials file: {0}")]
    InvalidCredentials(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Token store error at {path}: {reason}")]
    TokenStore { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-call mail gateway errors. Caught at the call site, logged with the
/// message they pertain to, and treated as "skip this item/cycle" — never
/// propagated to crash the process.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("Gmail API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Message {id} no longer exists")]
    NotFound { id: String },

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Http(e.to_string())
    }
}
