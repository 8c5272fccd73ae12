//! OAuth bootstrap — credential loading, cached token, interactive code exchange.
//!
//! The loop's only dependency on this module: authorization completes, or the
//! process fails with an `AuthError`, before polling starts.

use std::path::Path;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::config::ResponderConfig;
use crate::error::AuthError;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

// ── Credentials ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    web: WebCredentials,
}

#[derive(Debug, Deserialize)]
struct WebCredentials {
    client_id: String,
    client_secret: SecretString,
    redirect_uris: Vec<String>,
}

/// OAuth client built from a downloaded client-credentials file.
#[derive(Debug)]
pub struct OauthClient {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    http: reqwest::Client,
}

impl OauthClient {
    pub fn from_credentials_file(path: &Path) -> Result<Self, AuthError> {
        let raw =
            std::fs::read_to_string(path).map_err(|e| AuthError::CredentialsUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let parsed: CredentialsFile = serde_json::from_str(&raw)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
        let redirect_uri = parsed
            .web
            .redirect_uris
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::InvalidCredentials("no redirect URIs".to_string()))?;

        Ok(Self {
            client_id: parsed.web.client_id,
            client_secret: parsed.web.client_secret,
            redirect_uri,
            http: reqwest::Client::new(),
        })
    }

    /// Authorization URL the user must visit to grant access.
    pub fn auth_url(&self) -> String {
        let mut url = reqwest::Url::parse(AUTH_ENDPOINT).expect("static auth endpoint URL");
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", GMAIL_SCOPE)
            .append_pair("access_type", "offline");
        url.into()
    }

    /// Exchange an authorization code for a token.
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let resp = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(format!("{status}: {body}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        Ok(StoredToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            obtained_at: Utc::now(),
        })
    }
}

// ── Token cache ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Token persisted to disk so later runs skip the interactive exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default = "Utc::now")]
    pub obtained_at: DateTime<Utc>,
}

/// Load the cached token. A missing file means "not yet authorized",
/// not an error.
pub fn load_token(path: &Path) -> Result<Option<StoredToken>, AuthError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AuthError::TokenStore {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
        }
    };
    let token = serde_json::from_str(&raw).map_err(|e| AuthError::TokenStore {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(token))
}

pub fn save_token(path: &Path, token: &StoredToken) -> Result<(), AuthError> {
    let raw = serde_json::to_string_pretty(token)?;
    std::fs::write(path, raw).map_err(|e| AuthError::TokenStore {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

// ── Bootstrap ───────────────────────────────────────────────────────

/// Complete the authorization bootstrap: use the cached token when present,
/// otherwise walk the interactive authorization-code exchange and persist
/// the result.
pub async fn authorize(config: &ResponderConfig) -> Result<StoredToken, AuthError> {
    let client = OauthClient::from_credentials_file(&config.credentials_path)?;

    if let Some(token) = load_token(&config.token_path)? {
        info!("Authorization successful (cached token)");
        return Ok(token);
    }

    println!(
        "Authorize this app by visiting this URL:\n{}",
        client.auth_url()
    );

    let code = prompt_for_code().await?;
    let token = client.exchange_code(code.trim()).await?;
    save_token(&config.token_path, &token)?;
    info!(path = %config.token_path.display(), "Token stored");
    info!("Authorization successful");

    Ok(token)
}

/// Read the authorization code as a single awaited line from stdin.
async fn prompt_for_code() -> Result<String, AuthError> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Enter the code from that page here: ")
        .await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line)
}

// ── Tests ───────────────────────────────────────────────────────────
