//! Gmail REST gateway — a thin reqwest client over `gmail/v1/users/me`.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::gateway::{LabelId, MailGateway, MessageDetails, MessageRef};

const API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail gateway authenticated with a bearer access token.
pub struct GmailGateway {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

// ── Wire structs ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListMessagesResponse {
    messages: Option<Vec<WireMessageRef>>,
}

#[derive(Debug, Deserialize)]
struct WireMessageRef {
    id: String,
    #[serde(rename = "labelIds", default)]
    label_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    #[serde(rename = "labelIds", default)]
    label_ids: Vec<String>,
    payload: Option<WirePayload>,
}

#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(default)]
    headers: Vec<WireHeader>,
}

#[derive(Debug, Deserialize)]
struct WireHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ListLabelsResponse {
    #[serde(default)]
    labels: Vec<WireLabel>,
}

#[derive(Debug, Deserialize)]
struct WireLabel {
    id: String,
    name: String,
}

// ── Gateway ─────────────────────────────────────────────────────────

impl GmailGateway {
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
            base_url: API_BASE.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Check the response status, turning non-2xx into `GatewayError::Api`.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(GatewayError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn list_labels(&self) -> Result<Vec<WireLabel>, GatewayError> {
        let resp = self
            .client
            .get(self.url("labels"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let parsed: ListLabelsResponse = Self::check(resp).await?.json().await?;
        Ok(parsed.labels)
    }

    /// Create a label, returning `None` when Gmail reports it already
    /// exists (409) — the caller re-lists to pick up the winner's id.
    async fn create_label(&self, name: &str) -> Result<Option<LabelId>, GatewayError> {
        let body = serde_json::json!({
            "name": name,
            "labelListVisibility": "labelShow",
            "messageListVisibility": "show",
        });
        let resp = self
            .client
            .post(self.url("labels"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if resp.status().as_u16() == 409 {
            debug!(label = name, "Label already exists");
            return Ok(None);
        }

        let created: WireLabel = Self::check(resp).await?.json().await?;
        info!(label = name, id = %created.id, "Label created");
        Ok(Some(LabelId(created.id)))
    }
}

#[async_trait]
impl MailGateway for GmailGateway {
    async fn list_inbox(&self) -> Result<Vec<MessageRef>, GatewayError> {
        let resp = self
            .client
            .get(self.url("messages"))
            .query(&[("labelIds", "INBOX")])
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let parsed: ListMessagesResponse = Self::check(resp).await?.json().await?;

        Ok(parsed
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| MessageRef {
                id: m.id,
                label_ids: m.label_ids,
            })
            .collect())
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetails, GatewayError> {
        let resp = self
            .client
            .get(self.url(&format!("messages/{id}")))
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Subject"),
            ])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if resp.status().as_u16() == 404 {
            return Err(GatewayError::NotFound { id: id.to_string() });
        }

        let message: WireMessage = Self::check(resp).await?.json().await?;
        Ok(into_details(message))
    }

    async fn send_reply(&self, to: &str, subject: &str, body: &str) -> Result<(), GatewayError> {
        let payload = serde_json::json!({ "raw": encode_raw(to, subject, body) });
        let resp = self
            .client
            .post(self.url("messages/send"))
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn ensure_label(&self, name: &str) -> Result<LabelId, GatewayError> {
        if let Some(id) = find_label_id(&self.list_labels().await?, name) {
            return Ok(id);
        }
        if let Some(id) = self.create_label(name).await? {
            return Ok(id);
        }
        // Lost the create race; the label must be listed now.
        find_label_id(&self.list_labels().await?, name).ok_or_else(|| {
            GatewayError::InvalidResponse(format!("label {name} missing after create conflict"))
        })
    }

    async fn modify_labels(
        &self,
        id: &str,
        add: &[LabelId],
        remove: &[LabelId],
    ) -> Result<(), GatewayError> {
        let body = serde_json::json!({
            "addLabelIds": add.iter().map(|l| l.0.as_str()).collect::<Vec<_>>(),
            "removeLabelIds": remove.iter().map(|l| l.0.as_str()).collect::<Vec<_>>(),
        });
        let resp = self
            .client
            .post(self.url(&format!("messages/{id}/modify")))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn into_details(message: WireMessage) -> MessageDetails {
    let headers = message
        .payload
        .map(|p| p.headers)
        .unwrap_or_default();
    MessageDetails {
        id: message.id,
        subject: header_value(&headers, "Subject").unwrap_or_default(),
        sender: header_value(&headers, "From"),
        label_ids: message.label_ids,
    }
}

/// Case-insensitive header lookup; returns the first match's value.
fn header_value(headers: &[WireHeader], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
}

fn find_label_id(labels: &[WireLabel], name: &str) -> Option<LabelId> {
    labels
        .iter()
        .find(|l| l.name == name)
        .map(|l| LabelId(l.id.clone()))
}

/// Encode a minimal RFC 822 message into the base64url `raw` field.
fn encode_raw(to: &str, subject: &str, body: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!("To: {to}\r\nSubject: {subject}\r\n\r\n{body}"))
}

// ── Tests ───────────────────────────────────────────────────────────
