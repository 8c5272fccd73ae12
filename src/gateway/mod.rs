//! Mail gateway abstraction — the capability surface the responder consumes.

pub mod gmail;

pub use gmail::GmailGateway;

use async_trait::async_trait;

use crate::error::GatewayError;

/// Provider-assigned label identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelId(pub String);

impl std::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing entry: an opaque message id plus the label ids currently on it.
/// `label_ids` is empty when the provider omits the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: String,
    pub label_ids: Vec<String>,
}

/// Full message view. `sender` is `None` when no `From` header could be
/// found — the caller skips the message rather than guessing an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDetails {
    pub id: String,
    pub subject: String,
    pub sender: Option<String>,
    pub label_ids: Vec<String>,
}

/// Capabilities the responder requires from the mail provider.
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// List the message ids currently in the inbox.
    async fn list_inbox(&self) -> Result<Vec<MessageRef>, GatewayError>;

    /// Fetch a message's subject, sender and labels.
    async fn get_message(&self, id: &str) -> Result<MessageDetails, GatewayError>;

    /// Send a plain-text reply.
    async fn send_reply(&self, to: &str, subject: &str, body: &str) -> Result<(), GatewayError>;

    /// Return the id of the label with the given name, creating it if it
    /// does not exist yet. Idempotent: calling twice yields the same id.
    async fn ensure_label(&self, name: &str) -> Result<LabelId, GatewayError>;

    /// Apply and remove labels on a message in a single call.
    async fn modify_labels(
        &self,
        id: &str,
        add: &[LabelId],
        remove: &[LabelId],
    ) -> Result<(), GatewayError>;
}
