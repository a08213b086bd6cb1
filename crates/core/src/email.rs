use async_trait::async_trait;
use eyre::Result;
use serde_json::Value;

/// Outbound email collaborator.
///
/// The delivery mechanism is external to this system; callers hand over a
/// template name, a recipient, and structured data. Sends are fire-and-forget
/// at every call site: failures are logged and never fail the surrounding
/// operation.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, template: &str, recipient: &str, payload: Value) -> Result<()>;
}
