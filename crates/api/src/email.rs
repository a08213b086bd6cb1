use async_trait::async_trait;
use eyre::Result;
use lessonsync_core::email::EmailSender;
use serde_json::Value;
use std::sync::Arc;

/// Production stand-in for the external mail delivery service: the send is
/// recorded in the log. Swapping in a real delivery backend means providing
/// another [`EmailSender`] implementation to `ApiState`.
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, template: &str, recipient: &str, payload: Value) -> Result<()> {
        tracing::info!(
            "Email queued: template={}, recipient={}, payload={}",
            template,
            recipient,
            payload
        );
        Ok(())
    }
}

/// Fire-and-forget send: delivery failures are logged and never surface to
/// the caller.
pub async fn send_quietly(
    mailer: &Arc<dyn EmailSender>,
    template: &str,
    recipient: &str,
    payload: Value,
) {
    if let Err(error) = mailer.send(template, recipient, payload).await {
        tracing::warn!(
            "Failed to send '{}' email to {}: {}",
            template,
            recipient,
            error
        );
    }
}
