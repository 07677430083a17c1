//! Status-change notification capability.
//!
//! Notifications are best-effort: every send result is consumed by the caller
//! with a log entry and never affects the request mutation that triggered it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payload sent to the requestor's contact address on every lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusNotification {
    pub transaction_id: String,
    pub document_name: String,
    pub status: String,
    pub remark: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_status_update(
        &self,
        recipient: &str,
        notification: &StatusNotification,
    ) -> Result<(), String>;
}

/// Fallback notifier used when no mail relay is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_status_update(
        &self,
        recipient: &str,
        notification: &StatusNotification,
    ) -> Result<(), String> {
        log::info!(
            "status notification for {} ({}): {} - {}",
            recipient,
            notification.transaction_id,
            notification.status,
            notification.remark
        );
        Ok(())
    }
}

/// Posts the notification payload to an HTTP mail relay endpoint.
pub struct MailRelayNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl MailRelayNotifier {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    pub fn from_env(client: reqwest::Client) -> Option<Self> {
        std::env::var("MAIL_RELAY_URL")
            .ok()
            .map(|endpoint| Self::new(client, endpoint))
    }
}

#[derive(Serialize)]
struct MailRelayRequest<'a> {
    to: &'a str,
    template: &'a str,
    #[serde(flatten)]
    payload: &'a StatusNotification,
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn send_status_update(
        &self,
        recipient: &str,
        notification: &StatusNotification,
    ) -> Result<(), String> {
        let body = MailRelayRequest {
            to: recipient,
            template: "request_document_status",
            payload: notification,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("mail relay unreachable: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("mail relay returned {}", response.status()));
        }
        Ok(())
    }
}
