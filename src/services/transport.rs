use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::models::Notification;

/// Errors that can occur when delivering to the messaging transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("recipient {0} is unreachable")]
    Unreachable(String),

    #[error("transport returned error: {0}")]
    ApiError(String),
}

impl TransportError {
    /// Whether the failure means the recipient can no longer be reached at
    /// all (blocked the bot, deleted their account). These failures tear the
    /// pairing down; transient errors do not.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, TransportError::Unreachable(_))
    }
}

/// Outbound delivery client.
///
/// Posts notifications to the messaging platform's webhook. When no webhook
/// is configured the client runs in log-only mode, which is how the service
/// is exercised in development and tests.
pub struct TransportClient {
    webhook_url: Option<String>,
    api_key: Option<String>,
    client: Client,
}

impl TransportClient {
    pub fn new(
        webhook_url: Option<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            webhook_url,
            api_key,
            client,
        })
    }

    /// Deliver one notification to its recipient.
    pub async fn deliver(&self, notification: &Notification) -> Result<(), TransportError> {
        let Some(url) = &self.webhook_url else {
            tracing::info!(
                "Transport (log-only) -> {}: {}",
                notification.recipient_id,
                notification.text
            );
            return Ok(());
        };

        let mut request = self.client.post(url).json(notification);
        if let Some(key) = &self.api_key {
            request = request.header("X-Transport-Key", key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            tracing::debug!("Delivered notification to {}", notification.recipient_id);
            return Ok(());
        }

        // 403/404/410 from the platform mean the recipient blocked the bot
        // or the chat no longer exists.
        if matches!(status.as_u16(), 403 | 404 | 410) {
            return Err(TransportError::Unreachable(
                notification.recipient_id.clone(),
            ));
        }

        Err(TransportError::ApiError(format!(
            "delivery to {} failed with status {}",
            notification.recipient_id, status
        )))
    }

    /// Deliver a batch in order, stopping at the first unreachable recipient.
    pub async fn deliver_all(
        &self,
        notifications: &[Notification],
    ) -> Result<(), TransportError> {
        for notification in notifications {
            self.deliver(notification).await?;
        }
        Ok(())
    }
}
