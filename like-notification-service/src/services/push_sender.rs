use super::metrics::record_provider_call;
use super::providers::{PushMessage, PushProvider};
use crate::models::NotificationResult;
use std::sync::Arc;

pub const SENT_MESSAGE: &str = "Notification sent successfully.";

/// Submits one notification per call to the configured provider. Never
/// retries; every provider failure comes back as an error result.
#[derive(Clone)]
pub struct PushSender {
    provider: Arc<dyn PushProvider>,
}

impl PushSender {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    #[tracing::instrument(skip(self, token, title, body), fields(provider = self.provider.name()))]
    pub async fn send(&self, token: &str, title: &str, body: &str) -> NotificationResult {
        let message = PushMessage {
            token: token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        };

        match self.provider.send(&message).await {
            Ok(response) => {
                record_provider_call(self.provider.name(), "success");
                tracing::info!(provider_id = ?response.provider_id, "Push notification sent");
                NotificationResult::success(SENT_MESSAGE)
            }
            Err(e) => {
                record_provider_call(self.provider.name(), "failure");
                tracing::error!(error = %e, "Failed to send push notification");
                NotificationResult::error(e.to_string())
            }
        }
    }
}
