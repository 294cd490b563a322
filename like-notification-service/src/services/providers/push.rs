use super::{
    ProviderError, ProviderResponse, PushMessage, PushProvider, ServiceAccountKey,
    ServiceAccountTokenSource,
};
use crate::config::FcmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const DEFAULT_SOUND: &str = "default";

pub struct FcmProvider {
    api_url: String,
    project_id: String,
    token_source: ServiceAccountTokenSource,
    client: Client,
}

#[derive(Debug, Serialize)]
struct FcmRequest {
    message: FcmMessage,
}

#[derive(Debug, Serialize)]
struct FcmMessage {
    token: String,
    notification: FcmNotification,
    android: FcmAndroidConfig,
    apns: FcmApnsConfig,
}

#[derive(Debug, Serialize)]
struct FcmNotification {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct FcmAndroidConfig {
    notification: FcmAndroidNotification,
}

#[derive(Debug, Serialize)]
struct FcmAndroidNotification {
    sound: String,
}

#[derive(Debug, Serialize)]
struct FcmApnsConfig {
    payload: FcmApnsPayload,
}

#[derive(Debug, Serialize)]
struct FcmApnsPayload {
    aps: FcmAps,
}

#[derive(Debug, Serialize)]
struct FcmAps {
    sound: String,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FcmErrorEnvelope {
    error: FcmError,
}

#[derive(Debug, Deserialize)]
struct FcmError {
    message: String,
    status: String,
}

impl FcmRequest {
    fn from_push(push: &PushMessage) -> Self {
        Self {
            message: FcmMessage {
                token: push.token.clone(),
                notification: FcmNotification {
                    title: push.title.clone(),
                    body: push.body.clone(),
                },
                android: FcmAndroidConfig {
                    notification: FcmAndroidNotification {
                        sound: DEFAULT_SOUND.to_string(),
                    },
                },
                apns: FcmApnsConfig {
                    payload: FcmApnsPayload {
                        aps: FcmAps {
                            sound: DEFAULT_SOUND.to_string(),
                        },
                    },
                },
            },
        }
    }
}

impl FcmProvider {
    /// Reads the service account key named in `config` and builds the provider.
    pub fn from_config(config: &FcmConfig) -> Result<Self, ProviderError> {
        let key = ServiceAccountKey::from_file(&config.service_account_key_path)?;
        Self::new(config, key)
    }

    pub fn new(config: &FcmConfig, key: ServiceAccountKey) -> Result<Self, ProviderError> {
        let client = Client::new();
        let project_id = if config.project_id.is_empty() {
            key.project_id.clone()
        } else {
            config.project_id.clone()
        };

        if project_id.is_empty() {
            return Err(ProviderError::Configuration(
                "FCM project_id is not configured".to_string(),
            ));
        }

        let token_source = ServiceAccountTokenSource::new(key, client.clone())?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            project_id,
            token_source,
            client,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[async_trait]
impl PushProvider for FcmProvider {
    async fn send(&self, push: &PushMessage) -> Result<ProviderResponse, ProviderError> {
        let access_token = self.token_source.access_token().await?;
        let request = FcmRequest::from_push(push);
        let url = format!("{}/{}/messages:send", self.api_url, self.project_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(format!("Failed to connect to FCM: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<FcmErrorEnvelope>(&body) {
                Ok(envelope) => format!(
                    "FCM error ({}): {}",
                    envelope.error.status, envelope.error.message
                ),
                Err(_) => format!("FCM API returned error status {}: {}", status, body),
            };
            return Err(ProviderError::SendFailed(detail));
        }

        let fcm_response: FcmResponse = response.json().await.map_err(|e| {
            ProviderError::SendFailed(format!("Failed to parse FCM response: {}", e))
        })?;

        tracing::info!(
            message_name = ?fcm_response.name,
            "Push notification accepted by FCM"
        );

        Ok(ProviderResponse::success(fcm_response.name))
    }

    fn name(&self) -> &'static str {
        "fcm"
    }
}

/// Push provider that never leaves the process. Used when FCM is disabled
/// and by tests, which can inspect what would have been delivered.
pub struct MockPushProvider {
    enabled: bool,
    send_count: AtomicU64,
    sent: Mutex<Vec<PushMessage>>,
}

impl MockPushProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn sent_messages(&self) -> Vec<PushMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn send(&self, push: &PushMessage) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock push provider is not enabled".to_string(),
            ));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(push.clone());
        }

        tracing::info!(
            title = %push.title,
            body = %push.body,
            "[MOCK] Push notification would be sent"
        );

        Ok(ProviderResponse::success(Some(format!("mock-push-{}", count))))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push() -> PushMessage {
        PushMessage {
            token: "tok-123".to_string(),
            title: "New Like on Your Post!".to_string(),
            body: "Your post now has 3 likes!".to_string(),
        }
    }

    #[test]
    fn fcm_request_carries_default_sounds() {
        let value = serde_json::to_value(FcmRequest::from_push(&push())).unwrap();
        assert_eq!(value["message"]["token"], "tok-123");
        assert_eq!(value["message"]["notification"]["title"], "New Like on Your Post!");
        assert_eq!(value["message"]["android"]["notification"]["sound"], "default");
        assert_eq!(value["message"]["apns"]["payload"]["aps"]["sound"], "default");
    }

    #[tokio::test]
    async fn mock_records_each_send() {
        let provider = MockPushProvider::new(true);
        let first = provider.send(&push()).await.unwrap();
        provider.send(&push()).await.unwrap();

        assert_eq!(first.provider_id.as_deref(), Some("mock-push-1"));
        assert_eq!(provider.send_count(), 2);
        assert_eq!(provider.sent_messages()[0], push());
    }

    #[tokio::test]
    async fn disabled_mock_refuses_to_send() {
        let provider = MockPushProvider::new(false);
        let err = provider.send(&push()).await.unwrap_err();

        assert!(matches!(err, ProviderError::NotEnabled(_)));
        assert_eq!(provider.send_count(), 0);
    }
}
