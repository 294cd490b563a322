use like_notification_service::services::{InMemoryDocumentStore, MockPushProvider, PushProvider};
use like_notification_service::startup::{AppState, Application};
use mongodb::bson::doc;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryDocumentStore>,
    pub push_provider: Arc<MockPushProvider>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_provider(true).await
    }

    /// `push_enabled = false` makes every push submission fail.
    pub async fn spawn_with_provider(push_enabled: bool) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        let push_provider = Arc::new(MockPushProvider::new(push_enabled));
        let provider: Arc<dyn PushProvider> = push_provider.clone();
        let state = AppState::new(store.clone(), provider);

        // Use random port for testing (port 0)
        let app = Application::with_state(0, state)
            .await
            .expect("Failed to build test application");

        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            store,
            push_provider,
        }
    }

    /// Post `p1` owned by `u9` with three likes; `u9` has token `tok-123`.
    pub fn seed_liked_post(&self) {
        self.store.insert(
            "posts",
            "p1",
            doc! { "userId": "u9", "likes": ["a", "b", "c"] },
        );
        self.store
            .insert("users", "u9", doc! { "fcmToken": "tok-123" });
    }

    pub async fn post_like(&self, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/like-notification", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
