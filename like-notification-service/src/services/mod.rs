pub mod metrics;
pub mod notifier;
pub mod providers;
pub mod push_sender;
pub mod store;

pub use metrics::{get_metrics, init_metrics, record_like_result, record_provider_call};
pub use notifier::LikeNotifier;
pub use providers::{
    FcmProvider, MockPushProvider, ProviderError, ProviderResponse, PushMessage, PushProvider,
    ServiceAccountKey, ServiceAccountTokenSource,
};
pub use push_sender::PushSender;
pub use store::{DocumentStore, InMemoryDocumentStore, MongoDocumentStore};
