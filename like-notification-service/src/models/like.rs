use serde::Deserialize;
use validator::Validate;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing 'postId' or 'userId' in request.";

/// Inbound like event. `user_id` (the liker) must be present but is not used
/// when building the notification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LikeEvent {
    #[validate(required, length(min = 1))]
    pub post_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
}

impl LikeEvent {
    pub fn post_id(&self) -> &str {
        self.post_id.as_deref().unwrap_or_default()
    }

    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or_default()
    }
}
