use super::metrics::record_like_result;
use super::push_sender::PushSender;
use super::store::DocumentStore;
use crate::models::NotificationResult;
use mongodb::bson::{Bson, Document};
use service_core::error::AppError;
use std::sync::Arc;

pub const LIKE_TITLE: &str = "New Like on Your Post!";
pub const DEFAULT_POSTS_COLLECTION: &str = "posts";
pub const DEFAULT_USERS_COLLECTION: &str = "users";

const OWNER_FIELD: &str = "userId";
const LIKES_FIELD: &str = "likes";
const TOKEN_FIELD: &str = "fcmToken";

pub fn like_body(likes_count: usize) -> String {
    format!("Your post now has {} likes!", likes_count)
}

/// Tells a post's owner that the post was liked.
///
/// Looks up the post, then its owner, and pushes the current like count to
/// the owner's registered device. Reads only; neither record is modified.
#[derive(Clone)]
pub struct LikeNotifier {
    store: Arc<dyn DocumentStore>,
    push_sender: PushSender,
    posts_collection: String,
    users_collection: String,
}

impl LikeNotifier {
    pub fn new(store: Arc<dyn DocumentStore>, push_sender: PushSender) -> Self {
        Self {
            store,
            push_sender,
            posts_collection: DEFAULT_POSTS_COLLECTION.to_string(),
            users_collection: DEFAULT_USERS_COLLECTION.to_string(),
        }
    }

    pub fn with_collections(
        mut self,
        posts_collection: impl Into<String>,
        users_collection: impl Into<String>,
    ) -> Self {
        self.posts_collection = posts_collection.into();
        self.users_collection = users_collection.into();
        self
    }

    /// Always yields a result; store failures and malformed records are
    /// reported as `error` results rather than propagated.
    #[tracing::instrument(skip(self))]
    pub async fn notify_post_liked(&self, post_id: &str) -> NotificationResult {
        let result = match self.try_notify(post_id).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Like notification failed");
                NotificationResult::error(failure_message(&e))
            }
        };

        record_like_result(&result.status.to_string());
        result
    }

    async fn try_notify(&self, post_id: &str) -> Result<NotificationResult, AppError> {
        let Some(post) = self.store.get(&self.posts_collection, post_id).await? else {
            tracing::warn!("Post does not exist");
            return Ok(NotificationResult::error(format!(
                "Post {} does not exist.",
                post_id
            )));
        };

        let Some(owner_id) = non_empty_str(&post, OWNER_FIELD) else {
            tracing::warn!("Post has no owner");
            return Ok(NotificationResult::error(format!(
                "Post {} does not have an owner.",
                post_id
            )));
        };

        let Some(owner) = self.store.get(&self.users_collection, owner_id).await? else {
            tracing::warn!(owner_id = %owner_id, "Owner does not exist");
            return Ok(NotificationResult::error(format!(
                "Owner {} does not exist.",
                owner_id
            )));
        };

        let Some(token) = non_empty_str(&owner, TOKEN_FIELD) else {
            tracing::warn!(owner_id = %owner_id, "Owner has no push token");
            return Ok(NotificationResult::error(format!(
                "Owner {} does not have an FCM token.",
                owner_id
            )));
        };

        let likes_count = likes_count(&post, post_id)?;
        if likes_count == 0 {
            tracing::info!("Post has no likes, nothing to send");
            return Ok(NotificationResult::info(format!(
                "Post {} has no likes.",
                post_id
            )));
        }

        tracing::debug!(owner_id = %owner_id, likes_count, "Sending like notification");

        Ok(self
            .push_sender
            .send(token, LIKE_TITLE, &like_body(likes_count))
            .await)
    }
}

fn non_empty_str<'a>(document: &'a Document, key: &str) -> Option<&'a str> {
    document.get_str(key).ok().filter(|value| !value.is_empty())
}

/// Cause of an unexpected failure without the error kind prefix.
fn failure_message(error: &AppError) -> String {
    match error {
        AppError::InternalError(inner)
        | AppError::DatabaseError(inner)
        | AppError::ConfigError(inner) => format!("{:#}", inner),
    }
}

/// An absent `likes` field counts as zero; a null one is malformed.
fn likes_count(post: &Document, post_id: &str) -> Result<usize, AppError> {
    match post.get(LIKES_FIELD) {
        None => Ok(0),
        Some(Bson::Array(likes)) => Ok(likes.len()),
        Some(Bson::Document(likes)) => Ok(likes.len()),
        Some(Bson::Null) => Err(AppError::InternalError(anyhow::anyhow!(
            "Post {} has a null likes field.",
            post_id
        ))),
        Some(other) => Err(AppError::InternalError(anyhow::anyhow!(
            "Post {} has a malformed likes field of type {:?}.",
            post_id,
            other.element_type()
        ))),
    }
}
