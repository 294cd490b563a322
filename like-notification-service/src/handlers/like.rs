use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::models::like::MISSING_FIELDS_MESSAGE;
use crate::models::{LikeEvent, NotificationResult};
use crate::startup::AppState;

/// `POST /like-notification`
///
/// Only malformed input is answered with a non-200 status; every outcome of
/// the notification attempt itself, including failures, is a 200 carrying
/// the result.
#[tracing::instrument(skip(state, payload))]
pub async fn like_notification(
    State(state): State<AppState>,
    payload: Result<Json<LikeEvent>, JsonRejection>,
) -> (StatusCode, Json<NotificationResult>) {
    let event = match payload {
        Ok(Json(event)) => event,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected unreadable like event");
            return missing_fields();
        }
    };

    if let Err(e) = event.validate() {
        tracing::warn!(error = %e, "Rejected incomplete like event");
        return missing_fields();
    }

    tracing::info!(
        post_id = %event.post_id(),
        user_id = %event.user_id(),
        "Received like event"
    );

    let result = state.notifier.notify_post_liked(event.post_id()).await;
    if !result.is_success() {
        tracing::info!(status = %result.status, "Like event handled without a push");
    }
    (StatusCode::OK, Json(result))
}

fn missing_fields() -> (StatusCode, Json<NotificationResult>) {
    (
        StatusCode::BAD_REQUEST,
        Json(NotificationResult::error(MISSING_FIELDS_MESSAGE)),
    )
}
