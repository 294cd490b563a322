use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use like_notification_service::build_router;
use like_notification_service::services::{InMemoryDocumentStore, MockPushProvider};
use like_notification_service::AppState;
use mongodb::bson::doc;
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_state() -> (AppState, Arc<InMemoryDocumentStore>, Arc<MockPushProvider>) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let provider = Arc::new(MockPushProvider::new(true));
    let state = AppState::new(store.clone(), provider.clone());
    (state, store, provider)
}

fn like_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/like-notification")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (state, _, provider) = test_state();

    let response = build_router(state)
        .oneshot(like_request("{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(provider.send_count(), 0);
}

#[tokio::test]
async fn missing_content_type_is_a_bad_request() {
    let (state, _, _) = test_state();

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/like-notification")
                .body(Body::from(r#"{"postId":"p1","userId":"u1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_string_post_id_is_a_bad_request() {
    let (state, _, _) = test_state();

    let response = build_router(state)
        .oneshot(like_request(r#"{"postId":7,"userId":"u1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn owner_without_token_is_reported() {
    let (state, store, provider) = test_state();
    store.insert("posts", "p1", doc! { "userId": "u9", "likes": ["a"] });
    store.insert("users", "u9", doc! { "fcmToken": "" });

    let response = build_router(state)
        .oneshot(like_request(r#"{"postId":"p1","userId":"u1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        serde_json::json!({
            "status": "error",
            "message": "Owner u9 does not have an FCM token."
        })
    );
    assert_eq!(provider.send_count(), 0);
}

#[tokio::test]
async fn get_is_not_routed() {
    let (state, _, _) = test_state();

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .uri("/like-notification")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn metrics_endpoint_serves_text() {
    let (state, _, _) = test_state();

    let response = build_router(state)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn generated_request_id_is_attached() {
    let (state, _, _) = test_state();

    let response = build_router(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(!request_id.is_empty());
}
