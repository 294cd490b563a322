//! HTTP handlers for like-notification-service.

pub mod health;
pub mod like;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use like::like_notification;
