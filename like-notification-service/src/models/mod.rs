pub mod like;
pub mod result;

pub use like::LikeEvent;
pub use result::{NotificationResult, ResultStatus};
