//! Transport layer for pane-relay clients.
//!
//! Provides:
//! - Wire protocol (JSON request/response types and text renderings)
//! - HTTP/JSON router (axum)

pub mod error;
pub mod http;
pub mod protocol;

pub use error::ApiError;
pub use http::{ApiState, create_router};
pub use protocol::{SubmitRequest, SubmitResponse};
