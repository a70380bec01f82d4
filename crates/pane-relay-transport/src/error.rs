//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pane_relay_core::{PaneError, TrackerError};
use pane_relay_executor::InjectError;
use pane_relay_session::ManagerError;

use crate::protocol::ErrorBody;

/// Error returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    /// tmux failed or rejected the request.
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::NotFound(_) => Self::NotFound(err.to_string()),
            TrackerError::Pane(_) => Self::Upstream(err.to_string()),
            TrackerError::DuplicateId(_) | TrackerError::Internal(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<PaneError> for ApiError {
    fn from(err: PaneError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Tracker(e) | ManagerError::Inject(InjectError::Tracker(e)) => e.into(),
            ManagerError::Inject(e @ InjectError::Transmission { .. }) => {
                Self::Upstream(e.to_string())
            }
            ManagerError::Pane(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "Request failed");
        } else {
            tracing::debug!(%status, error = %self, "Request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
