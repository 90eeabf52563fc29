//! Maps [`BankflowError`] to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bankflow_core::error::BankflowError;

/// Error returned by handlers.
#[derive(Debug)]
pub struct WebError(pub BankflowError);

impl From<BankflowError> for WebError {
    fn from(err: BankflowError) -> Self {
        Self(err)
    }
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BankflowError::ReferenceMismatch
            | BankflowError::FlowExpired
            | BankflowError::Security(_) => StatusCode::FORBIDDEN,
            BankflowError::NotFound { .. } => StatusCode::NOT_FOUND,
            BankflowError::Precondition(_) => StatusCode::CONFLICT,
            BankflowError::UpstreamHttp { .. }
            | BankflowError::UnexpectedResponse(_)
            | BankflowError::Transport(_) => StatusCode::BAD_GATEWAY,
            BankflowError::MissingConfiguration(_)
            | BankflowError::InvalidMethod(_)
            | BankflowError::Io { .. }
            | BankflowError::Serialization { .. }
            | BankflowError::Config(_)
            | BankflowError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::warn!("Request rejected: {}", self.0);
        }
        (status, self.0.to_string()).into_response()
    }
}
