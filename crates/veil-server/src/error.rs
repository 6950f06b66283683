//! Error types for the transport layer.
//!
//! Only asset serving can fail toward the client. The relay endpoints are
//! infallible by design: publishes always answer `{"ok":true}` and
//! watches either deliver or stay open until the client gives up.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors from serving static assets.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Requested path escapes the static root.
    #[error("'{0}' is not in the static root")]
    Forbidden(String),

    /// No such asset.
    #[error("not found")]
    NotFound,

    /// Filesystem error while reading an asset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response construction failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Io(err) if err.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = ServerError::Forbidden("../etc".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = ServerError::NotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let resp = ServerError::Io(io).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let io = std::io::Error::other("disk on fire");
        let resp = ServerError::Io(io).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
