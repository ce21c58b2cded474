//! Error types shared across the control plane.

use thiserror::Error;

/// Result type alias used throughout the control plane.
pub type CtlResult<T> = std::result::Result<T, CtlError>;

/// The error kinds the HTTP boundary maps to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    ValidationFailed,
    EngineError,
    Internal,
}

/// Errors raised by any component in the control plane.
#[derive(Debug, Error)]
pub enum CtlError {
    /// Invalid parameters: out-of-range values, duplicate ids, missing coverage.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A dataset file or report referenced by id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Target index already exists, or alias state disagrees with the caller's
    /// expectation (rollback guard).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The reindex validator returned `passed = false`.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The engine returned a failure; context identifies the source/target.
    #[error("engine error ({context}): {message}")]
    Engine { context: String, message: String },

    /// Filesystem or serialization failures that don't fit another category.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wraps an I/O failure encountered while writing reports/manifests.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wraps a (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CtlError {
    /// The error kind used to pick an HTTP status code at the admin boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::Engine { .. } => ErrorKind::EngineError,
            Self::Internal(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Build an [`CtlError::Engine`] with source/target context, so the
    /// source/target index is visible before the error is re-raised.
    pub fn engine(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Engine {
            context: context.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_variant_maps_to_its_expected_kind() {
        assert_eq!(CtlError::BadRequest("x".into()).kind(), ErrorKind::BadRequest);
        assert_eq!(CtlError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CtlError::Conflict("x".into()).kind(), ErrorKind::Conflict);
        assert_eq!(
            CtlError::ValidationFailed("x".into()).kind(),
            ErrorKind::ValidationFailed
        );
        assert_eq!(
            CtlError::engine("docs_v1", "boom").kind(),
            ErrorKind::EngineError
        );
        assert_eq!(CtlError::Internal("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn engine_error_carries_context() {
        let err = CtlError::engine("docs_v1->docs_v2", "timeout");
        assert!(err.to_string().contains("docs_v1->docs_v2"));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn display_non_empty() {
        let errs: Vec<CtlError> = vec![
            CtlError::BadRequest(String::new()),
            CtlError::NotFound(String::new()),
            CtlError::Conflict(String::new()),
            CtlError::ValidationFailed(String::new()),
            CtlError::engine("", ""),
            CtlError::Internal(String::new()),
        ];
        for e in &errs {
            assert!(!e.to_string().is_empty());
        }
    }
}
