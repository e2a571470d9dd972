//! Error types for the update path.

use thiserror::Error;

/// Errors that can occur while assembling or sending an update.
///
/// Building a field mask never fails; these errors come from reading typed
/// values out of state during request assembly and from the cloud API call.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The resource was not found by the cloud API.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A state value could not be converted into a request field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type has no registered updater.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Permission denied (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Quota or rate limit exceeded.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Service temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The operation was aborted, typically by a concurrent modification.
    #[error("Aborted: {0}")]
    Aborted(String),

    /// Operation failed due to current state (precondition not met).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// The API rejected the request as malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other API failure.
    #[error("API error: {0}")]
    Api(String),
}

impl UpdateError {
    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::PermissionDenied(msg) => msg,
            Self::ResourceExhausted(msg) => msg,
            Self::Unavailable(msg) => msg,
            Self::DeadlineExceeded(msg) => msg,
            Self::Aborted(msg) => msg,
            Self::FailedPrecondition(msg) => msg,
            Self::InvalidRequest(msg) => msg,
            Self::Api(msg) => msg,
        }
    }

    /// Whether a retry of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_)
                | Self::DeadlineExceeded(_)
                | Self::ResourceExhausted(_)
                | Self::Aborted(_)
        )
    }

    pub(crate) fn type_mismatch(path: impl std::fmt::Display, expected: &str, got: &str) -> Self {
        Self::Validation(format!(
            "attribute '{}': expected {}, got {}",
            path, expected, got
        ))
    }
}

impl From<tonic::Status> for UpdateError {
    fn from(status: tonic::Status) -> Self {
        let msg = status.message().to_string();
        match status.code() {
            tonic::Code::NotFound => Self::NotFound(msg),
            tonic::Code::InvalidArgument | tonic::Code::OutOfRange => Self::InvalidRequest(msg),
            tonic::Code::PermissionDenied | tonic::Code::Unauthenticated => {
                Self::PermissionDenied(msg)
            },
            tonic::Code::ResourceExhausted => Self::ResourceExhausted(msg),
            tonic::Code::Unavailable => Self::Unavailable(msg),
            tonic::Code::DeadlineExceeded => Self::DeadlineExceeded(msg),
            tonic::Code::Aborted => Self::Aborted(msg),
            tonic::Code::FailedPrecondition => Self::FailedPrecondition(msg),
            code => Self::Api(format!("{:?}: {}", code, msg)),
        }
    }
}

impl From<UpdateError> for tonic::Status {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::NotFound(msg) => tonic::Status::not_found(msg),
            UpdateError::Validation(msg) => tonic::Status::invalid_argument(msg),
            UpdateError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            UpdateError::UnknownResource(msg) => tonic::Status::not_found(msg),
            UpdateError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            UpdateError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            UpdateError::ResourceExhausted(msg) => tonic::Status::resource_exhausted(msg),
            UpdateError::Unavailable(msg) => tonic::Status::unavailable(msg),
            UpdateError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            UpdateError::Aborted(msg) => tonic::Status::aborted(msg),
            UpdateError::FailedPrecondition(msg) => tonic::Status::failed_precondition(msg),
            UpdateError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
            UpdateError::Api(msg) => tonic::Status::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UpdateError::NotFound("endpoint-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: endpoint-123");

        let err = UpdateError::Validation("bad value".to_string());
        assert_eq!(format!("{}", err), "Validation error: bad value");

        let err = UpdateError::UnknownResource("yandex_unknown".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: yandex_unknown");
    }

    #[test]
    fn test_status_to_error() {
        let err: UpdateError = tonic::Status::unavailable("try later").into();
        assert!(matches!(err, UpdateError::Unavailable(_)));
        assert_eq!(err.message(), "try later");

        let err: UpdateError = tonic::Status::not_found("gone").into();
        assert!(matches!(err, UpdateError::NotFound(_)));

        let err: UpdateError = tonic::Status::unauthenticated("no token").into();
        assert!(matches!(err, UpdateError::PermissionDenied(_)));

        let err: UpdateError = tonic::Status::internal("boom").into();
        assert!(matches!(err, UpdateError::Api(_)));
        assert!(err.message().contains("boom"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(UpdateError::Unavailable(String::new()).is_retryable());
        assert!(UpdateError::DeadlineExceeded(String::new()).is_retryable());
        assert!(UpdateError::ResourceExhausted(String::new()).is_retryable());
        assert!(UpdateError::Aborted(String::new()).is_retryable());

        assert!(!UpdateError::NotFound(String::new()).is_retryable());
        assert!(!UpdateError::InvalidRequest(String::new()).is_retryable());
        assert!(!UpdateError::Validation(String::new()).is_retryable());
        assert!(!UpdateError::PermissionDenied(String::new()).is_retryable());
    }

    #[test]
    fn test_error_to_status() {
        let status: tonic::Status = UpdateError::Validation("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);

        let status: tonic::Status = UpdateError::Aborted("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Aborted);

        let status: tonic::Status = UpdateError::Api("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Internal);

        let status: tonic::Status = UpdateError::UnknownResource("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = UpdateError::type_mismatch("labels.env", "string", "number");
        assert_eq!(
            err.message(),
            "attribute 'labels.env': expected string, got number"
        );
    }
}
