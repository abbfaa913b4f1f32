//! Errors reported by resource providers.

use std::fmt;

use fhirdoc_core::IdError;

/// Errors that can occur during provider operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested resource, or the requested version of it, does not exist.
    ///
    /// Both cases share one kind; only the message tells them apart.
    #[error("{}", not_found_message(.resource_type, .id, .version))]
    NotFound {
        /// The type of resource that was requested.
        resource_type: String,
        /// The id exactly as requested.
        id: String,
        /// The version that was requested, when the lookup was a vread.
        version: Option<String>,
    },

    /// The request named a resource in a way that cannot be valid, such as
    /// a non-numeric id.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the offending argument.
        message: String,
    },

    /// The resource body is unacceptable.
    #[error("Invalid resource: {message}")]
    InvalidResource {
        /// Description of why the resource is invalid.
        message: String,
    },

    /// A conditional update named a version that is no longer current.
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// The version the client expected.
        expected: String,
        /// The current version.
        actual: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

fn not_found_message(resource_type: &str, id: &str, version: &Option<String>) -> String {
    match version {
        Some(version) => format!("Unknown version: {resource_type}/{id}/_history/{version}"),
        None => format!("Resource not found: {resource_type}/{id}"),
    }
}

impl StorageError {
    /// Creates a `NotFound` error for an unknown resource.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
            version: None,
        }
    }

    /// Creates a `NotFound` error for an unknown version of a known resource.
    #[must_use]
    pub fn version_not_found(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
            version: Some(version.into()),
        }
    }

    /// Creates a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidResource` error.
    #[must_use]
    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Creates a new `VersionConflict` error.
    #[must_use]
    pub fn version_conflict(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::VersionConflict {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an invalid argument error.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns `true` if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidArgument { .. } => ErrorCategory::Validation,
            Self::InvalidResource { .. } => ErrorCategory::Validation,
            Self::VersionConflict { .. } => ErrorCategory::Conflict,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<IdError> for StorageError {
    fn from(err: IdError) -> Self {
        Self::invalid_argument(err.to_string())
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Resource or version not found.
    NotFound,
    /// Bad identifier or bad resource body.
    Validation,
    /// Version conflict.
    Conflict,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("Composition", "123");
        assert_eq!(err.to_string(), "Resource not found: Composition/123");

        let err = StorageError::version_not_found("Composition", "1", "9");
        assert_eq!(err.to_string(), "Unknown version: Composition/1/_history/9");

        let err = StorageError::version_conflict("1", "2");
        assert_eq!(err.to_string(), "Version conflict: expected 1, found 2");
    }

    #[test]
    fn test_unknown_version_shares_not_found_kind() {
        let missing_resource = StorageError::not_found("Composition", "5");
        let missing_version = StorageError::version_not_found("Composition", "1", "3");

        assert!(missing_resource.is_not_found());
        assert!(missing_version.is_not_found());
        assert_eq!(missing_resource.category(), missing_version.category());
        assert_ne!(missing_resource.to_string(), missing_version.to_string());
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::invalid_argument("bad id");
        assert!(err.is_invalid_argument());
        assert!(!err.is_not_found());
        assert!(!err.is_version_conflict());

        let err = StorageError::version_conflict("1", "2");
        assert!(err.is_version_conflict());
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_id_error_conversion() {
        let err: StorageError = IdError::NotNumeric("abc".into()).into();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("Composition", "123").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::invalid_resource("bad data").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            StorageError::version_conflict("1", "2").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
    }
}
