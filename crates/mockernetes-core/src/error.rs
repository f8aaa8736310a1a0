// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for resource model operations
#[derive(Error, Debug, Diagnostic)]
pub enum ResourceError {
    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(mockernetes::serialization_error),
        help("Ensure the resource payload is valid JSON")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid kind
    #[error("Unknown resource kind: {kind}")]
    #[diagnostic(
        code(mockernetes::invalid_kind),
        help("Supported kinds: Namespace, Pod, ConfigMap, Deployment, ReplicaSet")
    )]
    InvalidKind {
        #[allow(unused)]
        kind: String,
    },
}

/// Result type alias for resource model operations
pub type Result<T> = std::result::Result<T, ResourceError>;

impl ResourceError {
    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }

    /// Create an InvalidKind error
    pub fn invalid_kind(kind: impl Into<String>) -> Self {
        Self::InvalidKind { kind: kind.into() }
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(err: serde_json::Error) -> Self {
        ResourceError::serialization_error(format!("JSON error: {}", err), Some(Box::new(err)))
    }
}
