// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use mockernetes_core::{ResourceError, ResourceKind};
use thiserror::Error;

/// Storage error type
#[derive(Error, Debug, Diagnostic)]
pub enum StorageError {
    /// Record has no `metadata.name`
    #[error("{} name required", .kind.singular())]
    #[diagnostic(
        code(storage::name_required),
        help("Set metadata.name on the submitted object")
    )]
    NameRequired { kind: ResourceKind },

    /// A record with this name is already stored for the kind
    #[error("{} {name} already exists", .kind.singular())]
    #[diagnostic(
        code(storage::already_exists),
        help("Names are unique per kind regardless of namespace; pick another name")
    )]
    AlreadyExists { kind: ResourceKind, name: String },

    /// No record with this name is stored for the kind
    #[error("{} \"{name}\" not found", .kind.plural())]
    #[diagnostic(
        code(storage::not_found),
        help("List the kind to see which names exist")
    )]
    NotFound { kind: ResourceKind, name: String },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(storage::serialization_error),
        help("Ensure the data is valid and can be serialized")
    )]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Create a NameRequired error
    pub fn name_required(kind: ResourceKind) -> Self {
        Self::NameRequired { kind }
    }

    /// Create an AlreadyExists error
    pub fn already_exists(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

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
}

impl From<ResourceError> for StorageError {
    fn from(err: ResourceError) -> Self {
        StorageError::serialization_error(err.to_string(), Some(Box::new(err)))
    }
}
