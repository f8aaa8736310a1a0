//! Mockernetes Core - Resource model shared by the store and the API server
//!
//! This crate provides:
//! - The kind-polymorphic `ResourceRecord` and the `Resource` capability trait
//! - The `ResourceKind` table describing every served kind
//! - DNS-1123 label validation
//! - Error types with miette diagnostics

pub mod error;
pub mod resources;
pub mod types;

// Re-export commonly used types
pub use error::{ResourceError, Result};
pub use resources::{
    is_dns1123_label, name_of, ObjectMeta, Resource, ResourceRecord, DNS1123_LABEL_MAX_LENGTH,
};
pub use types::{GroupVersionKind, ResourceKind, SUPPORTED_VERBS};
