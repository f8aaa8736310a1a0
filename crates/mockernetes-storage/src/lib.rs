//! Mockernetes Storage - In-memory resource store
//!
//! This crate provides:
//! - `ResourceStore`, one name-keyed partition per kind behind a single lock
//! - Create-if-absent, get and list-all operations
//! - Storage error types with miette diagnostics

pub mod error;
pub mod store;

// Re-export commonly used types
pub use error::{Result, StorageError};
pub use store::ResourceStore;
