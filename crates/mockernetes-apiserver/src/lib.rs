//! Mockernetes API Server - Kubernetes-compatible REST facade
//!
//! This crate provides:
//! - Axum-based HTTPS server gated by mutual TLS
//! - Discovery documents for the core and apps groups
//! - One generic LIST/GET/CREATE handler shared by every kind
//! - Kubernetes `Status` error envelopes
//! - Certificate generation for local clusters

pub mod auth;
pub mod error;
pub mod handlers;
pub mod pki;
pub mod response;
pub mod server;
pub mod state;
pub mod tls;
pub mod validation;

// Re-export commonly used types
pub use auth::{ClientIdentity, CommonNamePolicy, IdentityGatedVerifier, IdentityPolicy};
pub use error::{ApiError, Result};
pub use server::{ApiServer, Config, ServerError};
pub use state::AppState;
pub use tls::{TlsError, TlsPaths};
