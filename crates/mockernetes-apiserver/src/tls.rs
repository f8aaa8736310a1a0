// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use crate::auth::{IdentityGatedVerifier, IdentityPolicy};
use crate::pki::{CA_CERT_FILE, SERVER_CERT_FILE, SERVER_KEY_FILE};
use miette::Diagnostic;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{RootCertStore, ServerConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Directory the certificate files are read from by default
pub const DEFAULT_CERT_DIR: &str = "certs";

/// TLS error type
#[derive(Error, Debug, Diagnostic)]
pub enum TlsError {
    #[error("failed to read {}", .path.display())]
    #[diagnostic(
        code(tls::read_file),
        help("Check the file exists, or run `mockernetes generate-certs` to create it")
    )]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed PEM in {}", .path.display())]
    #[diagnostic(code(tls::malformed_pem), help("The file is not valid PEM"))]
    MalformedPem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {}", .path.display())]
    #[diagnostic(
        code(tls::no_certificates),
        help("Expected one or more `BEGIN CERTIFICATE` blocks")
    )]
    NoCertificates { path: PathBuf },

    #[error("no private key found in {}", .path.display())]
    #[diagnostic(
        code(tls::no_private_key),
        help("Expected a PKCS#8, PKCS#1 or SEC1 private key block")
    )]
    NoPrivateKey { path: PathBuf },

    #[error("CA bundle {} contains no certificates", .path.display())]
    #[diagnostic(
        code(tls::empty_ca_bundle),
        help("Client certificates can only be verified against at least one CA")
    )]
    EmptyCaBundle { path: PathBuf },

    #[error("invalid CA certificate in {}", .path.display())]
    #[diagnostic(code(tls::invalid_ca_certificate))]
    InvalidCaCertificate {
        path: PathBuf,
        #[source]
        source: rustls::Error,
    },

    #[error("invalid certificate in {}: {message}", .path.display())]
    #[diagnostic(code(tls::invalid_certificate))]
    InvalidCertificate { path: PathBuf, message: String },

    #[error("failed to build client certificate verifier")]
    #[diagnostic(code(tls::verifier))]
    Verifier {
        #[source]
        source: rustls::server::VerifierBuilderError,
    },

    #[error("failed to build TLS server configuration")]
    #[diagnostic(
        code(tls::server_config),
        help("Check that the server key matches the server certificate")
    )]
    ServerConfig {
        #[source]
        source: rustls::Error,
    },

    #[error("failed to generate {what}")]
    #[diagnostic(code(tls::generate))]
    Generate {
        what: &'static str,
        #[source]
        source: rcgen::Error,
    },

    #[error("failed to write {}", .path.display())]
    #[diagnostic(code(tls::write_file))]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TlsError {
    /// Create a Generate error
    pub fn generate(what: &'static str, source: rcgen::Error) -> Self {
        Self::Generate { what, source }
    }
}

/// Locations of the PEM files the server loads at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    /// Server certificate chain
    pub cert_path: PathBuf,
    /// Server private key
    pub key_path: PathBuf,
    /// CA bundle client certificates are verified against
    pub ca_path: PathBuf,
}

impl TlsPaths {
    /// Standard file names under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            cert_path: dir.join(SERVER_CERT_FILE),
            key_path: dir.join(SERVER_KEY_FILE),
            ca_path: dir.join(CA_CERT_FILE),
        }
    }
}

impl Default for TlsPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_CERT_DIR)
    }
}

/// Raw PEM read from disk
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
    pub ca_pem: Vec<u8>,
}

impl TlsMaterial {
    pub fn load(paths: &TlsPaths) -> Result<Self, TlsError> {
        Ok(Self {
            cert_pem: read_file(&paths.cert_path)?,
            key_pem: read_file(&paths.key_path)?,
            ca_pem: read_file(&paths.ca_path)?,
        })
    }
}

/// Build the server's TLS configuration: mandatory client certificates
/// verified against the CA bundle, then checked by `policy`.
pub fn server_config(
    paths: &TlsPaths,
    policy: Arc<dyn IdentityPolicy>,
) -> Result<Arc<ServerConfig>, TlsError> {
    let material = TlsMaterial::load(paths)?;

    let certs = parse_certificates(&material.cert_pem, &paths.cert_path)?;
    let key = parse_private_key(&material.key_pem, &paths.key_path)?;
    let roots = parse_ca_bundle(&material.ca_pem, &paths.ca_path)?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let verifier = IdentityGatedVerifier::new(roots, provider.clone(), policy)
        .map_err(|source| TlsError::Verifier { source })?;

    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|source| TlsError::ServerConfig { source })?
        .with_client_cert_verifier(Arc::new(verifier))
        .with_single_cert(certs, key)
        .map_err(|source| TlsError::ServerConfig { source })?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    info!(
        "Loaded TLS material (cert {}, CA {})",
        paths.cert_path.display(),
        paths.ca_path.display()
    );

    Ok(Arc::new(config))
}

fn read_file(path: &Path) -> Result<Vec<u8>, TlsError> {
    std::fs::read(path).map_err(|source| TlsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn read_pem_certificates(pem: &[u8], path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = pem;
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::MalformedPem {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_certificates(pem: &[u8], path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certs = read_pem_certificates(pem, path)?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.to_path_buf(),
        });
    }

    for cert in &certs {
        x509_parser::parse_x509_certificate(cert.as_ref()).map_err(|e| {
            TlsError::InvalidCertificate {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
    }

    Ok(certs)
}

fn parse_private_key(pem: &[u8], path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = pem;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::MalformedPem {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.to_path_buf(),
        })
}

fn parse_ca_bundle(pem: &[u8], path: &Path) -> Result<RootCertStore, TlsError> {
    let certs = read_pem_certificates(pem, path)?;
    if certs.is_empty() {
        return Err(TlsError::EmptyCaBundle {
            path: path.to_path_buf(),
        });
    }

    let mut roots = RootCertStore::empty();
    for cert in certs {
        roots
            .add(cert)
            .map_err(|source| TlsError::InvalidCaCertificate {
                path: path.to_path_buf(),
                source,
            })?;
    }

    Ok(roots)
}
