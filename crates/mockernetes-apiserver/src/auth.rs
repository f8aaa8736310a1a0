//! Client certificate authentication for mTLS
//!
//! The handshake is checked in two stages. A WebPKI verifier first validates
//! the presented chain against the configured CA bundle; an [`IdentityPolicy`]
//! then inspects the verified chain and decides whether the identity it
//! carries is acceptable. A rejection at either stage aborts the handshake, so
//! unauthenticated connections never reach the HTTP layer.

use std::fmt;
use std::sync::Arc;

use rustls::client::danger::HandshakeSignatureValid;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::server::{VerifierBuilderError, WebPkiClientVerifier};
use rustls::{
    CertificateError, DigitallySignedStruct, DistinguishedName, RootCertStore, SignatureScheme,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Identity carried by an accepted client certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Subject common name
    pub username: String,
    /// Subject organizations
    pub groups: Vec<String>,
}

/// Why an identity policy refused a chain
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("no client certificate presented")]
    NoCertificate,

    #[error("failed to parse client certificate: {0}")]
    Parse(String),

    #[error("client certificate has an empty common name")]
    EmptyIdentity,

    #[error("identity {0} is not allowed")]
    Forbidden(String),
}

/// Decides whether a CA-verified chain carries an acceptable identity.
///
/// Runs once per handshake, possibly on several threads at once.
pub trait IdentityPolicy: fmt::Debug + Send + Sync {
    /// Inspect a chain whose leaf comes first
    fn authenticate(&self, chain: &[CertificateDer<'_>]) -> Result<ClientIdentity, AuthError>;
}

/// Accepts any leaf whose subject has a non-empty Common Name
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonNamePolicy;

impl IdentityPolicy for CommonNamePolicy {
    fn authenticate(&self, chain: &[CertificateDer<'_>]) -> Result<ClientIdentity, AuthError> {
        let leaf = chain.first().ok_or(AuthError::NoCertificate)?;

        let (_, parsed) = x509_parser::parse_x509_certificate(leaf.as_ref())
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        let username = parsed
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or_default();

        if username.is_empty() {
            return Err(AuthError::EmptyIdentity);
        }

        let groups = parsed
            .subject()
            .iter_organization()
            .filter_map(|o| o.as_str().ok())
            .map(String::from)
            .collect();

        Ok(ClientIdentity {
            username: username.to_string(),
            groups,
        })
    }
}

/// Client certificate verifier that requires a CA-signed chain and an
/// identity accepted by the configured policy.
#[derive(Debug)]
pub struct IdentityGatedVerifier {
    inner: Arc<dyn ClientCertVerifier>,
    policy: Arc<dyn IdentityPolicy>,
}

impl IdentityGatedVerifier {
    /// Build a verifier trusting `roots`. Client certificates are mandatory.
    pub fn new(
        roots: RootCertStore,
        provider: Arc<CryptoProvider>,
        policy: Arc<dyn IdentityPolicy>,
    ) -> Result<Self, VerifierBuilderError> {
        let inner = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider).build()?;
        Ok(Self { inner, policy })
    }
}

impl ClientCertVerifier for IdentityGatedVerifier {
    fn offer_client_auth(&self) -> bool {
        true
    }

    fn client_auth_mandatory(&self) -> bool {
        true
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        self.inner.root_hint_subjects()
    }

    fn verify_client_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        let verified = self
            .inner
            .verify_client_cert(end_entity, intermediates, now)
            .inspect_err(|e| warn!(error = %e, "Rejected untrusted client certificate"))?;

        let mut chain = Vec::with_capacity(intermediates.len() + 1);
        chain.push(end_entity.clone());
        chain.extend(intermediates.iter().cloned());

        match self.policy.authenticate(&chain) {
            Ok(identity) => {
                debug!(identity = %identity.username, "Accepted client certificate");
                Ok(verified)
            }
            Err(e) => {
                warn!(error = %e, "Rejected client certificate");
                Err(rustls::Error::InvalidCertificate(
                    CertificateError::ApplicationVerificationFailure,
                ))
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
