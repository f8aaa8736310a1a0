use crate::tls::{TlsError, TlsPaths};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose,
};
use rustls::pki_types::CertificateDer;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CA_CERT_FILE: &str = "ca.crt";
pub const CA_KEY_FILE: &str = "ca.key";
pub const SERVER_CERT_FILE: &str = "server.crt";
pub const SERVER_KEY_FILE: &str = "server.key";
pub const CLIENT_CERT_FILE: &str = "client.crt";
pub const CLIENT_KEY_FILE: &str = "client.key";

/// Names the generated server certificate is valid for
pub const SERVER_SAN_ENTRIES: &[&str] = &["localhost", "127.0.0.1"];

/// Common name and organization of the generated client certificate
pub const CLIENT_COMMON_NAME: &str = "admin";
pub const CLIENT_ORGANIZATION: &str = "system:masters";

/// A freshly generated, self-signed certificate authority
pub struct CertificateAuthority {
    cert: Certificate,
    key: KeyPair,
}

/// A leaf certificate signed by a [`CertificateAuthority`]
pub struct IssuedCert {
    pub cert_pem: String,
    pub key_pem: String,
    pub cert_der: CertificateDer<'static>,
}

impl CertificateAuthority {
    /// Generate a new CA key pair and self-signed certificate
    pub fn generate(common_name: &str) -> Result<Self, TlsError> {
        let key = KeyPair::generate().map_err(|e| TlsError::generate("CA key pair", e))?;

        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(common_name, &[]);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let cert = params
            .self_signed(&key)
            .map_err(|e| TlsError::generate("CA certificate", e))?;

        Ok(Self { cert, key })
    }

    pub fn cert_pem(&self) -> String {
        self.cert.pem()
    }

    pub fn key_pem(&self) -> String {
        self.key.serialize_pem()
    }

    pub fn cert_der(&self) -> &CertificateDer<'static> {
        self.cert.der()
    }

    /// Issue a server certificate valid for the given DNS names / IPs
    pub fn issue_server_cert(&self, san_entries: &[&str]) -> Result<IssuedCert, TlsError> {
        let mut params = CertificateParams::new(
            san_entries.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )
        .map_err(|e| TlsError::generate("server certificate params", e))?;
        params.distinguished_name = distinguished_name("mockernetes", &[]);
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

        self.sign(params, "server certificate")
    }

    /// Issue a client certificate. An empty `common_name` yields a subject
    /// without a CN.
    pub fn issue_client_cert(
        &self,
        common_name: &str,
        organizations: &[&str],
    ) -> Result<IssuedCert, TlsError> {
        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(common_name, organizations);
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];

        self.sign(params, "client certificate")
    }

    fn sign(&self, params: CertificateParams, what: &'static str) -> Result<IssuedCert, TlsError> {
        let key = KeyPair::generate().map_err(|e| TlsError::generate(what, e))?;
        let cert = params
            .signed_by(&key, &self.cert, &self.key)
            .map_err(|e| TlsError::generate(what, e))?;

        Ok(IssuedCert {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
            cert_der: cert.der().clone(),
        })
    }
}

fn distinguished_name(common_name: &str, organizations: &[&str]) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    if !common_name.is_empty() {
        dn.push(DnType::CommonName, common_name);
    }
    for org in organizations {
        dn.push(DnType::OrganizationName, *org);
    }
    dn
}

/// Make sure a CA, server and client certificate exist under `dir`.
///
/// Existing files are reused when all of them are present; otherwise a new
/// set is generated and written, replacing any partial set.
pub fn ensure_certs(dir: &Path) -> Result<TlsPaths, TlsError> {
    let files: Vec<PathBuf> = [
        CA_CERT_FILE,
        CA_KEY_FILE,
        SERVER_CERT_FILE,
        SERVER_KEY_FILE,
        CLIENT_CERT_FILE,
        CLIENT_KEY_FILE,
    ]
    .iter()
    .map(|name| dir.join(name))
    .collect();

    if files.iter().all(|path| path.exists()) {
        info!("Reusing existing certificates in {}", dir.display());
        return Ok(TlsPaths::in_dir(dir));
    }

    info!("Generating certificates in {}", dir.display());
    generate_certs(dir)
}

/// Generate a CA, server and client certificate and write them to `dir`
pub fn generate_certs(dir: &Path) -> Result<TlsPaths, TlsError> {
    std::fs::create_dir_all(dir).map_err(|source| TlsError::WriteFile {
        path: dir.to_path_buf(),
        source,
    })?;

    let ca = CertificateAuthority::generate("mockernetes-ca")?;
    let server = ca.issue_server_cert(SERVER_SAN_ENTRIES)?;
    let client = ca.issue_client_cert(CLIENT_COMMON_NAME, &[CLIENT_ORGANIZATION])?;

    write_file(&dir.join(CA_CERT_FILE), &ca.cert_pem())?;
    write_file(&dir.join(CA_KEY_FILE), &ca.key_pem())?;
    write_file(&dir.join(SERVER_CERT_FILE), &server.cert_pem)?;
    write_file(&dir.join(SERVER_KEY_FILE), &server.key_pem)?;
    write_file(&dir.join(CLIENT_CERT_FILE), &client.cert_pem)?;
    write_file(&dir.join(CLIENT_KEY_FILE), &client.key_pem)?;

    info!(
        "Certificates written to {} (ca, server, client for CN={})",
        dir.display(),
        CLIENT_COMMON_NAME
    );

    Ok(TlsPaths::in_dir(dir))
}

fn write_file(path: &Path, contents: &str) -> Result<(), TlsError> {
    std::fs::write(path, contents).map_err(|source| TlsError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}
