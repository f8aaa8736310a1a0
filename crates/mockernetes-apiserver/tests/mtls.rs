use axum_server::Handle;
use mockernetes_apiserver::pki::{
    CertificateAuthority, IssuedCert, CA_CERT_FILE, SERVER_CERT_FILE, SERVER_KEY_FILE,
    SERVER_SAN_ENTRIES,
};
use mockernetes_apiserver::auth::AuthError;
use mockernetes_apiserver::{
    ApiServer, AppState, ClientIdentity, CommonNamePolicy, Config, IdentityPolicy, TlsPaths,
};
use rustls::pki_types::CertificateDer;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;

struct TestServer {
    _dir: TempDir,
    addr: SocketAddr,
    handle: Handle,
}

impl TestServer {
    async fn start(ca: &CertificateAuthority) -> Self {
        Self::start_with_policy(ca, Arc::new(CommonNamePolicy)).await
    }

    async fn start_with_policy(ca: &CertificateAuthority, policy: Arc<dyn IdentityPolicy>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let server_cert = ca.issue_server_cert(SERVER_SAN_ENTRIES).unwrap();
        std::fs::write(dir.path().join(CA_CERT_FILE), ca.cert_pem()).unwrap();
        std::fs::write(dir.path().join(SERVER_CERT_FILE), &server_cert.cert_pem).unwrap();
        std::fs::write(dir.path().join(SERVER_KEY_FILE), &server_cert.key_pem).unwrap();

        let config = Config {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            tls: TlsPaths::in_dir(dir.path()),
        };
        let server =
            ApiServer::new(config, Arc::new(AppState::default())).with_identity_policy(policy);

        let handle = Handle::new();
        tokio::spawn(server.run_with_handle(handle.clone()));
        let addr = handle.listening().await.expect("server failed to start");

        Self {
            _dir: dir,
            addr,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("https://localhost:{}{}", self.addr.port(), path)
    }

    fn client(&self, ca: &CertificateAuthority, identity: Option<&IssuedCert>) -> reqwest::Client {
        let root = reqwest::Certificate::from_pem(ca.cert_pem().as_bytes()).unwrap();
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .add_root_certificate(root)
            .resolve("localhost", self.addr);

        if let Some(cert) = identity {
            let pem = format!("{}{}", cert.key_pem, cert.cert_pem);
            builder = builder.identity(reqwest::Identity::from_pem(pem.as_bytes()).unwrap());
        }

        builder.build().unwrap()
    }
}

/// Accepts only the `ci-runner` identity
#[derive(Debug)]
struct OnlyCiRunner;

impl IdentityPolicy for OnlyCiRunner {
    fn authenticate(&self, chain: &[CertificateDer<'_>]) -> Result<ClientIdentity, AuthError> {
        let identity = CommonNamePolicy.authenticate(chain)?;
        if identity.username == "ci-runner" {
            Ok(identity)
        } else {
            Err(AuthError::Forbidden(identity.username))
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}

#[tokio::test]
async fn test_connection_without_client_certificate_is_refused() {
    let ca = CertificateAuthority::generate("test-ca").unwrap();
    let server = TestServer::start(&ca).await;

    let result = server
        .client(&ca, None)
        .get(server.url("/healthz"))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_certificate_with_empty_common_name_is_refused() {
    let ca = CertificateAuthority::generate("test-ca").unwrap();
    let server = TestServer::start(&ca).await;
    let anonymous = ca.issue_client_cert("", &[]).unwrap();

    let result = server
        .client(&ca, Some(&anonymous))
        .get(server.url("/healthz"))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_certificate_from_untrusted_ca_is_refused() {
    let ca = CertificateAuthority::generate("test-ca").unwrap();
    let other = CertificateAuthority::generate("other-ca").unwrap();
    let server = TestServer::start(&ca).await;
    let impostor = other.issue_client_cert("admin", &["system:masters"]).unwrap();

    let result = server
        .client(&ca, Some(&impostor))
        .get(server.url("/healthz"))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_admin_certificate_is_accepted() {
    let ca = CertificateAuthority::generate("test-ca").unwrap();
    let server = TestServer::start(&ca).await;
    let admin = ca.issue_client_cert("admin", &["system:masters"]).unwrap();

    let response = server
        .client(&ca, Some(&admin))
        .get(server.url("/healthz"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_create_and_list_over_mtls() {
    let ca = CertificateAuthority::generate("test-ca").unwrap();
    let server = TestServer::start(&ca).await;
    let admin = ca.issue_client_cert("admin", &["system:masters"]).unwrap();
    let client = server.client(&ca, Some(&admin));

    let team_a = json!({"kind": "Namespace", "apiVersion": "v1", "metadata": {"name": "team-a"}});
    let response = client
        .post(server.url("/api/v1/namespaces"))
        .json(&team_a)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    assert_eq!(response.json::<Value>().await.unwrap(), team_a);

    let list: Value = client
        .get(server.url("/api/v1/namespaces"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = list["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["metadata"]["name"].as_str())
        .collect();
    assert_eq!(names, vec!["default", "team-a"]);
}

#[tokio::test]
async fn test_custom_identity_policy_replaces_default() {
    let ca = CertificateAuthority::generate("test-ca").unwrap();
    let server = TestServer::start_with_policy(&ca, Arc::new(OnlyCiRunner)).await;
    let admin = ca.issue_client_cert("admin", &["system:masters"]).unwrap();
    let runner = ca.issue_client_cert("ci-runner", &[]).unwrap();

    let refused = server
        .client(&ca, Some(&admin))
        .get(server.url("/healthz"))
        .send()
        .await;
    assert!(refused.is_err());

    let response = server
        .client(&ca, Some(&runner))
        .get(server.url("/healthz"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}
