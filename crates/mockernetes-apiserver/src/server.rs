use crate::auth::{CommonNamePolicy, IdentityPolicy};
use crate::handlers::*;
use crate::tls::{self, TlsError, TlsPaths};
use crate::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::Uri;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use bytes::Bytes;
use miette::Diagnostic;
use mockernetes_core::{ResourceKind, ResourceRecord};
use serde_json::{json, Value};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Port the server listens on by default
pub const DEFAULT_PORT: u16 = 8443;

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on
    pub listen_addr: SocketAddr,
    /// Server certificate, key and client CA bundle
    pub tls: TlsPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            tls: TlsPaths::default(),
        }
    }
}

/// Errors that stop the server
#[derive(Error, Debug, Diagnostic)]
pub enum ServerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tls(#[from] TlsError),

    #[error("server I/O error")]
    #[diagnostic(code(server::io), help("Check the listen address is free"))]
    Io(#[from] std::io::Error),
}

/// API server
pub struct ApiServer {
    config: Config,
    state: Arc<AppState>,
    policy: Arc<dyn IdentityPolicy>,
}

impl ApiServer {
    /// Create a new API server accepting any client certificate with a
    /// non-empty common name
    pub fn new(config: Config, state: Arc<AppState>) -> Self {
        Self {
            config,
            state,
            policy: Arc::new(CommonNamePolicy),
        }
    }

    /// Replace the identity check run on every client certificate
    pub fn with_identity_policy(mut self, policy: Arc<dyn IdentityPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            // Health checks
            .route("/healthz", get(healthz))
            .route("/livez", get(livez))
            .route("/readyz", get(readyz))
            .route("/version", get(version))
            // Discovery
            .route("/api", get(api_versions))
            .route("/apis", get(api_group_list))
            .route("/api/v1", get(core_v1_resources))
            .route("/apis/apps/v1", get(apps_v1_resources));

        ResourceKind::ALL
            .into_iter()
            .fold(router, mount_resource)
            .fallback(not_found)
            // Add tracing and state
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server, exposing its listening address and shutdown through
    /// `handle`.
    ///
    /// TLS material is loaded before the socket is bound, so bad files fail
    /// startup without opening a port.
    pub async fn run_with_handle(self, handle: Handle) -> Result<(), ServerError> {
        let tls_config = tls::server_config(&self.config.tls, self.policy.clone())?;
        let app = self.build_router();

        info!(
            "Starting API server on https://{} (client certificates required)",
            self.config.listen_addr
        );

        axum_server::bind_rustls(self.config.listen_addr, RustlsConfig::from_config(tls_config))
            .handle(handle)
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }
}

/// Mount the list/create and get routes of one kind, in both the cluster
/// form and, for namespaced kinds, the `/namespaces/{namespace}/` form. The
/// namespace segment is matched but not used.
fn mount_resource(router: Router<Arc<AppState>>, kind: ResourceKind) -> Router<Arc<AppState>> {
    let base = format!("/{}/{}", kind.gvk().api_path(), kind.plural());

    let collection: MethodRouter<Arc<AppState>> =
        get(move |State(state): State<Arc<AppState>>| async move {
            list_resources(&state, kind).await
        })
        .post(move |State(state): State<Arc<AppState>>, body: Bytes| async move {
            create_resource::<ResourceRecord>(&state, kind, &body).await
        });

    // The object name is always the last path parameter
    let item: MethodRouter<Arc<AppState>> = get(
        move |State(state): State<Arc<AppState>>,
              Path(params): Path<Vec<(String, String)>>| async move {
            let name = params
                .last()
                .map(|(_, value)| value.as_str())
                .unwrap_or_default();
            get_resource(&state, kind, name).await
        },
    );

    // Everything directly under `/namespaces/` shares one parameter name
    let item_param = if kind == ResourceKind::Namespace {
        "namespace"
    } else {
        "name"
    };

    let router = router
        .route(&base, collection.clone())
        .route(&format!("{base}/{{{item_param}}}"), item.clone());

    if !kind.is_namespaced() {
        return router;
    }

    let namespaced = format!(
        "/{}/namespaces/{{namespace}}/{}",
        kind.gvk().api_path(),
        kind.plural()
    );
    router
        .route(&namespaced, collection)
        .route(&format!("{namespaced}/{{name}}"), item)
}

/// Health check endpoint
async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Liveness probe
async fn livez() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Readiness probe
async fn readyz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!(
        "the server could not find the requested resource: {}",
        uri.path()
    ))
}
