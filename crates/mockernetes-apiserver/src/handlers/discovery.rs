use axum::Json;
use mockernetes_core::{ResourceKind, SUPPORTED_VERBS};
use serde_json::{json, Value};

/// Address advertised to clients in `/api`
const SERVER_ADDRESS: &str = "127.0.0.1:8443";

/// GET /api
pub async fn api_versions() -> Json<Value> {
    Json(json!({
        "kind": "APIVersions",
        "apiVersion": "v1",
        "versions": ["v1"],
        "serverAddressByClientCIDRs": [
            {"clientCIDR": "0.0.0.0/0", "serverAddress": SERVER_ADDRESS}
        ]
    }))
}

/// GET /apis
pub async fn api_group_list() -> Json<Value> {
    let version = json!({"groupVersion": "apps/v1", "version": "v1"});

    Json(json!({
        "kind": "APIGroupList",
        "apiVersion": "v1",
        "groups": [{
            "name": "apps",
            "versions": [version.clone()],
            "preferredVersion": version
        }]
    }))
}

/// GET /api/v1
pub async fn core_v1_resources() -> Json<Value> {
    Json(resource_list("v1"))
}

/// GET /apis/apps/v1
pub async fn apps_v1_resources() -> Json<Value> {
    Json(resource_list("apps/v1"))
}

/// GET /version
pub async fn version() -> Json<Value> {
    Json(json!({
        "major": "1",
        "minor": "31",
        "gitVersion": "v1.31.0",
        "gitCommit": "0000000000000000000000000000000000000000",
        "gitTreeState": "clean",
        "buildDate": "2024-08-13T00:00:00Z",
        "goVersion": "go1.22.5",
        "compiler": "gc",
        "platform": "linux/amd64"
    }))
}

/// Build the APIResourceList for one group-version from the kind table
fn resource_list(group_version: &str) -> Value {
    let resources: Vec<Value> = ResourceKind::in_group_version(group_version)
        .map(|kind| {
            let mut resource = json!({
                "name": kind.plural(),
                "singularName": kind.singular(),
                "namespaced": kind.is_namespaced(),
                "kind": kind.kind(),
                "verbs": SUPPORTED_VERBS,
                "shortNames": kind.short_names()
            });
            if !kind.categories().is_empty() {
                resource["categories"] = json!(kind.categories());
            }
            resource
        })
        .collect();

    json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": group_version,
        "resources": resources
    })
}
