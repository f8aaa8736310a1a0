use crate::response::ApiResponse;
use crate::validation::{validate_name, validate_shape};
use crate::{AppState, Result};
use axum::response::{IntoResponse, Response};
use mockernetes_core::{Resource, ResourceKind};
use serde::Serialize;
use tracing::{debug, info};

/// Resource version reported on every list; the store keeps no versions
const LIST_RESOURCE_VERSION: &str = "1";

/// LIST handler shared by every kind
pub async fn list_resources(state: &AppState, kind: ResourceKind) -> Result<Response> {
    debug!(kind = %kind, "Listing resources");

    let items = state.store.list(kind).await;
    let response = ListResponse::new(kind.api_version().to_string(), kind.list_kind(), items);

    Ok(ApiResponse::ok(response).into_response())
}

/// GET handler shared by every kind
pub async fn get_resource(state: &AppState, kind: ResourceKind, name: &str) -> Result<Response> {
    debug!(kind = %kind, name = %name, "Getting resource");

    let object = state.store.get(kind, name).await?;

    Ok(ApiResponse::ok(object).into_response())
}

/// CREATE handler shared by every kind
///
/// Decodes the body as `R`, checks it has a kind and a DNS-1123 name, then
/// stores it in the partition for `kind`. The decoded object is echoed back.
pub async fn create_resource<R: Resource>(
    state: &AppState,
    kind: ResourceKind,
    body: &[u8],
) -> Result<Response> {
    let resource: R = serde_json::from_slice(body)?;

    validate_shape(kind, &resource)?;
    validate_name(resource.name())?;

    info!(kind = %kind, name = %resource.name(), "Creating resource");

    state.store.create(kind, &resource).await?;

    Ok(ApiResponse::created(resource).into_response())
}

/// List response wrapper
#[derive(Serialize)]
pub struct ListResponse<T: Serialize> {
    pub kind: String,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub metadata: ListMetadata,
    pub items: Vec<T>,
}

/// List metadata
#[derive(Serialize)]
pub struct ListMetadata {
    #[serde(rename = "resourceVersion")]
    pub resource_version: String,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(api_version: String, kind: String, items: Vec<T>) -> Self {
        Self {
            kind,
            api_version,
            metadata: ListMetadata {
                resource_version: LIST_RESOURCE_VERSION.to_string(),
            },
            items,
        }
    }
}
