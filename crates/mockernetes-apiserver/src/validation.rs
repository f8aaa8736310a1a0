use crate::{ApiError, Result};
use mockernetes_core::{is_dns1123_label, Resource, ResourceKind};

/// Check the minimum shape every submitted object must have
pub fn validate_shape<R: Resource>(kind: ResourceKind, resource: &R) -> Result<()> {
    if resource.kind().is_empty() {
        return Err(ApiError::BadRequest(format!("invalid {}", kind.singular())));
    }
    Ok(())
}

/// Validate a resource name (DNS-1123 label)
///
/// The error message is the first rule the name violates.
pub fn validate_name(name: &str) -> Result<()> {
    match is_dns1123_label(name).into_iter().next() {
        Some(first) => Err(ApiError::BadRequest(first)),
        None => Ok(()),
    }
}
