pub mod record;

pub use record::{ObjectMeta, ResourceRecord};

use crate::{GroupVersionKind, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Capability every stored kind exposes.
///
/// The store and the REST handlers only go through this trait, so one
/// generic create/list implementation serves all kinds.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Get the API version of this resource
    fn api_version(&self) -> &str;

    /// Get the kind of this resource
    fn kind(&self) -> &str;

    /// Get the metadata of this resource
    fn metadata(&self) -> &ObjectMeta;

    /// Get the resource name (`metadata.name`)
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Get the GroupVersionKind
    fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version_kind(self.api_version(), self.kind())
    }

    /// Serialize into the JSON form kept by the store
    fn serialize_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Read `metadata.name` out of a serialized resource.
///
/// Returns `None` when the field is absent, not a string, or empty.
pub fn name_of(value: &Value) -> Option<&str> {
    value
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

/// Maximum length of a DNS-1123 label
pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;

const DNS1123_LABEL_ERR_MSG: &str = "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', and must start and end with an alphanumeric character";

/// Validate a DNS-1123 label, returning every rule it violates.
///
/// An empty vector means the value is valid. Messages follow the wording
/// real control planes return so clients display familiar errors.
pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut errs = Vec::new();

    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        errs.push(format!(
            "must be no more than {} characters",
            DNS1123_LABEL_MAX_LENGTH
        ));
    }

    if !matches_dns1123_label(value) {
        errs.push(format!(
            "{} (e.g. 'my-name',  or '123-abc', regex used for validation is '[a-z0-9]([-a-z0-9]*[a-z0-9])?')",
            DNS1123_LABEL_ERR_MSG
        ));
    }

    errs
}

/// `[a-z0-9]([-a-z0-9]*[a-z0-9])?`
fn matches_dns1123_label(value: &str) -> bool {
    let bytes = value.as_bytes();
    let is_alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            is_alnum(first)
                && is_alnum(last)
                && bytes.iter().all(|b| is_alnum(b) || *b == b'-')
        }
        _ => false,
    }
}
