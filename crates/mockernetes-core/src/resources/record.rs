use super::Resource;
use crate::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Object metadata.
///
/// Only the name is typed; anything else a client sends (`namespace`,
/// `labels`, `creationTimestamp`, ...) is kept in `extra` and echoed back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObjectMeta {
    /// `metadata.namespace`, when present. Accepted and echoed, never used
    /// for partitioning.
    pub fn namespace(&self) -> Option<&str> {
        self.extra.get("namespace").and_then(Value::as_str)
    }
}

/// One stored object of any kind.
///
/// Everything besides `kind`, `apiVersion` and `metadata` is opaque and kept
/// in `extra` as sent, `null` values included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    #[serde(default)]
    pub kind: String,

    /// Omitted on output when the client did not send one
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceRecord {
    /// Create an empty record of the given kind
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind: kind.kind().to_string(),
            api_version: kind.api_version().to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata
            .extra
            .insert("namespace".to_string(), Value::String(namespace.into()));
        self
    }

    pub fn with_spec(mut self, spec: Value) -> Self {
        self.extra.insert("spec".to_string(), spec);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.extra.insert("data".to_string(), data);
        self
    }
}

impl Resource for ResourceRecord {
    fn api_version(&self) -> &str {
        &self.api_version
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}
