use crate::ResourceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verbs every served kind supports
pub const SUPPORTED_VERBS: &[&str] = &["create", "get", "list"];

/// GroupVersionKind uniquely identifies a Kubernetes resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    /// API group (e.g., "", "apps")
    pub group: String,
    /// API version (e.g., "v1")
    pub version: String,
    /// Resource kind (e.g., "Pod", "Deployment")
    pub kind: String,
}

impl GroupVersionKind {
    /// Create a GVK from apiVersion and kind
    /// apiVersion format: "v1" or "group/version"
    pub fn from_api_version_kind(api_version: &str, kind: &str) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((g, v)) => (g.to_string(), v.to_string()),
            None => (String::new(), api_version.to_string()),
        };

        Self {
            group,
            version,
            kind: kind.to_string(),
        }
    }

    /// Get the apiVersion string (group/version or just version)
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Get the full API path segment
    pub fn api_path(&self) -> String {
        if self.group.is_empty() {
            format!("api/{}", self.version)
        } else {
            format!("apis/{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

/// The resource kinds served by the mock.
///
/// Every per-kind string (group-version, plural, short names) lives here so
/// discovery, routing and list envelopes cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Namespace,
    Pod,
    ConfigMap,
    Deployment,
    ReplicaSet,
}

impl ResourceKind {
    /// All kinds, core group first
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Namespace,
        ResourceKind::Pod,
        ResourceKind::ConfigMap,
        ResourceKind::Deployment,
        ResourceKind::ReplicaSet,
    ];

    /// The `kind` discriminator
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Pod => "Pod",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::ReplicaSet => "ReplicaSet",
        }
    }

    /// The `kind` of the list envelope, e.g. "PodList"
    pub fn list_kind(&self) -> String {
        format!("{}List", self.kind())
    }

    /// API group ("" for the core group)
    pub fn group(&self) -> &'static str {
        match self {
            ResourceKind::Namespace | ResourceKind::Pod | ResourceKind::ConfigMap => "",
            ResourceKind::Deployment | ResourceKind::ReplicaSet => "apps",
        }
    }

    /// The group-version string, "v1" or "apps/v1"
    pub fn api_version(&self) -> &'static str {
        match self.group() {
            "" => "v1",
            _ => "apps/v1",
        }
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version_kind(self.api_version(), self.kind())
    }

    /// Lowercase plural resource name used in URL paths
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Namespace => "namespaces",
            ResourceKind::Pod => "pods",
            ResourceKind::ConfigMap => "configmaps",
            ResourceKind::Deployment => "deployments",
            ResourceKind::ReplicaSet => "replicasets",
        }
    }

    /// Lowercase singular name, also used in error messages
    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Namespace => "namespace",
            ResourceKind::Pod => "pod",
            ResourceKind::ConfigMap => "configmap",
            ResourceKind::Deployment => "deployment",
            ResourceKind::ReplicaSet => "replicaset",
        }
    }

    pub fn short_names(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Namespace => &["ns"],
            ResourceKind::Pod => &["po"],
            ResourceKind::ConfigMap => &["cm"],
            ResourceKind::Deployment => &["deploy"],
            ResourceKind::ReplicaSet => &["rs"],
        }
    }

    /// Categories as reported by a real control plane (`kubectl get all`)
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Pod | ResourceKind::Deployment | ResourceKind::ReplicaSet => &["all"],
            ResourceKind::Namespace | ResourceKind::ConfigMap => &[],
        }
    }

    /// Whether real clients address this kind under `/namespaces/{ns}/`
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, ResourceKind::Namespace)
    }

    /// Kinds served under the given group-version
    pub fn in_group_version(api_version: &str) -> impl Iterator<Item = ResourceKind> + '_ {
        Self::ALL
            .into_iter()
            .filter(move |kind| kind.api_version() == api_version)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

impl FromStr for ResourceKind {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.kind() == s)
            .ok_or_else(|| ResourceError::invalid_kind(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gvk_from_api_version() {
        let gvk = GroupVersionKind::from_api_version_kind("v1", "Pod");
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.kind, "Pod");
        assert_eq!(gvk.api_version(), "v1");

        let gvk = GroupVersionKind::from_api_version_kind("apps/v1", "Deployment");
        assert_eq!(gvk.group, "apps");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.kind, "Deployment");
        assert_eq!(gvk.api_version(), "apps/v1");
    }

    #[test]
    fn test_gvk_api_path() {
        assert_eq!(ResourceKind::Pod.gvk().api_path(), "api/v1");
        assert_eq!(ResourceKind::ReplicaSet.gvk().api_path(), "apis/apps/v1");
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(ResourceKind::Namespace.list_kind(), "NamespaceList");
        assert_eq!(ResourceKind::ConfigMap.api_version(), "v1");
        assert_eq!(ResourceKind::Deployment.api_version(), "apps/v1");
        assert_eq!(ResourceKind::ReplicaSet.plural(), "replicasets");
        assert_eq!(ResourceKind::Deployment.short_names(), &["deploy"]);
        assert!(!ResourceKind::Namespace.is_namespaced());
        assert!(ResourceKind::Pod.is_namespaced());
    }

    #[test]
    fn test_in_group_version() {
        let core: Vec<_> = ResourceKind::in_group_version("v1").collect();
        assert_eq!(
            core,
            vec![
                ResourceKind::Namespace,
                ResourceKind::Pod,
                ResourceKind::ConfigMap
            ]
        );

        let apps: Vec<_> = ResourceKind::in_group_version("apps/v1").collect();
        assert_eq!(apps, vec![ResourceKind::Deployment, ResourceKind::ReplicaSet]);

        assert_eq!(ResourceKind::in_group_version("batch/v1").count(), 0);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("ConfigMap".parse::<ResourceKind>().unwrap(), ResourceKind::ConfigMap);
        assert!("configmap".parse::<ResourceKind>().is_err());
        assert!("Secret".parse::<ResourceKind>().is_err());
    }
}
