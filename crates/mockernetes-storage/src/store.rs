use crate::{Result, StorageError};
use mockernetes_core::{name_of, Resource, ResourceKind};
use serde_json::{json, Value};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info};

type Partition = BTreeMap<String, Value>;

/// In-memory resource store.
///
/// One partition per kind, keyed by `metadata.name` only: the namespace a
/// record claims is not part of its key. All partitions share one lock, so a
/// create excludes every other list, get and create for its duration.
pub struct ResourceStore {
    partitions: RwLock<HashMap<ResourceKind, Partition>>,
}

impl ResourceStore {
    /// Create a store seeded with the `default` namespace
    pub fn new() -> Self {
        let mut partitions = HashMap::new();
        partitions.insert(
            ResourceKind::Namespace,
            Partition::from([("default".to_string(), default_namespace())]),
        );

        info!("Initialized resource store with namespace 'default'");

        Self {
            partitions: RwLock::new(partitions),
        }
    }

    /// Create a store with every partition empty
    pub fn empty() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// List every stored record of a kind, ordered by name
    pub async fn list(&self, kind: ResourceKind) -> Vec<Value> {
        let partitions = self.partitions.read().await;
        let items: Vec<Value> = partitions
            .get(&kind)
            .map(|partition| partition.values().cloned().collect())
            .unwrap_or_default();

        debug!(kind = %kind, count = items.len(), "Listed resources");
        items
    }

    /// Get one record by name
    pub async fn get(&self, kind: ResourceKind, name: &str) -> Result<Value> {
        let partitions = self.partitions.read().await;
        partitions
            .get(&kind)
            .and_then(|partition| partition.get(name))
            .cloned()
            .ok_or_else(|| StorageError::not_found(kind, name))
    }

    /// Store a new record, failing if the name is empty or already taken.
    ///
    /// The resource is serialized before the lock is taken; the existence
    /// check and the insert happen under one write guard.
    pub async fn create<R: Resource>(&self, kind: ResourceKind, resource: &R) -> Result<()> {
        let value = resource.serialize_value()?;
        let name = name_of(&value)
            .ok_or_else(|| StorageError::name_required(kind))?
            .to_string();

        let mut partitions = self.partitions.write().await;
        match partitions.entry(kind).or_default().entry(name) {
            Entry::Occupied(entry) => Err(StorageError::already_exists(kind, entry.key())),
            Entry::Vacant(entry) => {
                info!(kind = %kind, name = %entry.key(), "Stored resource");
                entry.insert(value);
                Ok(())
            }
        }
    }

    /// Number of records stored for a kind
    pub async fn count(&self, kind: ResourceKind) -> usize {
        self.partitions
            .read()
            .await
            .get(&kind)
            .map_or(0, Partition::len)
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_namespace() -> Value {
    json!({
        "kind": "Namespace",
        "apiVersion": "v1",
        "metadata": {"name": "default"},
        "spec": {"finalizers": ["kubernetes"]},
        "status": {"phase": "Active"}
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockernetes_core::ResourceRecord;
    use std::sync::Arc;

    fn names(items: &[Value]) -> Vec<&str> {
        items.iter().filter_map(name_of).collect()
    }

    #[tokio::test]
    async fn test_new_store_seeds_default_namespace() {
        let store = ResourceStore::new();

        let namespaces = store.list(ResourceKind::Namespace).await;
        assert_eq!(namespaces, vec![default_namespace()]);

        for kind in [
            ResourceKind::Pod,
            ResourceKind::ConfigMap,
            ResourceKind::Deployment,
            ResourceKind::ReplicaSet,
        ] {
            assert!(store.list(kind).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let store = ResourceStore::new();

        for name in ["team-a", "team-b", "team-c"] {
            let ns = ResourceRecord::new(ResourceKind::Namespace, name);
            store.create(ResourceKind::Namespace, &ns).await.unwrap();
        }

        let items = store.list(ResourceKind::Namespace).await;
        assert_eq!(items.len(), 4);
        assert_eq!(names(&items), vec!["default", "team-a", "team-b", "team-c"]);
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts_regardless_of_payload() {
        let store = ResourceStore::empty();

        let first = ResourceRecord::new(ResourceKind::Pod, "nginx")
            .with_spec(serde_json::json!({"containers": [{"name": "a"}]}));
        store.create(ResourceKind::Pod, &first).await.unwrap();

        let second = ResourceRecord::new(ResourceKind::Pod, "nginx")
            .with_spec(serde_json::json!({"containers": [{"name": "b"}]}));
        let err = store.create(ResourceKind::Pod, &second).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
        assert_eq!(err.to_string(), "pod nginx already exists");

        // First write wins
        let stored = store.get(ResourceKind::Pod, "nginx").await.unwrap();
        assert_eq!(stored, serde_json::to_value(&first).unwrap());
    }

    #[tokio::test]
    async fn test_create_without_name_fails() {
        let store = ResourceStore::empty();

        let unnamed = ResourceRecord::new(ResourceKind::ConfigMap, "");
        let err = store
            .create(ResourceKind::ConfigMap, &unnamed)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NameRequired { .. }));
        assert_eq!(store.count(ResourceKind::ConfigMap).await, 0);
    }

    #[tokio::test]
    async fn test_names_are_flat_across_namespaces() {
        let store = ResourceStore::empty();

        let in_a = ResourceRecord::new(ResourceKind::Deployment, "web").with_namespace("team-a");
        let in_b = ResourceRecord::new(ResourceKind::Deployment, "web").with_namespace("team-b");

        store.create(ResourceKind::Deployment, &in_a).await.unwrap();
        let err = store
            .create(ResourceKind::Deployment, &in_b)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_partitions_are_independent() {
        let store = ResourceStore::empty();

        let deploy = ResourceRecord::new(ResourceKind::Deployment, "web");
        let rs = ResourceRecord::new(ResourceKind::ReplicaSet, "web");

        store.create(ResourceKind::Deployment, &deploy).await.unwrap();
        store.create(ResourceKind::ReplicaSet, &rs).await.unwrap();

        assert_eq!(store.count(ResourceKind::Deployment).await, 1);
        assert_eq!(store.count(ResourceKind::ReplicaSet).await, 1);
        assert_eq!(store.count(ResourceKind::Pod).await, 0);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = ResourceStore::new();

        assert!(store.get(ResourceKind::Namespace, "default").await.is_ok());

        let err = store
            .get(ResourceKind::Namespace, "team-a")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_listing_is_idempotent() {
        let store = ResourceStore::new();
        let cm = ResourceRecord::new(ResourceKind::ConfigMap, "settings")
            .with_data(serde_json::json!({"k": "v"}));
        store.create(ResourceKind::ConfigMap, &cm).await.unwrap();

        let first = store.list(ResourceKind::ConfigMap).await;
        let second = store.list(ResourceKind::ConfigMap).await;
        assert_eq!(first, second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_admit_exactly_one() {
        let store = Arc::new(ResourceStore::empty());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let pod = ResourceRecord::new(ResourceKind::Pod, "racer")
                        .with_spec(serde_json::json!({"attempt": i}));
                    store.create(ResourceKind::Pod, &pod).await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(StorageError::AlreadyExists { .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.count(ResourceKind::Pod).await, 1);
    }
}
