use crate::faults::{FaultInjector, ServiceOp};
use async_trait::async_trait;
use paddock_types::{ObjectStorage, ServiceResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Blob store keyed by `(bucket, path)`.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    faults: FaultInjector,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    pub async fn contains(&self, bucket: &str, path: &str) -> bool {
        let objects = self.objects.read().await;
        objects.contains_key(&(bucket.to_string(), path.to_string()))
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Paths stored in `bucket`, sorted.
    pub async fn paths(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut paths: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, path)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put_object(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> ServiceResult<()> {
        self.faults.check(ServiceOp::PutObject, bucket)?;
        let mut objects = self.objects.write().await;
        objects.insert((bucket.to_string(), path.to_string()), bytes);
        Ok(())
    }

    /// Deleting a missing object succeeds.
    async fn delete_object(&self, bucket: &str, path: &str) -> ServiceResult<()> {
        self.faults.check(ServiceOp::DeleteObject, bucket)?;
        let mut objects = self.objects.write().await;
        objects.remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }
}
