//! Collaborator contracts consumed by the wizard core.
//!
//! The core never dictates how records or blobs are stored; it only needs these operations.

use crate::records::{row_id, Created, Filter, Row};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a record or object storage service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{table} row {id} not found")]
    NotFound { table: String, id: Uuid },

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed row in {table}: {reason}")]
    Malformed { table: String, reason: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Relational record store.
#[async_trait]
pub trait RecordService: Send + Sync + 'static {
    /// Insert a row and return its identifier. A payload `id` is honored when present.
    async fn create(&self, table: &str, payload: Row) -> ServiceResult<Created>;

    /// Merge `payload` into the row with the given id.
    async fn update(&self, table: &str, id: Uuid, payload: Row) -> ServiceResult<()>;

    /// Delete every matching row, returning how many were removed.
    async fn delete_where(&self, table: &str, filter: &Filter) -> ServiceResult<usize>;

    async fn list_where(&self, table: &str, filter: &Filter) -> ServiceResult<Vec<Row>>;

    /// Merge `patch` into every matching row.
    ///
    /// The default lists then updates row by row, stopping at the first failure; rows already
    /// updated stay updated, so re-running converges.
    async fn update_where(&self, table: &str, filter: &Filter, patch: Row) -> ServiceResult<usize> {
        let rows = self.list_where(table, filter).await?;
        let mut updated = 0;
        for row in rows {
            let id = row_id(&row).ok_or_else(|| ServiceError::Malformed {
                table: table.to_string(),
                reason: "row has no uuid id".to_string(),
            })?;
            self.update(table, id, patch.clone()).await?;
            updated += 1;
        }
        Ok(updated)
    }
}

/// Blob store addressed by bucket and path.
#[async_trait]
pub trait ObjectStorage: Send + Sync + 'static {
    async fn put_object(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> ServiceResult<()>;

    async fn delete_object(&self, bucket: &str, path: &str) -> ServiceResult<()>;
}

/// Source of opaque identifiers for provisional keys and blob names.
pub trait IdGenerator: Send + Sync + 'static {
    fn new_id(&self) -> Uuid;
}
