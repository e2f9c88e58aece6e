use crate::faults::{FaultInjector, ServiceOp};
use crate::ids::RandomIds;
use async_trait::async_trait;
use indexmap::IndexMap;
use paddock_types::records::row_id;
use paddock_types::{Created, Filter, IdGenerator, RecordService, Row, ServiceError, ServiceResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

type Table = IndexMap<Uuid, Row>;

/// Record service holding every table in memory, rows kept in insertion order.
pub struct MemoryRecordService {
    tables: RwLock<HashMap<String, Table>>,
    faults: FaultInjector,
    ids: Arc<dyn IdGenerator>,
}

impl fmt::Debug for MemoryRecordService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRecordService")
            .field("tables", &self.tables)
            .field("faults", &self.faults)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryRecordService {
    fn default() -> Self {
        Self::with_ids(Arc::new(RandomIds))
    }
}

impl MemoryRecordService {
    /// Service minting random ids for rows created without one.
    pub fn new() -> Self {
        Self::default()
    }

    /// Service minting ids for rows created without one from `ids`.
    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        MemoryRecordService {
            tables: RwLock::new(HashMap::new()),
            faults: FaultInjector::default(),
            ids,
        }
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Snapshot of every row in `table`.
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.read().await;
        tables
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn count(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table).map(IndexMap::len).unwrap_or(0)
    }

    pub async fn get(&self, table: &str, id: Uuid) -> Option<Row> {
        let tables = self.tables.read().await;
        tables.get(table).and_then(|rows| rows.get(&id)).cloned()
    }
}

#[async_trait]
impl RecordService for MemoryRecordService {
    async fn create(&self, table: &str, mut payload: Row) -> ServiceResult<Created> {
        self.faults.check(ServiceOp::Create, table)?;
        let id = match payload.get("id") {
            None | Some(Value::Null) => self.ids.new_id(),
            Some(_) => row_id(&payload).ok_or_else(|| ServiceError::Malformed {
                table: table.to_string(),
                reason: "id is not a uuid".to_string(),
            })?,
        };
        payload.insert("id".to_string(), Value::String(id.to_string()));

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        if rows.contains_key(&id) {
            return Err(ServiceError::Rejected(format!(
                "duplicate id {} in {}",
                id, table
            )));
        }
        rows.insert(id, payload);
        tracing::debug!(table, %id, "memory record created");
        Ok(Created { id })
    }

    async fn update(&self, table: &str, id: Uuid, payload: Row) -> ServiceResult<()> {
        self.faults.check(ServiceOp::Update, table)?;
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(&id))
            .ok_or_else(|| ServiceError::NotFound {
                table: table.to_string(),
                id,
            })?;
        for (field, value) in payload {
            if field == "id" {
                continue;
            }
            row.insert(field, value);
        }
        Ok(())
    }

    async fn delete_where(&self, table: &str, filter: &Filter) -> ServiceResult<usize> {
        self.faults.check(ServiceOp::DeleteWhere, table)?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|_, row| !filter.matches(row));
        Ok(before - rows.len())
    }

    async fn list_where(&self, table: &str, filter: &Filter) -> ServiceResult<Vec<Row>> {
        self.faults.check(ServiceOp::ListWhere, table)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
