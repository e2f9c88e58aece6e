use crate::records::Row;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Scope under which staged assets are stored: `(tenant, entity type, entity id)`.
///
/// During a creation session `entity_id` is the provisional identifier; after the parent
/// entity is committed it is the real identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerKey {
    pub tenant_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
}

impl OwnerKey {
    pub fn new<T: Into<String>>(tenant_id: Uuid, entity_type: T, entity_id: Uuid) -> Self {
        Self {
            tenant_id,
            entity_type: entity_type.into(),
            entity_id,
        }
    }

    /// Same tenant and entity type, different entity id.
    pub fn rekeyed(&self, entity_id: Uuid) -> Self {
        Self {
            tenant_id: self.tenant_id,
            entity_type: self.entity_type.clone(),
            entity_id,
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.entity_type, self.entity_id)
    }
}

/// Read model of an uploaded binary, as held by a draft for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAssetRef {
    pub id: Uuid,
    pub storage_path: String,
    pub bucket: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Full metadata row persisted in the media table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadataRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub storage_path: String,
    pub bucket: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Set while the row is keyed by a provisional identifier.
    #[serde(default)]
    pub provisional: bool,
    pub created_at: DateTime<Utc>,
}

impl MediaMetadataRow {
    pub fn owner_key(&self) -> OwnerKey {
        OwnerKey::new(self.tenant_id, self.entity_type.clone(), self.entity_id)
    }

    pub fn asset_ref(&self) -> MediaAssetRef {
        MediaAssetRef {
            id: self.id,
            storage_path: self.storage_path.clone(),
            bucket: self.bucket.clone(),
            filename: self.filename.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
        }
    }

    pub fn to_row(&self) -> Result<Row, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "media metadata serialized to non-object value: {}",
                other
            ))),
        }
    }

    pub fn from_row(row: &Row) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(row.clone()))
    }
}
