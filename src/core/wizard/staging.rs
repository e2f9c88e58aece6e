#![allow(clippy::result_large_err)] // Staging failures carry their WIZ-STAGE code through AppError.

//! Resource staging: attach files to an entity before it has a permanent identifier.
//!
//! Blobs are written under an owner key `(tenant, entity type, entity id)`. During a create
//! session the entity id is provisional and every metadata row is flagged `provisional`;
//! [`ResourceStager::migrate`] re-keys those rows once the parent exists. Rows that are never
//! migrated are collected by [`ResourceStager::reap_orphans`].

use super::services::WizardServices;
use crate::core::config::WizardConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use chrono::{DateTime, Utc};
use paddock_types::{Filter, MediaAssetRef, MediaMetadataRow, OwnerKey, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// A file selected by the user, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new<F: Into<String>, M: Into<String>>(filename: F, mime_type: M, bytes: Vec<u8>) -> Self {
        UploadFile {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// A file skipped within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRejection {
    pub filename: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<MediaAssetRef>,
    pub rejected: Vec<UploadRejection>,
}

impl UploadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub from: OwnerKey,
    pub to: Uuid,
    pub migrated: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReapReport {
    pub reaped: Vec<MediaAssetRef>,
    pub failed: Vec<UploadRejection>,
    pub skipped_active: usize,
}

/// Storage path for a blob: `{tenant}/{entity type}/{entity id}/{blob id}.{ext}`.
///
/// The extension is the original file's, lowercased; files without one get a bare blob id.
pub fn object_path(key: &OwnerKey, blob_id: Uuid, filename: &str) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase());
    match extension {
        Some(ext) => format!("{}/{}.{}", key, blob_id, ext),
        None => format!("{}/{}", key, blob_id),
    }
}

fn owner_filter(key: &OwnerKey) -> Filter {
    Filter::new()
        .eq("tenant_id", key.tenant_id.to_string())
        .eq("entity_type", key.entity_type.clone())
        .eq("entity_id", key.entity_id.to_string())
}

pub struct ResourceStager {
    services: WizardServices,
    config: WizardConfig,
}

impl ResourceStager {
    pub fn new(services: WizardServices, config: &WizardConfig) -> Self {
        ResourceStager {
            services,
            config: config.clone(),
        }
    }

    fn media_table(&self) -> &str {
        &self.config.tables.media_assets
    }

    fn bucket(&self) -> &str {
        &self.config.storage.bucket
    }

    /// Reject a file before anything is written.
    pub fn validate_file(&self, file: &UploadFile) -> Result<(), AppError> {
        let storage = &self.config.storage;
        if !storage.accepts_mime(&file.mime_type) {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!("'{}' has unsupported type {}", file.filename, file.mime_type),
            )
            .with_code("WIZ-STAGE-001"));
        }
        if file.bytes.is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!("'{}' is empty", file.filename),
            )
            .with_code("WIZ-STAGE-007"));
        }
        let size = file.bytes.len() as u64;
        if size > storage.max_upload_bytes {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!(
                    "'{}' is {} bytes, limit is {}",
                    file.filename, size, storage.max_upload_bytes
                ),
            )
            .with_code("WIZ-STAGE-002"));
        }
        Ok(())
    }

    /// Upload files one at a time in order. A failing file is reported and skipped.
    pub async fn upload_batch(
        &self,
        key: &OwnerKey,
        provisional: bool,
        files: Vec<UploadFile>,
    ) -> UploadReport {
        let mut report = UploadReport::default();
        for file in files {
            let filename = file.filename.clone();
            match self.upload_one(key, provisional, file).await {
                Ok(asset) => report.uploaded.push(asset),
                Err(error) => {
                    tracing::warn!(code = %error.code, file = %filename, "upload skipped: {}", error.message);
                    report.rejected.push(UploadRejection {
                        filename,
                        code: error.code,
                        message: error.message,
                    });
                }
            }
        }
        tracing::info!(
            owner = %key,
            uploaded = report.uploaded.len(),
            rejected = report.rejected.len(),
            "upload batch finished"
        );
        report
    }

    /// Write the blob, then its metadata row. A failed row insert deletes the blob again.
    pub async fn upload_one(
        &self,
        key: &OwnerKey,
        provisional: bool,
        file: UploadFile,
    ) -> Result<MediaAssetRef, AppError> {
        self.validate_file(&file)?;

        let blob_id = self.services.ids.new_id();
        let path = object_path(key, blob_id, &file.filename);
        let metadata = MediaMetadataRow {
            id: blob_id,
            tenant_id: key.tenant_id,
            entity_type: key.entity_type.clone(),
            entity_id: key.entity_id,
            storage_path: path.clone(),
            bucket: self.bucket().to_string(),
            filename: file.filename,
            mime_type: file.mime_type,
            size_bytes: file.bytes.len() as u64,
            provisional,
            created_at: Utc::now(),
        };
        let row = metadata.to_row()?;

        self.services
            .storage
            .put_object(self.bucket(), &path, file.bytes)
            .await
            .map_err(|e| {
                AppError::from_service(ErrorCategory::StorageError, "blob upload failed", e)
                    .with_code("WIZ-STAGE-003")
                    .with_context(path.clone())
            })?;

        if let Err(insert_error) = self.services.records.create(self.media_table(), row).await {
            if let Err(delete_error) = self.services.storage.delete_object(self.bucket(), &path).await {
                tracing::error!(
                    path = %path,
                    "failed to delete blob after metadata insert failure: {}",
                    delete_error
                );
            }
            return Err(AppError::from_service(
                ErrorCategory::StagingError,
                "metadata insert failed, blob removed",
                insert_error,
            )
            .with_code("WIZ-STAGE-004")
            .with_context(path));
        }

        tracing::debug!(owner = %key, path = %path, "asset staged");
        Ok(metadata.asset_ref())
    }

    pub async fn list_assets(&self, key: &OwnerKey) -> Result<Vec<MediaAssetRef>, AppError> {
        let rows = self.list_rows(owner_filter(key)).await?;
        Ok(rows.iter().map(MediaMetadataRow::asset_ref).collect())
    }

    async fn list_rows(&self, filter: Filter) -> Result<Vec<MediaMetadataRow>, AppError> {
        let rows = self
            .services
            .records
            .list_where(self.media_table(), &filter)
            .await
            .map_err(|e| {
                AppError::from_service(
                    ErrorCategory::RecordServiceError,
                    "failed to list media assets",
                    e,
                )
            })?;
        rows.iter()
            .map(|row| MediaMetadataRow::from_row(row).map_err(AppError::from))
            .collect()
    }

    /// Re-key every row under `from` to `to`. Rows already moved are untouched, so
    /// re-running after a partial failure converges.
    pub async fn migrate(&self, from: &OwnerKey, to: Uuid) -> Result<MigrationReport, AppError> {
        let mut patch = Row::new();
        patch.insert("entity_id".to_string(), Value::String(to.to_string()));
        patch.insert("provisional".to_string(), Value::Bool(false));

        let migrated = self
            .services
            .records
            .update_where(self.media_table(), &owner_filter(from), patch)
            .await
            .map_err(|e| {
                AppError::from_service(ErrorCategory::StagingError, "asset migration failed", e)
                    .with_code("WIZ-STAGE-005")
                    .with_context(from.to_string())
            })?;

        tracing::info!(from = %from, to = %to, migrated, "staged assets migrated");
        Ok(MigrationReport {
            from: from.clone(),
            to,
            migrated,
        })
    }

    /// Delete the blob, then its metadata row.
    ///
    /// When the blob delete fails the row is left alone. Deleting an already-missing blob
    /// succeeds, so repeating a half-finished removal completes it.
    pub async fn remove(&self, asset: &MediaAssetRef) -> Result<(), AppError> {
        self.services
            .storage
            .delete_object(&asset.bucket, &asset.storage_path)
            .await
            .map_err(|e| {
                AppError::from_service(ErrorCategory::StorageError, "blob delete failed", e)
                    .with_code("WIZ-STAGE-006")
                    .with_context(asset.storage_path.clone())
            })?;

        self.services
            .records
            .delete_where(
                self.media_table(),
                &Filter::new().eq("id", asset.id.to_string()),
            )
            .await
            .map_err(|e| {
                AppError::from_service(
                    ErrorCategory::RecordServiceError,
                    "metadata delete failed",
                    e,
                )
                .with_code("WIZ-STAGE-006")
                .with_context(asset.storage_path.clone())
            })?;

        tracing::debug!(path = %asset.storage_path, "asset removed");
        Ok(())
    }

    /// Remove an asset only if its stored row belongs to `key`.
    ///
    /// The stored row supplies the bucket and path, so a read-model copy cannot point the
    /// delete at another owner's blob.
    pub async fn remove_owned(&self, key: &OwnerKey, asset: &MediaAssetRef) -> Result<(), AppError> {
        let rows = self
            .list_rows(owner_filter(key).eq("id", asset.id.to_string()))
            .await?;
        let Some(row) = rows.first() else {
            return Err(AppError::new(
                ErrorCategory::StagingError,
                format!("asset {} is not staged under {}", asset.id, key),
            )
            .with_code("WIZ-STAGE-008")
            .with_context(asset.storage_path.clone()));
        };
        self.remove(&row.asset_ref()).await
    }

    /// Remove provisional assets older than the configured TTL.
    ///
    /// Rows whose entity id is listed in `active` belong to a session still in progress and
    /// are skipped.
    pub async fn reap_orphans(
        &self,
        tenant_id: Uuid,
        entity_type: &str,
        now: DateTime<Utc>,
        active: &HashSet<Uuid>,
    ) -> Result<ReapReport, AppError> {
        let filter = Filter::new()
            .eq("tenant_id", tenant_id.to_string())
            .eq("entity_type", entity_type)
            .eq("provisional", true);
        let cutoff = now - self.config.storage.orphan_ttl();

        let mut report = ReapReport::default();
        for row in self.list_rows(filter).await? {
            if row.created_at > cutoff {
                continue;
            }
            if active.contains(&row.entity_id) {
                report.skipped_active += 1;
                continue;
            }
            let asset = row.asset_ref();
            match self.remove(&asset).await {
                Ok(()) => report.reaped.push(asset),
                Err(error) => report.failed.push(UploadRejection {
                    filename: asset.filename,
                    code: error.code,
                    message: error.message,
                }),
            }
        }

        if !report.reaped.is_empty() || !report.failed.is_empty() {
            tracing::info!(
                tenant = %tenant_id,
                entity_type,
                reaped = report.reaped.len(),
                failed = report.failed.len(),
                "orphaned assets reaped"
            );
        }
        Ok(report)
    }
}
