#![allow(clippy::result_large_err)] // Only the mandatory step fails with AppError; the rest degrade to warnings.

//! Commit pipelines.
//!
//! Each pipeline has one mandatory step (writing the parent row) followed by optional steps
//! whose failures are collected as [`CommitWarning`]s. Callers receive an explicit
//! [`CommitOutcome`] and must decide how to show a degraded commit.

use super::allocation::OwnershipAllocation;
use super::services::WizardServices;
use super::staging::ResourceStager;
use crate::core::config::{TablesConfig, WizardConfig};
use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, WizardMode};
use paddock_types::{Filter, OwnerKey, Row};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// An optional commit step that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommitWarning {
    /// Staged assets are still keyed by the provisional id.
    MigrationFailed {
        from: OwnerKey,
        to: Uuid,
        message: String,
    },
    /// Previous ownership rows could not be cleared, so new ones were not inserted.
    OwnershipClearFailed { message: String },
    OwnershipInsertFailed {
        inserted: usize,
        expected: usize,
        message: String,
    },
    SubjectUpdateFailed { subject_id: Uuid, message: String },
}

impl CommitWarning {
    pub fn code(&self) -> &'static str {
        match self {
            CommitWarning::MigrationFailed { .. } => "WIZ-STAGE-005",
            CommitWarning::OwnershipClearFailed { .. } => "WIZ-COMMIT-004",
            CommitWarning::OwnershipInsertFailed { .. } => "WIZ-COMMIT-005",
            CommitWarning::SubjectUpdateFailed { .. } => "WIZ-COMMIT-006",
        }
    }
}

impl fmt::Display for CommitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitWarning::MigrationFailed { from, to, message } => write!(
                f,
                "assets under {} were not moved to {}: {}",
                from, to, message
            ),
            CommitWarning::OwnershipClearFailed { message } => {
                write!(f, "previous owners were not cleared: {}", message)
            }
            CommitWarning::OwnershipInsertFailed {
                inserted,
                expected,
                message,
            } => write!(
                f,
                "saved {} of {} owners: {}",
                inserted, expected, message
            ),
            CommitWarning::SubjectUpdateFailed {
                subject_id,
                message,
            } => write!(f, "subject {} was not updated: {}", subject_id, message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedEntity {
    pub id: Uuid,
    pub mode: WizardMode,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed {
        entity: CommittedEntity,
    },
    CommittedWithWarnings {
        entity: CommittedEntity,
        warnings: Vec<CommitWarning>,
    },
}

impl CommitOutcome {
    fn from_parts(entity: CommittedEntity, warnings: Vec<CommitWarning>) -> Self {
        if warnings.is_empty() {
            CommitOutcome::Committed { entity }
        } else {
            CommitOutcome::CommittedWithWarnings { entity, warnings }
        }
    }

    pub fn entity(&self) -> &CommittedEntity {
        match self {
            CommitOutcome::Committed { entity } => entity,
            CommitOutcome::CommittedWithWarnings { entity, .. } => entity,
        }
    }

    pub fn warnings(&self) -> &[CommitWarning] {
        match self {
            CommitOutcome::Committed { .. } => &[],
            CommitOutcome::CommittedWithWarnings { warnings, .. } => warnings,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }
}

/// Everything needed to persist a registration draft.
#[derive(Debug, Clone)]
pub struct RegistrationPlan {
    pub tenant_id: Uuid,
    pub mode: WizardMode,
    /// Real id of the entity being edited; `None` in create mode.
    pub entity_id: Option<Uuid>,
    pub payload: Row,
    /// Provisional owner key whose assets move to the new id after a create.
    pub staging_key: Option<OwnerKey>,
    pub allocations: Vec<OwnershipAllocation>,
}

#[derive(Debug, Clone)]
pub struct MovementPlan {
    pub movement: Row,
    pub subject_id: Uuid,
    pub subject_patch: Row,
}

pub struct CommitOrchestrator {
    services: WizardServices,
    stager: ResourceStager,
    tables: TablesConfig,
}

impl CommitOrchestrator {
    pub fn new(services: WizardServices, config: &WizardConfig) -> Self {
        CommitOrchestrator {
            stager: ResourceStager::new(services.clone(), config),
            services,
            tables: config.tables.clone(),
        }
    }

    pub async fn commit_registration(&self, plan: RegistrationPlan) -> Result<CommitOutcome, AppError> {
        let table = self.tables.horses.clone();
        let id = match self.upsert_parent(&table, &plan).await {
            Ok(id) => id,
            Err(error) => {
                self.services.reporter.report_error(&error);
                return Err(error);
            }
        };

        let mut warnings = Vec::new();

        if plan.mode == WizardMode::Create {
            if let Some(key) = &plan.staging_key {
                if let Err(error) = self.stager.migrate(key, id).await {
                    warnings.push(CommitWarning::MigrationFailed {
                        from: key.clone(),
                        to: id,
                        message: error.message,
                    });
                }
            }
        }

        if let Some(warning) = self.replace_owners(&plan, id).await {
            warnings.push(warning);
        }

        for warning in &warnings {
            self.services
                .reporter
                .report_warning(&warning.to_string(), Some(warning.code().to_string()));
        }
        tracing::info!(%id, mode = %plan.mode, warnings = warnings.len(), "registration committed");

        Ok(CommitOutcome::from_parts(
            CommittedEntity {
                id,
                mode: plan.mode,
                table,
            },
            warnings,
        ))
    }

    async fn upsert_parent(&self, table: &str, plan: &RegistrationPlan) -> Result<Uuid, AppError> {
        match (plan.mode, plan.entity_id) {
            (WizardMode::Create, _) => {
                let created = self
                    .services
                    .records
                    .create(table, plan.payload.clone())
                    .await
                    .map_err(|e| {
                        AppError::from_service(ErrorCategory::CommitError, "failed to create entity", e)
                            .with_code("WIZ-COMMIT-002")
                    })?;
                Ok(created.id)
            }
            (WizardMode::Edit, Some(id)) => {
                self.services
                    .records
                    .update(table, id, plan.payload.clone())
                    .await
                    .map_err(|e| {
                        AppError::from_service(ErrorCategory::CommitError, "failed to update entity", e)
                            .with_code("WIZ-COMMIT-002")
                            .with_context(id.to_string())
                    })?;
                Ok(id)
            }
            (WizardMode::Edit, None) => Err(AppError::new(
                ErrorCategory::InternalError,
                "edit commit without an entity id",
            )
            .with_code("WIZ-COMMIT-002")),
        }
    }

    /// Replace the ownership rows of `horse_id`. Returns the warning for a degraded step.
    async fn replace_owners(&self, plan: &RegistrationPlan, horse_id: Uuid) -> Option<CommitWarning> {
        let table = &self.tables.horse_owners;
        if plan.mode == WizardMode::Edit {
            let filter = Filter::new().eq("horse_id", horse_id.to_string());
            if let Err(error) = self.services.records.delete_where(table, &filter).await {
                return Some(CommitWarning::OwnershipClearFailed {
                    message: error.to_string(),
                });
            }
        }

        let expected = plan.allocations.len();
        for (inserted, allocation) in plan.allocations.iter().enumerate() {
            let row = owner_row(plan.tenant_id, horse_id, allocation);
            if let Err(error) = self.services.records.create(table, row).await {
                return Some(CommitWarning::OwnershipInsertFailed {
                    inserted,
                    expected,
                    message: error.to_string(),
                });
            }
        }
        None
    }

    pub async fn commit_movement(&self, plan: MovementPlan) -> Result<CommitOutcome, AppError> {
        let table = self.tables.horse_movements.clone();
        let created = match self.services.records.create(&table, plan.movement).await {
            Ok(created) => created,
            Err(e) => {
                let error = AppError::from_service(
                    ErrorCategory::CommitError,
                    "failed to record movement",
                    e,
                )
                .with_code("WIZ-COMMIT-002");
                self.services.reporter.report_error(&error);
                return Err(error);
            }
        };

        let mut warnings = Vec::new();
        if let Err(error) = self
            .services
            .records
            .update(&self.tables.horses, plan.subject_id, plan.subject_patch)
            .await
        {
            let warning = CommitWarning::SubjectUpdateFailed {
                subject_id: plan.subject_id,
                message: error.to_string(),
            };
            self.services
                .reporter
                .report_warning(&warning.to_string(), Some(warning.code().to_string()));
            warnings.push(warning);
        }

        tracing::info!(id = %created.id, subject = %plan.subject_id, "movement committed");
        Ok(CommitOutcome::from_parts(
            CommittedEntity {
                id: created.id,
                mode: WizardMode::Create,
                table,
            },
            warnings,
        ))
    }
}

fn owner_row(tenant_id: Uuid, horse_id: Uuid, allocation: &OwnershipAllocation) -> Row {
    let mut row = Row::new();
    row.insert("horse_id".to_string(), Value::String(horse_id.to_string()));
    row.insert("tenant_id".to_string(), Value::String(tenant_id.to_string()));
    row.insert(
        "holder_id".to_string(),
        Value::String(allocation.holder_id.to_string()),
    );
    row.insert(
        "percentage".to_string(),
        Value::from(allocation.percentage),
    );
    row.insert("is_primary".to_string(), Value::Bool(allocation.is_primary));
    row
}
