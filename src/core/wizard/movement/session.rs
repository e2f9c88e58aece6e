#![allow(clippy::result_large_err)] // Session operations surface AppError codes to the UI layer.

use super::draft::{HousingChoice, MovementDraft, MovementPatch, MovementType};
use super::housing::HousingPicker;
use super::steps::{self, movement_steps};
use crate::core::config::WizardConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::wizard::commit::{CommitOrchestrator, CommitOutcome, MovementPlan};
use crate::core::wizard::draft::DraftStore;
use crate::core::wizard::engine::{Progress, StepBlocked, StepEngine};
use crate::core::wizard::services::WizardServices;
use chrono::Utc;
use paddock_types::{HousingUnit, Row};
use serde_json::Value;
use uuid::Uuid;

/// Records a horse entering, leaving or moving between locations.
pub struct MovementWizard {
    services: WizardServices,
    config: WizardConfig,
    orchestrator: CommitOrchestrator,
    tenant_id: Uuid,
    store: DraftStore<MovementDraft>,
    engine: StepEngine<MovementDraft>,
    picker: HousingPicker,
    open: bool,
}

impl std::fmt::Debug for MovementWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementWizard")
            .field("tenant_id", &self.tenant_id)
            .field("store", &self.store)
            .field("engine", &self.engine)
            .field("open", &self.open)
            .finish()
    }
}

fn uuid_value(id: Option<Uuid>) -> Value {
    id.map(|id| Value::String(id.to_string())).unwrap_or(Value::Null)
}

fn text_value(text: Option<&str>) -> Value {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => Value::String(text.to_string()),
        _ => Value::Null,
    }
}

impl MovementWizard {
    pub fn open(services: WizardServices, config: &WizardConfig, tenant_id: Uuid) -> Result<Self, AppError> {
        Ok(MovementWizard {
            orchestrator: CommitOrchestrator::new(services.clone(), config),
            store: DraftStore::new(services.ids.clone()),
            engine: StepEngine::new(movement_steps()?),
            services,
            config: config.clone(),
            tenant_id,
            picker: HousingPicker::new(),
            open: true,
        })
    }

    pub fn draft(&self) -> &MovementDraft {
        self.store.draft()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> Result<(), AppError> {
        if self.open {
            Ok(())
        } else {
            Err(AppError::new(ErrorCategory::NavigationError, "the wizard is closed")
                .with_code("WIZ-NAV-006"))
        }
    }

    /// Apply a field edit.
    ///
    /// Housing changes only through [`Self::select_housing`] and [`Self::skip_housing`]. A new
    /// destination or an outgoing type resets an assigned unit to undecided within the same
    /// history entry, so one undo restores both.
    pub fn apply(&mut self, patch: MovementPatch) -> Result<(), AppError> {
        self.ensure_open()?;
        if matches!(patch, MovementPatch::Housing(_)) {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "housing is chosen through the housing picker",
            )
            .with_code("WIZ-HOUSING-003"));
        }
        let draft = self.store.draft();
        let invalidates_housing = match &patch {
            MovementPatch::ToLocationId(to) => *to != draft.to_location_id,
            MovementPatch::MovementType(kind) => *kind == Some(MovementType::Out),
            _ => false,
        };
        let follow_ups = if invalidates_housing && matches!(draft.housing, HousingChoice::Assigned(_)) {
            vec![MovementPatch::Housing(HousingChoice::Undecided)]
        } else {
            Vec::new()
        };
        self.store.patch_linked(patch, follow_ups);
        if invalidates_housing {
            self.picker.clear();
        }
        Ok(())
    }

    pub fn undo(&mut self) -> Result<Option<MovementPatch>, AppError> {
        self.ensure_open()?;
        let undone = self.store.undo();
        if self.picker.location_id().is_some()
            && self.picker.location_id() != self.store.draft().to_location_id
        {
            self.picker.clear();
        }
        Ok(undone)
    }

    pub fn current_step(&self) -> &'static str {
        self.engine.current_step(self.store.draft())
    }

    pub fn effective_steps(&self) -> Vec<&'static str> {
        self.engine.graph().effective_names(self.store.draft())
    }

    pub fn progress(&self) -> Progress {
        self.engine.progress(self.store.draft())
    }

    pub fn is_terminal(&self) -> bool {
        self.engine.is_terminal(self.store.draft())
    }

    pub fn blocked(&self) -> Option<StepBlocked> {
        self.engine.blocked(self.store.draft())
    }

    pub fn next(&mut self) -> Result<&'static str, AppError> {
        self.ensure_open()?;
        self.engine.next(self.store.draft())
    }

    pub fn back(&mut self) -> Result<&'static str, AppError> {
        self.ensure_open()?;
        self.engine.back(self.store.draft())
    }

    pub fn go_to(&mut self, step: &str) -> Result<&'static str, AppError> {
        self.ensure_open()?;
        self.engine.go_to(step, self.store.draft())
    }

    /// Load the housing units of the chosen destination.
    pub async fn load_housing(&mut self) -> Result<&[HousingUnit], AppError> {
        self.ensure_open()?;
        let location_id = self.store.draft().to_location_id.ok_or_else(|| {
            AppError::new(
                ErrorCategory::ValidationError,
                "choose a destination before picking housing",
            )
            .with_code("WIZ-HOUSING-003")
        })?;
        self.picker
            .load(
                self.services.records.as_ref(),
                &self.config.tables.housing_units,
                location_id,
            )
            .await?;
        Ok(self.picker.units())
    }

    pub fn selectable_housing(&self) -> Vec<&HousingUnit> {
        self.picker.selectable()
    }

    pub fn select_housing(&mut self, unit_id: Uuid) -> Result<(), AppError> {
        self.ensure_open()?;
        let unit_id = self.picker.select(unit_id)?.id;
        self.store
            .patch(MovementPatch::Housing(HousingChoice::Assigned(unit_id)));
        Ok(())
    }

    /// Explicitly decline housing and move past the housing step.
    pub fn skip_housing(&mut self) -> Result<&'static str, AppError> {
        self.ensure_open()?;
        if self.current_step() != steps::HOUSING {
            return Err(AppError::new(
                ErrorCategory::NavigationError,
                "housing can only be skipped from the housing step",
            )
            .with_code("WIZ-HOUSING-003"));
        }
        self.store.patch(MovementPatch::Housing(HousingChoice::Skipped));
        self.engine.next(self.store.draft())
    }

    /// Reload the destination's units and confirm an assigned unit can still take the subject.
    async fn verify_housing(&mut self) -> Result<(), AppError> {
        let draft = self.store.draft();
        let HousingChoice::Assigned(unit_id) = draft.housing else {
            return Ok(());
        };
        if draft.movement_type == Some(MovementType::Out) {
            return Ok(());
        }
        let location_id = draft.to_location_id.ok_or_else(|| {
            AppError::new(
                ErrorCategory::CommitError,
                "an assigned housing unit needs a destination",
            )
            .with_code("WIZ-HOUSING-003")
        })?;
        self.picker
            .load(
                self.services.records.as_ref(),
                &self.config.tables.housing_units,
                location_id,
            )
            .await?;
        self.picker.select(unit_id)?;
        Ok(())
    }

    fn plan(&self) -> Result<MovementPlan, AppError> {
        let draft = self.store.draft();
        let (kind, subject_id) = match (draft.movement_type, draft.subject_id) {
            (Some(kind), Some(subject_id)) => (kind, subject_id),
            _ => {
                return Err(AppError::new(
                    ErrorCategory::CommitError,
                    "movement type and subject are required",
                )
                .with_code("WIZ-COMMIT-001"))
            }
        };
        let (housing_unit_id, housing_status) = match kind {
            MovementType::Out => (None, Value::Null),
            _ => (
                draft.housing.unit_id(),
                Value::String(draft.housing.status().to_string()),
            ),
        };
        let to_location_id = match kind {
            MovementType::Out => None,
            _ => draft.to_location_id,
        };

        let mut movement = Row::new();
        movement.insert("tenant_id".to_string(), Value::String(self.tenant_id.to_string()));
        movement.insert("horse_id".to_string(), Value::String(subject_id.to_string()));
        movement.insert("movement_type".to_string(), Value::String(kind.as_str().to_string()));
        movement.insert("from_location_id".to_string(), uuid_value(draft.from_location_id));
        movement.insert("to_location_id".to_string(), uuid_value(to_location_id));
        movement.insert("housing_unit_id".to_string(), uuid_value(housing_unit_id));
        movement.insert("housing_status".to_string(), housing_status);
        movement.insert("justification".to_string(), text_value(Some(draft.justification.as_str())));
        movement.insert("reason".to_string(), text_value(draft.reason.as_deref()));
        movement.insert("notes".to_string(), text_value(draft.notes.as_deref()));
        movement.insert(
            "moved_at".to_string(),
            Value::String(draft.moved_at.unwrap_or_else(Utc::now).to_rfc3339()),
        );

        let mut subject_patch = Row::new();
        subject_patch.insert("location_id".to_string(), uuid_value(to_location_id));
        subject_patch.insert("housing_unit_id".to_string(), uuid_value(housing_unit_id));

        Ok(MovementPlan {
            movement,
            subject_id,
            subject_patch,
        })
    }

    /// Persist the movement from the final step, then close.
    pub async fn commit(&mut self) -> Result<CommitOutcome, AppError> {
        if !self.open {
            return Err(AppError::new(ErrorCategory::CommitError, "the wizard is closed")
                .with_code("WIZ-COMMIT-003"));
        }
        let draft = self.store.draft();
        if !self.engine.is_terminal(draft) {
            return Err(AppError::new(
                ErrorCategory::CommitError,
                format!("commit is only available from the final step, not '{}'", self.current_step()),
            )
            .with_code("WIZ-COMMIT-001"));
        }
        for step in self.engine.graph().effective_steps(draft) {
            if let Err(blocked) = step.check(draft) {
                return Err(AppError::new(ErrorCategory::CommitError, blocked.to_string())
                    .with_code("WIZ-COMMIT-001")
                    .with_context(blocked.step));
            }
        }

        self.verify_housing().await?;
        let outcome = self.orchestrator.commit_movement(self.plan()?).await?;
        self.close();
        Ok(outcome)
    }

    pub fn close(&mut self) {
        self.store.reset(None);
        self.engine.rewind();
        self.picker.clear();
        self.open = false;
    }
}
