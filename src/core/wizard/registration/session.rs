#![allow(clippy::result_large_err)] // Session operations surface AppError codes to the UI layer.

use super::draft::{HorseDraft, HorsePatch, HorseProfile};
use super::steps::registration_steps;
use crate::core::config::WizardConfig;
use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, WizardMode};
use crate::core::wizard::allocation::{self, OwnershipAllocation};
use crate::core::wizard::commit::{CommitOrchestrator, CommitOutcome, RegistrationPlan};
use crate::core::wizard::draft::{AppliedPatch, DraftStore};
use crate::core::wizard::engine::{Progress, StepBlocked, StepEngine};
use crate::core::wizard::services::WizardServices;
use crate::core::wizard::staging::{ResourceStager, UploadFile, UploadReport};
use paddock_types::records::row_id;
use paddock_types::{Filter, OwnerKey};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Entity type used in owner keys for horse assets.
pub const ENTITY_TYPE: &str = "horse";

/// Existing entity whose name matches the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCandidate {
    pub id: Uuid,
    pub name: String,
    pub registration_number: Option<String>,
}

/// What was discarded by [`RegistrationWizard::close`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseReport {
    pub mode: WizardMode,
    pub discarded_patches: usize,
    /// Provisional key left with staged assets; the orphan reaper collects it.
    pub pending_orphans: Option<OwnerKey>,
}

/// One horse registration session, create or edit.
pub struct RegistrationWizard {
    services: WizardServices,
    config: WizardConfig,
    stager: ResourceStager,
    orchestrator: CommitOrchestrator,
    tenant_id: Uuid,
    mode: WizardMode,
    entity_id: Option<Uuid>,
    store: DraftStore<HorseDraft>,
    engine: StepEngine<HorseDraft>,
    open: bool,
}

impl std::fmt::Debug for RegistrationWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationWizard")
            .field("tenant_id", &self.tenant_id)
            .field("mode", &self.mode)
            .field("entity_id", &self.entity_id)
            .field("store", &self.store)
            .field("engine", &self.engine)
            .field("open", &self.open)
            .finish()
    }
}

impl RegistrationWizard {
    fn build(
        services: WizardServices,
        config: &WizardConfig,
        tenant_id: Uuid,
        mode: WizardMode,
        entity_id: Option<Uuid>,
    ) -> Result<Self, AppError> {
        let engine = StepEngine::new(registration_steps(mode)?);
        Ok(RegistrationWizard {
            stager: ResourceStager::new(services.clone(), config),
            orchestrator: CommitOrchestrator::new(services.clone(), config),
            store: DraftStore::new(services.ids.clone()),
            services,
            config: config.clone(),
            tenant_id,
            mode,
            entity_id,
            engine,
            open: true,
        })
    }

    /// Fresh create session with a newly minted provisional id.
    pub fn open_create(
        services: WizardServices,
        config: &WizardConfig,
        tenant_id: Uuid,
    ) -> Result<Self, AppError> {
        let wizard = Self::build(services, config, tenant_id, WizardMode::Create, None)?;
        tracing::info!(tenant = %tenant_id, provisional = %wizard.provisional_id(), "registration opened");
        Ok(wizard)
    }

    /// Edit session seeded from the stored row, its owners and its media.
    pub async fn open_edit(
        services: WizardServices,
        config: &WizardConfig,
        tenant_id: Uuid,
        entity_id: Uuid,
    ) -> Result<Self, AppError> {
        let mut wizard = Self::build(services, config, tenant_id, WizardMode::Edit, Some(entity_id))?;
        let seed = wizard.load_seed(entity_id).await?;
        wizard.store.reset(Some(seed));
        tracing::info!(tenant = %tenant_id, entity = %entity_id, "registration opened for edit");
        Ok(wizard)
    }

    async fn load_seed(&self, entity_id: Uuid) -> Result<HorseDraft, AppError> {
        let records = &self.services.records;
        let tables = &self.config.tables;
        let load_error = |e| {
            AppError::from_service(ErrorCategory::RecordServiceError, "failed to load horse", e)
                .with_code("WIZ-LOAD-001")
        };

        let filter = Filter::new()
            .eq("id", entity_id.to_string())
            .eq("tenant_id", self.tenant_id.to_string());
        let rows = records
            .list_where(&tables.horses, &filter)
            .await
            .map_err(load_error)?;
        let row = rows.first().ok_or_else(|| {
            AppError::new(
                ErrorCategory::RecordServiceError,
                format!("horse {} not found", entity_id),
            )
            .with_code("WIZ-LOAD-001")
        })?;
        let profile = HorseProfile::from_row(row)?;

        let owner_rows = records
            .list_where(
                &tables.horse_owners,
                &Filter::new().eq("horse_id", entity_id.to_string()),
            )
            .await
            .map_err(load_error)?;
        let allocations = owner_rows
            .into_iter()
            .map(|row| serde_json::from_value::<OwnershipAllocation>(Value::Object(row)))
            .collect::<Result<Vec<_>, _>>()?;

        let media = self.stager.list_assets(&self.staging_key_for(entity_id)).await?;

        Ok(HorseDraft {
            profile,
            allocations,
            media,
        })
    }

    /// Abandon the current session and start a new create session.
    pub fn reopen_create(&mut self) -> Result<(), AppError> {
        if self.mode != WizardMode::Create {
            self.engine = StepEngine::new(registration_steps(WizardMode::Create)?);
            self.mode = WizardMode::Create;
            self.entity_id = None;
        }
        self.store.reset(None);
        self.engine.rewind();
        self.open = true;
        tracing::info!(provisional = %self.provisional_id(), "registration reopened");
        Ok(())
    }

    pub fn draft(&self) -> &HorseDraft {
        self.store.draft()
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    pub fn entity_id(&self) -> Option<Uuid> {
        self.entity_id
    }

    pub fn provisional_id(&self) -> Uuid {
        self.store.provisional_id()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn history(&self) -> &[AppliedPatch<HorsePatch>] {
        self.store.history()
    }

    fn staging_key_for(&self, entity_id: Uuid) -> OwnerKey {
        OwnerKey::new(self.tenant_id, ENTITY_TYPE, entity_id)
    }

    /// Key for storage writes: the real id when editing, the provisional id otherwise.
    pub fn staging_key(&self) -> OwnerKey {
        self.staging_key_for(self.entity_id.unwrap_or_else(|| self.provisional_id()))
    }

    fn ensure_open(&self) -> Result<(), AppError> {
        if self.open {
            Ok(())
        } else {
            Err(AppError::new(ErrorCategory::NavigationError, "the wizard is closed")
                .with_code("WIZ-NAV-006"))
        }
    }

    /// Apply a profile field edit. Owners and media change only through their own operations.
    pub fn apply(&mut self, patch: HorsePatch) -> Result<(), AppError> {
        self.ensure_open()?;
        if patch.is_managed() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "owners and media cannot be patched directly",
            )
            .with_code("WIZ-DRAFT-001"));
        }
        self.store.patch(patch);
        Ok(())
    }

    /// Revert the latest field or owner edit. Uploads and removals are not undone.
    pub fn undo(&mut self) -> Result<Option<HorsePatch>, AppError> {
        self.ensure_open()?;
        Ok(self.store.undo())
    }

    fn set_allocations(
        &mut self,
        update: impl FnOnce(&[OwnershipAllocation]) -> Result<Vec<OwnershipAllocation>, allocation::AllocationError>,
    ) -> Result<(), AppError> {
        self.ensure_open()?;
        let next = update(&self.store.draft().allocations)?;
        self.store.patch(HorsePatch::Allocations(next));
        Ok(())
    }

    pub fn add_owner(&mut self, holder_id: Uuid) -> Result<(), AppError> {
        self.set_allocations(|list| allocation::add_holder(list, holder_id))
    }

    pub fn remove_owner(&mut self, index: usize) -> Result<(), AppError> {
        self.set_allocations(|list| allocation::remove_holder(list, index))
    }

    pub fn set_primary_owner(&mut self, index: usize) -> Result<(), AppError> {
        self.set_allocations(|list| allocation::set_primary(list, index))
    }

    pub fn set_owner_percentage(&mut self, index: usize, percentage: u8) -> Result<(), AppError> {
        self.set_allocations(|list| allocation::set_percentage(list, index, percentage))
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

    /// Same-tenant horses whose trimmed name matches the draft name, ignoring case.
    pub async fn find_possible_duplicates(&self) -> Result<Vec<DuplicateCandidate>, AppError> {
        let wanted = self.store.draft().profile.name.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .services
            .records
            .list_where(
                &self.config.tables.horses,
                &Filter::new().eq("tenant_id", self.tenant_id.to_string()),
            )
            .await
            .map_err(|e| {
                AppError::from_service(
                    ErrorCategory::RecordServiceError,
                    "duplicate lookup failed",
                    e,
                )
            })?;

        let mut candidates = Vec::new();
        for row in &rows {
            let Some(id) = row_id(row) else { continue };
            if Some(id) == self.entity_id {
                continue;
            }
            let name = row.get("name").and_then(Value::as_str).unwrap_or_default();
            if name.trim().to_lowercase() == wanted {
                candidates.push(DuplicateCandidate {
                    id,
                    name: name.to_string(),
                    registration_number: row
                        .get("registration_number")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }
        Ok(candidates)
    }

    /// Stage a batch of files under the session key and add the successes to the draft.
    pub async fn upload(&mut self, files: Vec<UploadFile>) -> Result<UploadReport, AppError> {
        self.ensure_open()?;
        let key = self.staging_key();
        let provisional = self.mode == WizardMode::Create;
        let report = self.stager.upload_batch(&key, provisional, files).await;
        if !report.uploaded.is_empty() {
            let mut media = self.store.draft().media.clone();
            media.extend(report.uploaded.iter().cloned());
            self.store.patch(HorsePatch::Media(media));
        }
        Ok(report)
    }

    pub async fn remove_media(&mut self, index: usize) -> Result<(), AppError> {
        self.ensure_open()?;
        let mut media = self.store.draft().media.clone();
        if index >= media.len() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!("media index {} is out of range for {} assets", index, media.len()),
            )
            .with_code("WIZ-STAGE-006"));
        }
        let key = self.staging_key();
        self.stager.remove_owned(&key, &media[index]).await?;
        media.remove(index);
        self.store.patch(HorsePatch::Media(media));
        Ok(())
    }

    /// Persist the draft. Allowed only from the final step.
    ///
    /// On success the draft is discarded and the wizard closes; on a fatal failure it stays
    /// open with the draft intact.
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

        let plan = RegistrationPlan {
            tenant_id: self.tenant_id,
            mode: self.mode,
            entity_id: self.entity_id,
            payload: draft.to_payload(self.tenant_id)?,
            staging_key: match self.mode {
                WizardMode::Create => Some(self.staging_key()),
                WizardMode::Edit => None,
            },
            allocations: draft.allocations.clone(),
        };
        let outcome = self.orchestrator.commit_registration(plan).await?;

        self.store.reset(None);
        self.engine.rewind();
        self.open = false;
        Ok(outcome)
    }

    /// Discard the draft without committing.
    ///
    /// In create mode the provisional key is reported when any asset is still staged under
    /// it. If the assets cannot be listed the key is reported anyway.
    pub async fn close(&mut self) -> CloseReport {
        let pending_orphans = match self.mode {
            WizardMode::Create => {
                let key = self.staging_key();
                match self.stager.list_assets(&key).await {
                    Ok(assets) if assets.is_empty() => None,
                    Ok(assets) => {
                        tracing::warn!(owner = %key, assets = assets.len(), "closing with staged assets");
                        Some(key)
                    }
                    Err(error) => {
                        tracing::warn!(owner = %key, code = %error.code, "staged assets unknown at close: {}", error.message);
                        Some(key)
                    }
                }
            }
            WizardMode::Edit => None,
        };
        let report = CloseReport {
            mode: self.mode,
            discarded_patches: self.store.history().len(),
            pending_orphans,
        };
        self.store.reset(None);
        self.engine.rewind();
        self.open = false;
        report
    }
}
