//! Scripted registration sessions against the in-memory backend.

use crate::core::config::WizardConfig;
use crate::core::error::AppError;
use crate::core::wizard::commit::CommitOutcome;
use crate::core::wizard::engine::Progress;
use crate::core::wizard::registration::{HorsePatch, RegistrationWizard};
use crate::core::wizard::services::WizardServices;
use crate::core::wizard::staging::UploadFile;
use crate::Result;
use anyhow::anyhow;
use paddock_backend::{MemoryObjectStorage, MemoryRecordService, SequentialIds, ServiceOp};
use paddock_types::{IdGenerator, RecordService, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    pub tenant_id: Uuid,
    /// Rows inserted into the horses table before the session opens.
    #[serde(default)]
    pub existing_horses: Vec<Row>,
    #[serde(default)]
    pub faults: Vec<FaultSpec>,
    pub actions: Vec<ReplayAction>,
}

/// Makes a backend operation fail, optionally after some successful calls.
#[derive(Debug, Clone, Deserialize)]
pub struct FaultSpec {
    pub op: String,
    pub target: String,
    #[serde(default)]
    pub after: Option<usize>,
}

impl FaultSpec {
    fn install(&self, records: &MemoryRecordService, storage: &MemoryObjectStorage) -> Result<()> {
        let (op, injector) = match self.op.as_str() {
            "create" => (ServiceOp::Create, records.faults()),
            "update" => (ServiceOp::Update, records.faults()),
            "delete_where" => (ServiceOp::DeleteWhere, records.faults()),
            "list_where" => (ServiceOp::ListWhere, records.faults()),
            "put_object" => (ServiceOp::PutObject, storage.faults()),
            "delete_object" => (ServiceOp::DeleteObject, storage.faults()),
            other => return Err(anyhow!("unknown fault operation '{}'", other)),
        };
        match self.after {
            Some(successes) => injector.fail_after(op, &self.target, successes),
            None => injector.fail(op, &self.target),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayFile {
    pub filename: String,
    pub mime_type: String,
    /// File body as text.
    pub content: String,
}

impl From<ReplayFile> for UploadFile {
    fn from(file: ReplayFile) -> Self {
        UploadFile::new(file.filename, file.mime_type, file.content.into_bytes())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayAction {
    Patch { patch: HorsePatch },
    AddOwner { holder_id: Uuid },
    RemoveOwner { index: usize },
    SetPrimary { index: usize },
    SetPercentage { index: usize, percentage: u8 },
    Undo,
    Next,
    Back,
    GoTo { step: String },
    FindDuplicates,
    Upload { files: Vec<ReplayFile> },
    RemoveMedia { index: usize },
    Commit,
    Close,
}

impl ReplayAction {
    fn name(&self) -> &'static str {
        match self {
            ReplayAction::Patch { .. } => "patch",
            ReplayAction::AddOwner { .. } => "add_owner",
            ReplayAction::RemoveOwner { .. } => "remove_owner",
            ReplayAction::SetPrimary { .. } => "set_primary",
            ReplayAction::SetPercentage { .. } => "set_percentage",
            ReplayAction::Undo => "undo",
            ReplayAction::Next => "next",
            ReplayAction::Back => "back",
            ReplayAction::GoTo { .. } => "go_to",
            ReplayAction::FindDuplicates => "find_duplicates",
            ReplayAction::Upload { .. } => "upload",
            ReplayAction::RemoveMedia { .. } => "remove_media",
            ReplayAction::Commit => "commit",
            ReplayAction::Close => "close",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayEvent {
    pub index: usize,
    pub action: &'static str,
    pub ok: bool,
    /// Step the cursor is on after the action.
    pub step: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub tenant_id: Uuid,
    pub provisional_id: Uuid,
    pub events: Vec<ReplayEvent>,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CommitOutcome>,
    /// Row count per table after the session.
    pub tables: BTreeMap<String, usize>,
    pub objects: usize,
}

impl ReplayReport {
    pub fn failed_actions(&self) -> usize {
        self.events.iter().filter(|event| !event.ok).count()
    }
}

fn detail<T: Serialize>(value: &T) -> std::result::Result<Option<Value>, AppError> {
    Ok(Some(serde_json::to_value(value)?))
}

fn step_detail(step: &'static str) -> Option<Value> {
    Some(Value::String(step.to_string()))
}

/// Run every action in order. Failed actions are recorded and the script continues.
pub async fn run_script(script: ReplayScript, config: &WizardConfig) -> Result<ReplayReport> {
    let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIds::starting_at(1000));
    let records = Arc::new(MemoryRecordService::with_ids(ids.clone()));
    let storage = Arc::new(MemoryObjectStorage::new());

    for row in script.existing_horses {
        records.create(&config.tables.horses, row).await?;
    }
    for fault in &script.faults {
        fault.install(&records, &storage)?;
    }

    let services = WizardServices::new(records.clone(), storage.clone(), ids);
    let mut wizard = RegistrationWizard::open_create(services, config, script.tenant_id)?;
    let provisional_id = wizard.provisional_id();

    let mut events = Vec::with_capacity(script.actions.len());
    let mut outcome = None;
    for (index, action) in script.actions.into_iter().enumerate() {
        let name = action.name();
        let result = match action {
            ReplayAction::Patch { patch } => wizard.apply(patch).map(|_| None),
            ReplayAction::AddOwner { holder_id } => wizard.add_owner(holder_id).map(|_| None),
            ReplayAction::RemoveOwner { index } => wizard.remove_owner(index).map(|_| None),
            ReplayAction::SetPrimary { index } => wizard.set_primary_owner(index).map(|_| None),
            ReplayAction::SetPercentage { index, percentage } => {
                wizard.set_owner_percentage(index, percentage).map(|_| None)
            }
            ReplayAction::Undo => match wizard.undo() {
                Ok(Some(patch)) => detail(&patch),
                Ok(None) => Ok(None),
                Err(error) => Err(error),
            },
            ReplayAction::Next => wizard.next().map(step_detail),
            ReplayAction::Back => wizard.back().map(step_detail),
            ReplayAction::GoTo { step } => wizard.go_to(&step).map(step_detail),
            ReplayAction::FindDuplicates => match wizard.find_possible_duplicates().await {
                Ok(candidates) => detail(&candidates),
                Err(error) => Err(error),
            },
            ReplayAction::Upload { files } => {
                let files = files.into_iter().map(UploadFile::from).collect();
                match wizard.upload(files).await {
                    Ok(report) => detail(&report),
                    Err(error) => Err(error),
                }
            }
            ReplayAction::RemoveMedia { index } => wizard.remove_media(index).await.map(|_| None),
            ReplayAction::Commit => match wizard.commit().await {
                Ok(committed) => {
                    let value = detail(&committed);
                    outcome = Some(committed);
                    value
                }
                Err(error) => Err(error),
            },
            ReplayAction::Close => detail(&wizard.close().await),
        };

        let step = wizard.current_step();
        events.push(match result {
            Ok(detail) => ReplayEvent {
                index,
                action: name,
                ok: true,
                step,
                detail,
                code: None,
                message: None,
            },
            Err(error) => ReplayEvent {
                index,
                action: name,
                ok: false,
                step,
                detail: None,
                code: Some(error.code),
                message: Some(error.message),
            },
        });
    }

    let mut tables = BTreeMap::new();
    for table in config.tables.names() {
        tables.insert(table.to_string(), records.count(table).await);
    }

    Ok(ReplayReport {
        tenant_id: script.tenant_id,
        provisional_id,
        events,
        progress: wizard.progress(),
        outcome,
        tables,
        objects: storage.object_count().await,
    })
}
