#![allow(clippy::result_large_err)]

use super::draft::{MovementDraft, MovementType};
use crate::core::error::AppError;
use crate::core::wizard::engine::{Step, StepGraph};

pub const TYPE: &str = "type";
pub const SUBJECT: &str = "subject";
pub const LOCATION: &str = "location";
pub const HOUSING: &str = "housing";
pub const DETAILS: &str = "details";
pub const REVIEW: &str = "review";

fn type_gate(draft: &MovementDraft) -> Result<(), String> {
    match draft.movement_type {
        Some(_) => Ok(()),
        None => Err("movement type is required".to_string()),
    }
}

fn subject_gate(draft: &MovementDraft) -> Result<(), String> {
    match draft.subject_id {
        Some(_) => Ok(()),
        None => Err("a horse must be selected".to_string()),
    }
}

fn location_gate(draft: &MovementDraft) -> Result<(), String> {
    let needs_source = matches!(
        draft.movement_type,
        Some(MovementType::Out) | Some(MovementType::Transfer)
    );
    let needs_destination = matches!(
        draft.movement_type,
        Some(MovementType::In) | Some(MovementType::Transfer)
    );
    if needs_source && draft.from_location_id.is_none() {
        return Err("source location is required".to_string());
    }
    if needs_destination && draft.to_location_id.is_none() {
        return Err("destination location is required".to_string());
    }
    if draft.is_internal_relocation() && draft.justification.trim().is_empty() {
        return Err("a justification is required when moving within the same location".to_string());
    }
    Ok(())
}

/// Housing only applies when the horse ends up somewhere.
fn has_destination(draft: &MovementDraft) -> bool {
    draft.movement_type != Some(MovementType::Out)
}

pub fn movement_steps() -> Result<StepGraph<MovementDraft>, AppError> {
    StepGraph::new(vec![
        Step::new(TYPE).gated(type_gate),
        Step::new(SUBJECT).gated(subject_gate),
        Step::new(LOCATION).gated(location_gate),
        Step::new(HOUSING).when(has_destination),
        Step::new(DETAILS),
        Step::new(REVIEW),
    ])
}
