#![allow(clippy::result_large_err)]

use super::draft::HorseDraft;
use crate::core::error::AppError;
use crate::core::types::WizardMode;
use crate::core::wizard::allocation;
use crate::core::wizard::engine::{Step, StepGraph};

pub const DUPLICATE_CHECK: &str = "duplicate_check";
pub const IDENTITY: &str = "identity";
pub const CLASSIFICATION: &str = "classification";
pub const PHYSICAL: &str = "physical";
pub const RELATIONSHIPS: &str = "relationships";
pub const OWNERSHIP: &str = "ownership";
pub const MEDIA: &str = "media";
pub const REVIEW: &str = "review";

fn identity_gate(draft: &HorseDraft) -> Result<(), String> {
    if draft.profile.name.trim().is_empty() {
        return Err("name is required".to_string());
    }
    if draft.profile.category.is_none() {
        return Err("category is required".to_string());
    }
    Ok(())
}

fn ownership_gate(draft: &HorseDraft) -> Result<(), String> {
    allocation::validate(&draft.allocations).map_err(|e| e.to_string())
}

/// Declared steps for a registration session. Edits start at identity.
pub fn registration_steps(mode: WizardMode) -> Result<StepGraph<HorseDraft>, AppError> {
    let mut steps = Vec::with_capacity(8);
    if mode == WizardMode::Create {
        steps.push(Step::new(DUPLICATE_CHECK));
    }
    steps.extend([
        Step::new(IDENTITY).gated(identity_gate),
        Step::new(CLASSIFICATION),
        Step::new(PHYSICAL),
        Step::new(RELATIONSHIPS),
        Step::new(OWNERSHIP).gated(ownership_gate),
        Step::new(MEDIA),
        Step::new(REVIEW),
    ]);
    StepGraph::new(steps)
}
