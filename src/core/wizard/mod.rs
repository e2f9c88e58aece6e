//! Staged multi-step entity creation.
//!
//! A session pairs a [`draft::DraftStore`] with an [`engine::StepEngine`]; files are staged
//! through [`staging::ResourceStager`] and the result is written by
//! [`commit::CommitOrchestrator`].

pub mod allocation;
pub mod commit;
pub mod draft;
pub mod engine;
pub mod movement;
pub mod registration;
pub mod services;
pub mod staging;

pub use allocation::{AllocationError, OwnershipAllocation};
pub use commit::{CommitOrchestrator, CommitOutcome, CommitWarning, CommittedEntity};
pub use draft::{DraftRecord, DraftStore};
pub use engine::{Progress, Step, StepEngine, StepGraph};
pub use movement::MovementWizard;
pub use registration::RegistrationWizard;
pub use services::WizardServices;
pub use staging::{ResourceStager, UploadFile, UploadReport};
