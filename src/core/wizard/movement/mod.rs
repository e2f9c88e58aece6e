//! Location movement wizard: a horse entering, leaving or moving within the facility.

pub mod draft;
pub mod housing;
pub mod session;
pub mod steps;

pub use draft::{HousingChoice, MovementDraft, MovementPatch, MovementType};
pub use housing::HousingPicker;
pub use session::MovementWizard;
