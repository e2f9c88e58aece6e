//! Horse registration wizard.

pub mod draft;
pub mod session;
pub mod steps;

pub use draft::{HorseCategory, HorseDraft, HorsePatch, HorseProfile, HorseSex};
pub use session::{CloseReport, DuplicateCandidate, RegistrationWizard, ENTITY_TYPE};
