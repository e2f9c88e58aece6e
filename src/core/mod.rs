pub mod config;
pub mod error;
pub mod types;
pub mod wizard;

pub use config::{ConfigLoader, ConfigValidator, WizardConfig};
pub use error::{AppError, DefaultErrorReporter, ErrorReporter};
pub use types::*;
