use crate::core::error::{DefaultErrorReporter, ErrorReporter};
use paddock_types::{IdGenerator, ObjectStorage, RecordService};
use std::sync::Arc;

/// Collaborators a wizard session talks to.
#[derive(Clone)]
pub struct WizardServices {
    pub records: Arc<dyn RecordService>,
    pub storage: Arc<dyn ObjectStorage>,
    pub ids: Arc<dyn IdGenerator>,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl WizardServices {
    pub fn new(
        records: Arc<dyn RecordService>,
        storage: Arc<dyn ObjectStorage>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        WizardServices {
            records,
            storage,
            ids,
            reporter: Arc::new(DefaultErrorReporter::new()),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }
}

impl std::fmt::Debug for WizardServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardServices").finish_non_exhaustive()
    }
}
