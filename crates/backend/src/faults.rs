use paddock_types::{ServiceError, ServiceResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOp {
    Create,
    Update,
    DeleteWhere,
    ListWhere,
    PutObject,
    DeleteObject,
}

#[derive(Debug, Clone, Copy)]
enum FaultMode {
    Always,
    AfterSuccesses(usize),
}

/// Scripted failures keyed by operation and target (table or bucket name).
#[derive(Debug, Default)]
pub struct FaultInjector {
    plans: Mutex<HashMap<(ServiceOp, String), FaultMode>>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call of `op` against `target` fails until cleared.
    pub fn fail(&self, op: ServiceOp, target: &str) {
        self.insert(op, target, FaultMode::Always);
    }

    /// Let `successes` calls through, then fail every following call.
    pub fn fail_after(&self, op: ServiceOp, target: &str, successes: usize) {
        self.insert(op, target, FaultMode::AfterSuccesses(successes));
    }

    pub fn clear(&self) {
        if let Ok(mut plans) = self.plans.lock() {
            plans.clear();
        }
    }

    pub fn check(&self, op: ServiceOp, target: &str) -> ServiceResult<()> {
        let mut plans = self
            .plans
            .lock()
            .map_err(|_| ServiceError::Unavailable("fault plan lock poisoned".to_string()))?;
        let key = (op, target.to_string());
        match plans.get_mut(&key) {
            None => Ok(()),
            Some(FaultMode::Always) | Some(FaultMode::AfterSuccesses(0)) => Err(
                ServiceError::Unavailable(format!("injected {:?} failure on {}", op, target)),
            ),
            Some(FaultMode::AfterSuccesses(remaining)) => {
                *remaining -= 1;
                Ok(())
            }
        }
    }

    fn insert(&self, op: ServiceOp, target: &str, mode: FaultMode) {
        if let Ok(mut plans) = self.plans.lock() {
            plans.insert((op, target.to_string()), mode);
        }
    }
}
