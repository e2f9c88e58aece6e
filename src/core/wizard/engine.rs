#![allow(clippy::result_large_err)] // Navigation returns AppError so gate reasons reach the caller with their code.

//! Step graph and cursor shared by every wizard.
//!
//! The engine holds no entity data: the effective step list is recomputed from the draft on
//! every call, and the cursor remembers the current step by name so a recomputed list can never
//! leave it pointing at the wrong step.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Gate evaluated before leaving a step. `Err` carries the reason shown to the user.
pub type GateFn<D> = fn(&D) -> Result<(), String>;

/// Whether a step belongs to the effective list for the current draft.
pub type ApplicabilityFn<D> = fn(&D) -> bool;

/// A named step with its gating predicate.
pub struct Step<D> {
    pub name: &'static str,
    gate: GateFn<D>,
    applies: ApplicabilityFn<D>,
}

impl<D> Clone for Step<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Step<D> {}

impl<D> fmt::Debug for Step<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

fn always_passable<D>(_: &D) -> Result<(), String> {
    Ok(())
}

fn always_applies<D>(_: &D) -> bool {
    true
}

impl<D> Step<D> {
    /// Unconditionally passable step that is always part of the list.
    pub fn new(name: &'static str) -> Self {
        Step {
            name,
            gate: always_passable::<D>,
            applies: always_applies::<D>,
        }
    }

    pub fn gated(mut self, gate: GateFn<D>) -> Self {
        self.gate = gate;
        self
    }

    /// Exclude the step whenever `applies` is false.
    pub fn when(mut self, applies: ApplicabilityFn<D>) -> Self {
        self.applies = applies;
        self
    }

    pub fn check(&self, draft: &D) -> Result<(), StepBlocked> {
        (self.gate)(draft).map_err(|reason| StepBlocked {
            step: self.name,
            reason,
        })
    }

    pub fn applies(&self, draft: &D) -> bool {
        (self.applies)(draft)
    }
}

/// Reason a step cannot be left yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepBlocked {
    pub step: &'static str,
    pub reason: String,
}

impl fmt::Display for StepBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' is incomplete: {}", self.step, self.reason)
    }
}

/// Ordered, declared step list for one session.
pub struct StepGraph<D> {
    steps: Vec<Step<D>>,
}

impl<D> fmt::Debug for StepGraph<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|step| step.name))
            .finish()
    }
}

impl<D> StepGraph<D> {
    pub fn new(steps: Vec<Step<D>>) -> Result<Self, AppError> {
        if steps.is_empty() {
            return Err(AppError::new(
                ErrorCategory::InternalError,
                "a step graph needs at least one step",
            )
            .with_code("WIZ-NAV-005"));
        }
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.name) {
                return Err(AppError::new(
                    ErrorCategory::InternalError,
                    format!("duplicate step name '{}'", step.name),
                )
                .with_code("WIZ-NAV-005"));
            }
        }
        Ok(StepGraph { steps })
    }

    pub fn declared(&self) -> &[Step<D>] {
        &self.steps
    }

    pub fn declared_index(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.name == name)
    }

    /// Declared steps filtered by their applicability for `draft`.
    pub fn effective_steps(&self, draft: &D) -> Vec<Step<D>> {
        self.steps
            .iter()
            .filter(|step| step.applies(draft))
            .copied()
            .collect()
    }

    pub fn effective_names(&self, draft: &D) -> Vec<&'static str> {
        self.effective_steps(draft)
            .into_iter()
            .map(|step| step.name)
            .collect()
    }
}

/// Position of the cursor within the effective list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub step: &'static str,
    /// One-based position.
    pub position: usize,
    pub total: usize,
    pub percent: u8,
}

/// Cursor over a step graph.
pub struct StepEngine<D> {
    graph: StepGraph<D>,
    current: &'static str,
}

impl<D> fmt::Debug for StepEngine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepEngine")
            .field("graph", &self.graph)
            .field("current", &self.current)
            .finish()
    }
}

impl<D> StepEngine<D> {
    /// Start at the first declared step.
    pub fn new(graph: StepGraph<D>) -> Self {
        let current = graph.steps[0].name;
        StepEngine { graph, current }
    }

    pub fn graph(&self) -> &StepGraph<D> {
        &self.graph
    }

    /// Move the cursor back to the first declared step.
    pub fn rewind(&mut self) {
        self.current = self.graph.steps[0].name;
    }

    /// Index of the current step within the effective list.
    ///
    /// When the current step has been excluded, the nearest preceding applicable step is used.
    fn resolve(&self, effective: &[Step<D>], draft: &D) -> usize {
        if let Some(index) = effective.iter().position(|step| step.name == self.current) {
            return index;
        }
        let declared = self.graph.declared_index(self.current).unwrap_or(0);
        self.graph.steps[..=declared]
            .iter()
            .rev()
            .find(|step| step.applies(draft))
            .and_then(|step| effective.iter().position(|e| e.name == step.name))
            .unwrap_or(0)
    }

    pub fn current_step(&self, draft: &D) -> &'static str {
        let effective = self.graph.effective_steps(draft);
        if effective.is_empty() {
            return self.current;
        }
        effective[self.resolve(&effective, draft)].name
    }

    pub fn position(&self, draft: &D) -> usize {
        let effective = self.graph.effective_steps(draft);
        self.resolve(&effective, draft)
    }

    pub fn progress(&self, draft: &D) -> Progress {
        let effective = self.graph.effective_steps(draft);
        let total = effective.len();
        if total == 0 {
            return Progress {
                step: self.current,
                position: 0,
                total: 0,
                percent: 0,
            };
        }
        let index = self.resolve(&effective, draft);
        Progress {
            step: effective[index].name,
            position: index + 1,
            total,
            percent: (((index + 1) * 100) / total) as u8,
        }
    }

    pub fn is_first(&self, draft: &D) -> bool {
        self.position(draft) == 0
    }

    pub fn is_terminal(&self, draft: &D) -> bool {
        let effective = self.graph.effective_steps(draft);
        !effective.is_empty() && self.resolve(&effective, draft) + 1 == effective.len()
    }

    pub fn blocked(&self, draft: &D) -> Option<StepBlocked> {
        let effective = self.graph.effective_steps(draft);
        if effective.is_empty() {
            return None;
        }
        effective[self.resolve(&effective, draft)].check(draft).err()
    }

    pub fn can_advance(&self, draft: &D) -> bool {
        self.blocked(draft).is_none()
    }

    /// Advance to the next effective step once the current gate holds.
    pub fn next(&mut self, draft: &D) -> Result<&'static str, AppError> {
        let effective = self.non_empty(draft)?;
        let index = self.resolve(&effective, draft);
        let step = effective[index];
        step.check(draft).map_err(|blocked| {
            AppError::new(ErrorCategory::NavigationError, blocked.to_string())
                .with_code("WIZ-NAV-001")
                .with_context(step.name)
        })?;
        if index + 1 >= effective.len() {
            return Err(AppError::new(
                ErrorCategory::NavigationError,
                format!("'{}' is the final step", step.name),
            )
            .with_code("WIZ-NAV-003"));
        }
        self.current = effective[index + 1].name;
        tracing::debug!(from = step.name, to = self.current, "wizard advanced");
        Ok(self.current)
    }

    /// Step back; refused only on the first effective step.
    pub fn back(&mut self, draft: &D) -> Result<&'static str, AppError> {
        let effective = self.non_empty(draft)?;
        let index = self.resolve(&effective, draft);
        if index == 0 {
            return Err(AppError::new(
                ErrorCategory::NavigationError,
                format!("'{}' is the first step", effective[0].name),
            )
            .with_code("WIZ-NAV-002"));
        }
        let from = effective[index].name;
        self.current = effective[index - 1].name;
        tracing::debug!(from, to = self.current, "wizard stepped back");
        Ok(self.current)
    }

    /// Jump back to an earlier effective step, e.g. from a review screen.
    pub fn go_to(&mut self, name: &str, draft: &D) -> Result<&'static str, AppError> {
        let effective = self.non_empty(draft)?;
        let index = self.resolve(&effective, draft);
        match effective.iter().position(|step| step.name == name) {
            Some(target) if target <= index => {
                self.current = effective[target].name;
                Ok(self.current)
            }
            Some(_) => Err(AppError::new(
                ErrorCategory::NavigationError,
                format!("cannot jump forward to '{}'", name),
            )
            .with_code("WIZ-NAV-004")),
            None => Err(AppError::new(
                ErrorCategory::NavigationError,
                format!("'{}' is not part of this session", name),
            )
            .with_code("WIZ-NAV-004")),
        }
    }

    fn non_empty(&self, draft: &D) -> Result<Vec<Step<D>>, AppError> {
        let effective = self.graph.effective_steps(draft);
        if effective.is_empty() {
            return Err(AppError::new(
                ErrorCategory::NavigationError,
                "no step applies to the current draft",
            )
            .with_code("WIZ-NAV-005"));
        }
        Ok(effective)
    }
}
