use crate::cli::Command;
use std::env;

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Commands run by a developer from a terminal.
    LocalDev,
    /// Scripted runs (CI, cron) that keep the console quiet unless configured otherwise.
    Headless,
}

impl ExecutionContext {
    pub fn disables_console(self) -> bool {
        matches!(self, ExecutionContext::Headless)
    }
}

/// Derive the active execution context from a parsed CLI command plus overrides.
pub fn detect_context(command: &Command) -> ExecutionContext {
    if headless_override_enabled() {
        return ExecutionContext::Headless;
    }
    match command {
        Command::Replay(_) | Command::CheckConfig(_) => ExecutionContext::LocalDev,
    }
}

fn headless_override_enabled() -> bool {
    env::var("PADDOCK_HEADLESS")
        .map(|value| value.trim() == "1")
        .unwrap_or(false)
}
