//! JSON-lines file sink kept under the workspace.

use crate::logging::config::LoggingConfig;
use crate::Result;
use anyhow::{bail, Context};
use std::fs::{self, OpenOptions};
use std::path::{Component, Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::{self as tracing_fmt, format};
use tracing_subscriber::registry::LookupSpan;

pub const LOG_FILE_NAME: &str = "paddock.log";

/// JSON formatting layer writing through the non-blocking appender.
pub type FileFmtLayer<S> =
    tracing_fmt::Layer<S, format::JsonFields, format::Format<format::Json>, NonBlocking>;

/// Subscriber with the file layer applied; the layer is absent when the sink is disabled.
pub type FileLayerStack<S> = tracing_subscriber::layer::Layered<Option<FileFmtLayer<S>>, S>;

/// `<workspace>/.paddock/logs/paddock.log`, or the same file name under `log_dir`.
///
/// A relative `log_dir` is joined to the workspace and may not climb out of it.
pub fn log_file_path(config: &LoggingConfig, workspace: &Path) -> Result<PathBuf> {
    let directory = match &config.log_dir {
        None => workspace.join(".paddock").join("logs"),
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => {
            if dir.components().any(|part| matches!(part, Component::ParentDir)) {
                bail!(
                    "logging.log_dir {} resolves outside workspace {}",
                    dir.display(),
                    workspace.display()
                );
            }
            workspace.join(dir)
        }
    };
    Ok(directory.join(LOG_FILE_NAME))
}

/// File layer appending one JSON object per event to `log_file`.
pub fn file_layer<S>(
    log_file: &Path,
    enabled: bool,
) -> Result<(Option<FileFmtLayer<S>>, Option<WorkerGuard>)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if !enabled {
        return Ok((None, None));
    }
    if let Some(directory) = log_file.parent() {
        fs::create_dir_all(directory)
            .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let layer = tracing_fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_target(false)
        .with_writer(writer);
    Ok((Some(layer), Some(guard)))
}
