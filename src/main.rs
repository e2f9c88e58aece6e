use clap::Parser;
use paddock::cli::{self, Args};
use paddock::logging;

#[tokio::main]
async fn main() -> paddock::Result<()> {
    let args = Args::parse();
    let guard = logging::init(&args.command)?;
    tracing::debug!(
        log_file = %guard.log_file_path().display(),
        console = %guard.console_output(),
        "logging initialized"
    );
    cli::run(args).await
}
