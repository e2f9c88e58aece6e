use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// JSON script describing the session
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Workspace holding paddock.toml and .paddock/ (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckConfigArgs {
    /// Workspace directory or path to a paddock.toml file (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}
