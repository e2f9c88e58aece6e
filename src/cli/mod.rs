pub mod args;
pub mod commands;
pub mod replay;

pub use args::{CheckConfigArgs, ReplayArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "paddock")]
#[command(version = crate::VERSION)]
#[command(about = "Staged registration and movement wizards for equestrian facilities")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: check the workspace configuration, then replay a scripted registration session to see how it commits."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Drive a registration session from a JSON script",
        long_about = "Replay opens a create-mode registration wizard against in-memory record and object storage, applies every scripted action in order, and prints a JSON report of each action and the commit outcome.",
        after_help = "Example:\n    paddock replay ./sessions/comet.json --workspace ./stable"
    )]
    Replay(ReplayArgs),
    #[command(
        about = "Validate paddock.toml",
        long_about = "Check-config loads paddock.toml with environment overrides applied, validates it, and prints the effective configuration.",
        after_help = "Example:\n    paddock check-config ./stable"
    )]
    CheckConfig(CheckConfigArgs),
}

pub async fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Replay(replay_args) => commands::replay(replay_args).await,
        Command::CheckConfig(check_args) => commands::check_config(check_args),
    }
}
