use crate::{
    cli::args::{CheckConfigArgs, ReplayArgs},
    cli::replay::{self, ReplayScript},
    core::{ConfigLoader, ConfigValidator, WizardConfig},
    Result,
};
use anyhow::{anyhow, Context};
use std::{env, fs, path::Path};

fn load_validated(path: &Path) -> Result<WizardConfig> {
    let config = if path.is_file() {
        let mut config = ConfigLoader::load_from_file(path)?.unwrap_or_default();
        ConfigLoader::apply_env_overrides(&mut config);
        config
    } else {
        ConfigLoader::load_from_workspace(path)?
    };
    ConfigValidator::validate(&config)?;
    Ok(config)
}

pub async fn replay(args: ReplayArgs) -> Result<()> {
    let workspace = match args.workspace {
        Some(path) => path,
        None => env::current_dir()?,
    };
    let config = load_validated(&workspace)?;

    let raw = fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read replay script {}", args.script.display()))?;
    let script: ReplayScript = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse replay script {}", args.script.display()))?;

    tracing::info!(script = %args.script.display(), actions = script.actions.len(), "replaying session");
    let report = replay::run_script(script, &config).await?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", rendered);

    let failed = report.failed_actions();
    if failed > 0 {
        return Err(anyhow!("{} replay action(s) failed", failed));
    }
    Ok(())
}

pub fn check_config(args: CheckConfigArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => env::current_dir()?,
    };
    let config = load_validated(&path)?;
    println!("# effective configuration for {}", path.display());
    print!("{}", toml::to_string_pretty(&config)?);
    println!();
    println!("# environment overrides");
    for line in ConfigLoader::env_var_documentation() {
        println!("# {}", line);
    }
    Ok(())
}
