use crate::commands::{AttestArgs, Cli, Command};
use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use workload_attestor::logging::setup_logging;
use workload_attestor::{
    AttestContext, AttestationConfig, AttestationEngine, ConfigLoader, ConfigStore,
};

pub fn process_command() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ConfigLoader::load_default_config().context("failed to load config")?,
    };

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Attest(args) => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(attest(config, args))
        }
    }
}

fn effective_config(mut config: AttestationConfig, args: &AttestArgs) -> AttestationConfig {
    config.discover_workload_path |= args.discover_workload_path;
    if let Some(limit) = args.workload_size_limit {
        config.workload_size_limit = limit;
    }
    config
}

async fn attest(config: AttestationConfig, args: AttestArgs) -> Result<()> {
    let config = effective_config(config, &args);
    tracing::debug!(?config, pid = args.pid, "attesting");

    let engine = AttestationEngine::from_store(ConfigStore::new(config))?;
    let ctx = match args.timeout_ms {
        Some(ms) => AttestContext::with_timeout(Duration::from_millis(ms)),
        None => AttestContext::new(),
    };

    let selectors = engine
        .attest(&ctx, args.pid)
        .await
        .with_context(|| format!("failed to attest process {}", args.pid))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&selectors)?);
    } else {
        for selector in &selectors {
            println!("{selector}");
        }
    }
    Ok(())
}
