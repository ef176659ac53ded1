use anyhow::Result;
use clap::Parser;

use promdriver_core::config::PromdriverConfig;
use promdriver_daemon::cli::DaemonCli;
use promdriver_daemon::logging;
use promdriver_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // file -> env -> CLI, then validate
    let mut config = PromdriverConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load {}: {}", cli.config.display(), e))?;
    // logged once tracing is up
    let rejected_overrides = config.apply_env_overrides();
    cli.apply_overrides(&mut config.general);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    if cli.validate {
        for rejected in &rejected_overrides {
            eprintln!("warning: {rejected}");
        }
        let targets = config
            .targets()
            .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
        println!(
            "configuration OK: {} ({} targets)",
            cli.config.display(),
            targets.len()
        );
        for target in &targets {
            println!("  {target}");
        }
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    for rejected in &rejected_overrides {
        rejected.log();
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "promdriver starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("promdriver shut down");
    Ok(())
}
