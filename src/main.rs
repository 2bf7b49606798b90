use anyhow::{Context, Result};
use clap::Parser;
use rows2warehouse::{init, RunContext};
use rows2warehouse_config::{RuntimeConfig, StagingBackend};
use std::path::PathBuf;

/// One batch transfer run: fetch a collection, stage it by (month, year),
/// bulk-load it into the destination table.
#[derive(Parser)]
#[command(name = "rows2warehouse")]
#[command(version)]
#[command(about = "Partitioned batch transfer from a tabular source into an analytical warehouse", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source collection to transfer (overrides config file)
    #[arg(long, value_name = "NAME")]
    collection: Option<String>,

    /// Staging directory (filesystem backend only)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and execute the single run
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli)?;

    // Step 3: Logging first, so validation warnings are visible
    init::init_tracing(&config.runner);

    // Step 4: Validate the fully resolved configuration
    config.validate()?;

    // Step 5: Build clients and execute exactly one run
    let pipeline = init::build_pipeline(&config)?;
    let ctx = RunContext::new(&config.source.collection);

    match pipeline.run(&ctx).await {
        Ok(summary) => {
            tracing::info!(
                run_id = %summary.run_id,
                state = %summary.state,
                rows_fetched = summary.rows_fetched,
                partitions = summary.partitions,
                objects_staged = summary.objects_staged,
                rows_loaded = summary.rows_loaded,
                "run complete"
            );
            Ok(())
        }
        Err(err) => {
            // The scheduler reads this classification to decide on a retry.
            tracing::error!(
                run_id = %ctx.run_id,
                stage = err.stage(),
                retryable = err.is_retryable(),
                error = %err,
                "run failed"
            );
            Err(err.into())
        }
    }
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) -> Result<()> {
    if let Some(collection) = &cli.collection {
        config.source.collection = collection.clone();
    }

    // Override staging directory (only valid for fs backend)
    if let Some(output) = &cli.output {
        if config.staging.backend != StagingBackend::Fs {
            anyhow::bail!(
                "--output flag only works with the filesystem staging backend, but backend is '{}'.\n\
                Either remove --output or set backend to 'fs' in the config file.",
                config.staging.backend
            );
        }

        let fs_config = config.staging.fs.get_or_insert_with(Default::default);
        fs_config.path = output.to_string_lossy().to_string();
    }

    if let Some(level) = &cli.log_level {
        config.runner.log_level = level.clone();
    }

    Ok(())
}
