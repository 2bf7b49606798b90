// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_source_config(&config.source)?;
    validate_staging_config(&config.staging)?;
    validate_warehouse_config(&config.warehouse)?;
    validate_runner_config(&config.runner)?;
    validate_enrich_config(&config.enrich)?;
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<()> {
    if config.base_url.is_empty() {
        bail!("source.base_url is required");
    }

    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        bail!("source.base_url must start with http:// or https://");
    }

    if config.base_url.starts_with("http://") {
        warn!(base_url = %config.base_url, "source.base_url is unencrypted http");
    }

    if config.collection.is_empty() {
        bail!("source.collection is required");
    }

    Ok(())
}

fn validate_staging_config(config: &StagingConfig) -> Result<()> {
    if config.spool_dir.is_empty() {
        bail!("staging.spool_dir must not be empty");
    }

    match config.backend {
        StagingBackend::Fs => {
            let fs = config.fs.as_ref().ok_or_else(|| {
                anyhow::anyhow!("fs staging backend requires 'staging.fs' configuration")
            })?;

            if fs.path.is_empty() {
                bail!("staging.fs.path must not be empty");
            }
        }
        StagingBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                anyhow::anyhow!("s3 staging backend requires 'staging.s3' configuration")
            })?;

            if s3.bucket.is_empty() {
                bail!("staging.s3.bucket is required for S3 backend");
            }

            if s3.region.is_empty() {
                bail!("staging.s3.region is required for S3 backend");
            }
        }
    }

    Ok(())
}

fn validate_warehouse_config(config: &WarehouseConfig) -> Result<()> {
    if config.dataset.is_empty() {
        bail!("warehouse.dataset is required");
    }

    if config.table.is_empty() {
        bail!("warehouse.table is required");
    }

    for (field, value) in [("warehouse.dataset", &config.dataset), ("warehouse.table", &config.table)] {
        if value.contains('/') || value.chars().any(char::is_whitespace) {
            bail!("{} must not contain '/' or whitespace: '{}'", field, value);
        }
    }

    if config.root.is_empty() {
        bail!("warehouse.root must not be empty");
    }

    Ok(())
}

fn validate_runner_config(config: &RunnerConfig) -> Result<()> {
    if config.log_level.is_empty() {
        bail!("runner.log_level must not be empty");
    }

    Ok(())
}

fn validate_enrich_config(config: &EnrichConfig) -> Result<()> {
    for span in &config.year_spans {
        if span.rows == 0 {
            bail!("enrich.year_spans entry for year {} covers zero rows", span.year);
        }
    }

    Ok(())
}
