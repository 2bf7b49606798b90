// Client construction and logging setup.
//
// Everything a run needs is built here from the resolved config, once per
// run, and handed to the pipeline. No module-level clients, no hidden
// globals.

use anyhow::{Context, Result};
use opendal::Operator;
use rows2warehouse_config::{
    EnrichConfig, LogFormat, RunnerConfig, RuntimeConfig, StagingBackend,
};
use rows2warehouse_core::{YearSpan, YearSpanTable};
use rows2warehouse_source::RestSource;
use rows2warehouse_stage::Stager;
use rows2warehouse_warehouse::DirWarehouse;
use std::sync::Arc;
use tracing::info;

use crate::pipeline::Pipeline;

/// Build the full pipeline for one run from the resolved config.
pub fn build_pipeline(config: &RuntimeConfig) -> Result<Pipeline> {
    let staging = build_staging_operator(config)?;
    let warehouse = build_warehouse(config, staging.clone())?;

    let source = RestSource::new(&config.source.base_url, config.source.api_key.as_deref())
        .context("Failed to construct source client")?;
    let stager = Stager::new(staging, &config.staging.spool_dir);
    let spans = year_span_table(&config.enrich)?;

    Ok(Pipeline::new(
        Arc::new(source),
        spans,
        stager,
        Arc::new(warehouse),
        &config.warehouse.dataset,
        &config.warehouse.table,
    ))
}

/// Operator for the intermediate staging store.
pub fn build_staging_operator(config: &RuntimeConfig) -> Result<Operator> {
    match config.staging.backend {
        StagingBackend::Fs => {
            let fs = config
                .staging
                .fs
                .as_ref()
                .context("fs staging backend requires 'staging.fs' configuration")?;
            info!(path = %fs.path, "staging to local filesystem");

            let builder = opendal::services::Fs::default().root(&fs.path);
            Ok(Operator::new(builder)?.finish())
        }
        StagingBackend::S3 => {
            let s3 = config
                .staging
                .s3
                .as_ref()
                .context("s3 staging backend requires 'staging.s3' configuration")?;
            info!(bucket = %s3.bucket, region = %s3.region, "staging to S3");

            let mut builder =
                opendal::services::S3::default().bucket(&s3.bucket).region(&s3.region);
            if let Some(endpoint) = &s3.endpoint {
                builder = builder.endpoint(endpoint);
            }
            if let Some(key) = &s3.access_key_id {
                builder = builder.access_key_id(key);
            }
            if let Some(secret) = &s3.secret_access_key {
                builder = builder.secret_access_key(secret);
            }
            Ok(Operator::new(builder)?.finish())
        }
    }
}

/// Directory warehouse over the configured root; bulk loads read from the
/// staging operator.
pub fn build_warehouse(config: &RuntimeConfig, staging: Operator) -> Result<DirWarehouse> {
    let builder = opendal::services::Fs::default().root(&config.warehouse.root);
    let operator = Operator::new(builder)?.finish();
    Ok(DirWarehouse::new(operator, staging))
}

/// Year derivation table: configured spans, or the built-in table when
/// none are declared.
pub fn year_span_table(config: &EnrichConfig) -> Result<YearSpanTable> {
    if config.year_spans.is_empty() {
        return Ok(YearSpanTable::default());
    }

    let spans = config.year_spans.iter().map(|entry| YearSpan::new(entry.rows, entry.year)).collect();
    YearSpanTable::new(spans).context("Invalid enrich.year_spans configuration")
}

/// Initialize tracing/logging from the runner config.
pub fn init_tracing(runner: &RunnerConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&runner.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match runner.log_format {
        LogFormat::Json => {
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Text => {
            registry.with(fmt::layer()).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rows2warehouse_config::YearSpanEntry;

    #[test]
    fn empty_span_config_uses_the_builtin_table() {
        let table = year_span_table(&EnrichConfig::default()).unwrap();
        assert_eq!(table, YearSpanTable::default());
    }

    #[test]
    fn declared_spans_replace_the_builtin_table() {
        let config = EnrichConfig {
            year_spans: vec![
                YearSpanEntry { rows: 2, year: 2008 },
                YearSpanEntry { rows: 1, year: 2009 },
            ],
        };
        let table = year_span_table(&config).unwrap();
        assert_eq!(table.total_rows(), 3);
    }

    #[test]
    fn zero_row_spans_are_rejected() {
        let config = EnrichConfig {
            year_spans: vec![YearSpanEntry { rows: 0, year: 2008 }],
        };
        assert!(year_span_table(&config).is_err());
    }
}
