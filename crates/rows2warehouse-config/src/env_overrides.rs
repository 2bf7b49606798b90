use crate::{FsConfig, LogFormat, RuntimeConfig, S3Config, StagingBackend};
use anyhow::{Context, Result};

pub const ENV_PREFIX: &str = "ROWS2WAREHOUSE_";

/// Abstraction over environment-variable lookups so tests can supply
/// their own source of overrides without mutating process state.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the ROWS2WAREHOUSE_ prefix.
    /// Used for AWS standard variables (AWS_ACCESS_KEY_ID, etc.)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Source
    if let Some(base_url) = env.get("SOURCE_BASE_URL") {
        config.source.base_url = base_url;
    }
    if let Some(api_key) = env.get("SOURCE_API_KEY") {
        config.source.api_key = Some(api_key);
    }
    if let Some(collection) = env.get("SOURCE_COLLECTION") {
        config.source.collection = collection;
    }

    // Staging
    if let Some(backend) = env.get("STAGING_BACKEND") {
        config.staging.backend = backend
            .parse::<StagingBackend>()
            .context("Invalid ROWS2WAREHOUSE_STAGING_BACKEND value")?;
    }
    if let Some(spool_dir) = env.get("STAGING_SPOOL_DIR") {
        config.staging.spool_dir = spool_dir;
    }
    if let Some(path) = env.get("STAGING_PATH") {
        config.staging.fs.get_or_insert_with(FsConfig::default).path = path;
    }

    // S3 staging
    if let Some(bucket) = env.get("S3_BUCKET") {
        ensure_s3(config).bucket = bucket;
    }
    if let Some(region) = env.get("S3_REGION") {
        ensure_s3(config).region = region;
    }
    if let Some(endpoint) = env.get("S3_ENDPOINT") {
        ensure_s3(config).endpoint = Some(endpoint);
    }
    // AWS standard credentials (without ROWS2WAREHOUSE_ prefix for compatibility)
    if let Some(access_key_id) = env.get_raw("AWS_ACCESS_KEY_ID") {
        ensure_s3(config).access_key_id = Some(access_key_id);
    }
    if let Some(secret_access_key) = env.get_raw("AWS_SECRET_ACCESS_KEY") {
        ensure_s3(config).secret_access_key = Some(secret_access_key);
    }
    if let Some(endpoint) = env.get_raw("AWS_ENDPOINT_URL") {
        ensure_s3(config).endpoint = Some(endpoint);
    }

    // Warehouse
    if let Some(dataset) = env.get("WAREHOUSE_DATASET") {
        config.warehouse.dataset = dataset;
    }
    if let Some(table) = env.get("WAREHOUSE_TABLE") {
        config.warehouse.table = table;
    }
    if let Some(root) = env.get("WAREHOUSE_ROOT") {
        config.warehouse.root = root;
    }

    // Runner
    if let Some(level) = env.get("LOG_LEVEL") {
        config.runner.log_level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.runner.log_format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    Ok(())
}

fn ensure_s3(config: &mut RuntimeConfig) -> &mut S3Config {
    config.staging.s3.get_or_insert_with(|| S3Config {
        bucket: String::new(),
        region: String::new(),
        endpoint: None,
        access_key_id: None,
        secret_access_key: None,
    })
}
