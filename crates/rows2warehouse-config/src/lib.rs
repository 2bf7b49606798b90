// rows2warehouse-config - Runtime configuration
//
// Sources, in priority order:
// 1. Environment variables (ROWS2WAREHOUSE_* prefix, applied last)
// 2. Config file path from ROWS2WAREHOUSE_CONFIG
// 3. Inline config content from ROWS2WAREHOUSE_CONFIG_CONTENT
// 4. Default config files (./config.toml, ./.rows2warehouse.toml)
// 5. Built-in defaults

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub staging: StagingConfig,

    #[serde(default)]
    pub warehouse: WarehouseConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub enrich: EnrichConfig,
}

/// Upstream tabular source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Collection (table) to fetch in full each run.
    #[serde(default)]
    pub collection: String,
}

/// Intermediate object store where partitions are staged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    #[serde(default)]
    pub backend: StagingBackend,

    /// Local working directory for spool files awaiting upload.
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

fn default_spool_dir() -> String {
    "./spool".to_string()
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            backend: StagingBackend::Fs,
            spool_dir: default_spool_dir(),
            fs: Some(FsConfig::default()),
            s3: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingBackend {
    #[default]
    Fs,
    S3,
}

impl std::fmt::Display for StagingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingBackend::Fs => write!(f, "fs"),
            StagingBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StagingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StagingBackend::Fs),
            "s3" | "aws" => Ok(StagingBackend::S3),
            _ => anyhow::bail!("Unsupported staging backend: {}. Supported: fs, s3", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self { path: "./staging".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

/// Destination dataset and table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub dataset: String,

    #[serde(default)]
    pub table: String,

    /// Root of the directory warehouse.
    #[serde(default = "default_warehouse_root")]
    pub root: String,
}

fn default_warehouse_root() -> String {
    "./warehouse".to_string()
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            dataset: String::new(),
            table: String::new(),
            root: default_warehouse_root(),
        }
    }
}

/// Logging configuration for the run binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Year derivation spans. Empty means "use the built-in table".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichConfig {
    #[serde(default)]
    pub year_spans: Vec<YearSpanEntry>,
}

/// One declared run of `rows` leading rows belonging to `year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSpanEntry {
    pub rows: usize,
    pub year: i32,
}

impl RuntimeConfig {
    /// Load from standard locations with graceful fallback to defaults,
    /// then apply environment overrides. Validation happens separately,
    /// after the caller has applied its own overrides.
    pub fn load_or_default() -> Result<Self> {
        sources::load_config()
    }

    /// Load from an explicit file path (CLI --config flag), then apply
    /// environment overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_backend_from_str() {
        assert_eq!("fs".parse::<StagingBackend>().unwrap(), StagingBackend::Fs);
        assert_eq!("filesystem".parse::<StagingBackend>().unwrap(), StagingBackend::Fs);
        assert_eq!("s3".parse::<StagingBackend>().unwrap(), StagingBackend::S3);
        assert_eq!("aws".parse::<StagingBackend>().unwrap(), StagingBackend::S3);
        assert!("gcs".parse::<StagingBackend>().is_err());
    }

    #[test]
    fn defaults_are_filesystem_oriented() {
        let config = RuntimeConfig::default();
        assert_eq!(config.staging.backend, StagingBackend::Fs);
        assert_eq!(config.staging.spool_dir, "./spool");
        assert_eq!(config.warehouse.root, "./warehouse");
        assert_eq!(config.runner.log_level, "info");
        assert!(config.enrich.year_spans.is_empty());
    }

    #[test]
    fn parses_full_config_file() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [source]
            base_url = "https://example.supabase.co/rest/v1"
            api_key = "anon-key"
            collection = "marketing"

            [staging]
            backend = "s3"
            spool_dir = "/tmp/spool"

            [staging.s3]
            bucket = "staging-bucket"
            region = "us-east-1"

            [warehouse]
            dataset = "campaigns"
            table = "outcomes"

            [runner]
            log_level = "debug"
            log_format = "json"

            [[enrich.year_spans]]
            rows = 2
            year = 2008

            [[enrich.year_spans]]
            rows = 1
            year = 2009
            "#,
        )
        .unwrap();

        assert_eq!(config.source.collection, "marketing");
        assert_eq!(config.staging.backend, StagingBackend::S3);
        assert_eq!(config.staging.s3.as_ref().unwrap().bucket, "staging-bucket");
        assert_eq!(config.warehouse.dataset, "campaigns");
        assert_eq!(config.runner.log_format, LogFormat::Json);
        assert_eq!(
            config.enrich.year_spans,
            vec![
                YearSpanEntry { rows: 2, year: 2008 },
                YearSpanEntry { rows: 1, year: 2009 }
            ]
        );
    }
}
