// Run-level error taxonomy.
//
// Every stage failure surfaces here; no stage continues with partial
// data. The scheduler that invoked the run decides whether to retry, so
// each variant carries a retryability classification: fetch, stage, and
// load failures are safe to retry wholesale (staging and loading are
// idempotent), schema drift is not.

use rows2warehouse_core::SchemaError;
use rows2warehouse_source::SourceError;
use rows2warehouse_stage::StageError;
use rows2warehouse_warehouse::WarehouseError;
use thiserror::Error;

use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),

    #[error("staging failed: {0}")]
    Stage(#[from] StageError),

    #[error("load failed: {0}")]
    Load(#[from] WarehouseError),

    #[error("invalid task graph: {0}")]
    Plan(#[from] GraphError),
}

impl RunError {
    /// Whether re-running the whole pipeline can succeed without a fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            RunError::Fetch(_) | RunError::Stage(_) | RunError::Load(_) => true,
            RunError::Schema(_) | RunError::Plan(_) => false,
        }
    }

    /// The failed stage, for log classification.
    pub fn stage(&self) -> &'static str {
        match self {
            RunError::Fetch(_) => "fetch",
            RunError::Schema(_) => "enrich",
            RunError::Stage(_) => "stage",
            RunError::Load(_) => "load",
            RunError::Plan(_) => "plan",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_are_not_retryable() {
        let err = RunError::Schema(SchemaError::MissingColumn {
            column: "duration".to_string(),
            row: 7,
        });
        assert!(!err.is_retryable());
        assert_eq!(err.stage(), "enrich");
    }

    #[test]
    fn fetch_errors_are_retryable() {
        let err = RunError::Fetch(SourceError::Status {
            collection: "marketing".to_string(),
            status: 503,
        });
        assert!(err.is_retryable());
        assert_eq!(err.stage(), "fetch");
    }
}
