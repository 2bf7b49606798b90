use thiserror::Error;

/// Schema violations detected during enrichment.
///
/// These indicate upstream drift (a dropped column, a changed row count)
/// and are not retryable: re-running the same input yields the same error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("row {row} is missing required column '{column}'")]
    MissingColumn { column: String, row: usize },

    #[error("row {row} has an empty month value")]
    EmptyMonth { row: usize },

    #[error("year span table covers {expected} rows but the source returned {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("year span table is empty")]
    EmptySpanTable,

    #[error("year span for year {year} covers zero rows")]
    EmptySpan { year: i32 },
}
