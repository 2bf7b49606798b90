use thiserror::Error;

/// Failures while staging a partition.
///
/// Staging never skips a partition: the first failure aborts the run.
/// A whole-run retry is safe because object names are deterministic and
/// uploads overwrite.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to serialize partition '{partition}': {source}")]
    Serialize {
        partition: String,
        #[source]
        source: csv::Error,
    },

    #[error("spool file error for partition '{partition}': {source}")]
    Spool {
        partition: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload of staged object '{object}' failed: {source}")]
    Upload {
        object: String,
        #[source]
        source: opendal::Error,
    },
}
