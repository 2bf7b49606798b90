use thiserror::Error;

/// Failures while fetching the source collection.
///
/// All of these abort the run before any partitioning happens; a whole-run
/// retry is safe because nothing has been written yet.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to construct HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("request to source for '{collection}' failed: {source}")]
    Request {
        collection: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("source returned status {status} for '{collection}'")]
    Status { collection: String, status: u16 },

    #[error("source returned a malformed body for '{collection}': {message}")]
    Malformed { collection: String, message: String },
}
