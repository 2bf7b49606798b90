use thiserror::Error;

/// Failures in the destination warehouse.
///
/// Dataset/table creation failures and load failures both abort the run.
/// A whole-run retry is safe because loads truncate and replace.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("failed to create dataset '{dataset}': {source}")]
    CreateDataset {
        dataset: String,
        #[source]
        source: opendal::Error,
    },

    #[error("failed to create table '{dataset}.{table}': {source}")]
    CreateTable {
        dataset: String,
        table: String,
        #[source]
        source: opendal::Error,
    },

    #[error("table '{dataset}.{table}' does not exist and the load may not create it")]
    TableMissing { dataset: String, table: String },

    #[error("failed to list staged objects for pattern '{pattern}': {source}")]
    ListObjects {
        pattern: String,
        #[source]
        source: opendal::Error,
    },

    #[error("failed to read staged object '{object}': {source}")]
    ReadObject {
        object: String,
        #[source]
        source: opendal::Error,
    },

    #[error("staged object '{object}' is not decodable as delimited text: {source}")]
    Decode {
        object: String,
        #[source]
        source: csv::Error,
    },

    #[error("staged object '{object}' has {actual} columns, other objects have {expected}")]
    ColumnCountMismatch {
        object: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to serialize table '{dataset}.{table}': {source}")]
    Encode {
        dataset: String,
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write table '{dataset}.{table}': {source}")]
    WriteTable {
        dataset: String,
        table: String,
        #[source]
        source: opendal::Error,
    },
}
