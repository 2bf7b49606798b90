// rows2warehouse-warehouse - Destination warehouse
//
// The warehouse is an opaque capability provider behind the `Warehouse`
// trait: ensure a dataset, ensure a table, bulk-load staged objects
// matching a pattern. `DirWarehouse` is the reference implementation over
// an OpenDAL operator; a vendor-backed implementation plugs in behind the
// same trait.

mod dir;
mod error;
mod infer;
mod pattern;

use async_trait::async_trait;

pub use dir::DirWarehouse;
pub use error::WarehouseError;
pub use infer::{infer_schema, Field, FieldType};
pub use pattern::matches_pattern;

/// Bulk load behavior.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Rows to skip at the top of every staged object (the header).
    pub skip_leading_rows: u32,

    /// Infer column types from the staged content and record them next to
    /// the table.
    pub autodetect_schema: bool,

    pub write_disposition: WriteDisposition,

    pub create_disposition: CreateDisposition,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            skip_leading_rows: 1,
            autodetect_schema: true,
            write_disposition: WriteDisposition::Truncate,
            create_disposition: CreateDisposition::CreateIfNeeded,
        }
    }
}

/// What happens to existing table contents on load.
///
/// `Truncate` is the default: repeated loads of the same staged objects
/// must not accumulate duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    Truncate,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDisposition {
    CreateIfNeeded,
    Never,
}

/// Outcome of one bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub objects_loaded: usize,
    pub rows_loaded: usize,
}

/// Destination warehouse capability.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Create the dataset if it does not exist; no-op if present.
    async fn create_dataset_if_absent(&self, dataset: &str) -> Result<(), WarehouseError>;

    /// Create an empty table if it does not exist; no-op if present.
    async fn create_table_if_absent(&self, dataset: &str, table: &str)
        -> Result<(), WarehouseError>;

    /// Load every staged object matching `source_pattern` into the table.
    async fn bulk_load(
        &self,
        dataset: &str,
        table: &str,
        source_pattern: &str,
        options: &LoadOptions,
    ) -> Result<LoadSummary, WarehouseError>;
}
