// rows2warehouse-source - Source reader
//
// Pulls the complete current contents of one collection from the upstream
// tabular source. No pagination: the upstream returns everything
// requested, and anything less fails the whole run before any partition
// work starts.

mod error;
mod memory;
mod rest;

use async_trait::async_trait;
use rows2warehouse_core::Record;

pub use error::SourceError;
pub use memory::StaticSource;
pub use rest::RestSource;

/// Query capability over the upstream source.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Retrieve the complete current contents of `collection`, in the
    /// upstream's order.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, SourceError>;
}
