// rows2warehouse-core - Record enrichment and partitioning
//
// Pure transform logic, no I/O:
// - Record: one source row as fetched (loose JSON object)
// - enrich: year derivation, month normalization, canonical column projection
// - partition: grouping by (month, year)

mod enrich;
mod error;
mod partition;
mod record;
pub mod schema;

pub use enrich::{enrich, EnrichedRecord, YearSpan, YearSpanTable};
pub use error::SchemaError;
pub use partition::{partition_by_month_year, PartitionKey, PartitionMap, STAGED_OBJECT_PATTERN};
pub use record::Record;
