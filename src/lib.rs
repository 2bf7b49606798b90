// rows2warehouse - partitioned batch transfer pipeline
//
// Moves one collection from a remote tabular source into an analytical
// table: fetch -> enrich -> partition -> stage -> load. Staging and
// loading are idempotent, so the external scheduler may retry a failed
// run wholesale.

pub mod error;
pub mod graph;
pub mod init;
pub mod pipeline;

pub use error::RunError;
pub use graph::{GraphError, Task, TaskGraph};
pub use pipeline::{Pipeline, RunContext, RunState, RunSummary};
