// Pipeline assembly.
//
// Walks the task graph and carries one run through
// FETCHED -> ENRICHED -> PARTITIONED -> STAGED -> LOADED. Transitions are
// all-or-nothing: staging only counts once every partition is uploaded,
// loading only once the bulk load reports success. Each stage is also
// callable on its own, so a scheduler (or a test) can drive them
// individually.

use chrono::{DateTime, Utc};
use rows2warehouse_core::{
    partition_by_month_year, EnrichedRecord, PartitionMap, Record, YearSpanTable,
    STAGED_OBJECT_PATTERN,
};
use rows2warehouse_source::SourceReader;
use rows2warehouse_stage::{StagedObject, Stager};
use rows2warehouse_warehouse::{LoadOptions, LoadSummary, Warehouse};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RunError;
use crate::graph::{Task, TaskGraph};

/// Run identity, owned by whoever triggered the run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub triggered_at: DateTime<Utc>,
    pub collection: String,
}

impl RunContext {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            triggered_at: Utc::now(),
            collection: collection.into(),
        }
    }
}

/// States a run moves through. No partial-commit state exists between
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Fetched,
    Enriched,
    Partitioned,
    Staged,
    Loaded,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Fetched => "FETCHED",
            RunState::Enriched => "ENRICHED",
            RunState::Partitioned => "PARTITIONED",
            RunState::Staged => "STAGED",
            RunState::Loaded => "LOADED",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub state: RunState,
    pub rows_fetched: usize,
    pub partitions: usize,
    pub objects_staged: usize,
    pub rows_loaded: usize,
}

/// One run's worth of clients and settings, constructed per run and
/// passed in; nothing here is process-global.
pub struct Pipeline {
    source: Arc<dyn SourceReader>,
    spans: YearSpanTable,
    stager: Stager,
    warehouse: Arc<dyn Warehouse>,
    dataset: String,
    table: String,
    graph: TaskGraph,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn SourceReader>,
        spans: YearSpanTable,
        stager: Stager,
        warehouse: Arc<dyn Warehouse>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            source,
            spans,
            stager,
            warehouse,
            dataset: dataset.into(),
            table: table.into(),
            graph: TaskGraph::linear(),
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Execute the whole run, stages in graph order.
    pub async fn run(&self, ctx: &RunContext) -> Result<RunSummary, RunError> {
        let order = self.graph.execution_order()?;
        tracing::info!(
            run_id = %ctx.run_id,
            collection = %ctx.collection,
            triggered_at = %ctx.triggered_at,
            "starting run"
        );

        let mut progress = Progress::default();
        for task in order {
            let state = match task {
                Task::Fetch => {
                    progress.records = self.fetch(ctx).await?;
                    RunState::Fetched
                }
                Task::Enrich => {
                    progress.enriched = self.enrich(&progress.records)?;
                    RunState::Enriched
                }
                Task::Partition => {
                    progress.partitions = self.partition(std::mem::take(&mut progress.enriched));
                    RunState::Partitioned
                }
                Task::Stage => {
                    progress.staged = self.stage(&progress.partitions).await?;
                    RunState::Staged
                }
                Task::Load => {
                    progress.loaded = Some(self.load().await?);
                    RunState::Loaded
                }
            };
            tracing::info!(run_id = %ctx.run_id, state = %state, "state reached");
        }

        Ok(RunSummary {
            run_id: ctx.run_id,
            state: RunState::Loaded,
            rows_fetched: progress.records.len(),
            partitions: progress.partitions.len(),
            objects_staged: progress.staged.len(),
            rows_loaded: progress.loaded.map(|l| l.rows_loaded).unwrap_or(0),
        })
    }

    /// Pull the complete collection from the source.
    pub async fn fetch(&self, ctx: &RunContext) -> Result<Vec<Record>, RunError> {
        Ok(self.source.fetch_all(&ctx.collection).await?)
    }

    /// Derive years, normalize months, project into canonical order.
    ///
    /// An empty fetch enriches to nothing; the span table only constrains
    /// non-empty collections, so an empty source still truncates the
    /// destination downstream instead of failing.
    pub fn enrich(&self, records: &[Record]) -> Result<Vec<EnrichedRecord>, RunError> {
        if records.is_empty() {
            tracing::warn!("source collection is empty");
            return Ok(Vec::new());
        }
        Ok(rows2warehouse_core::enrich(records, &self.spans)?)
    }

    /// Group enriched records by (month, year).
    pub fn partition(&self, enriched: Vec<EnrichedRecord>) -> PartitionMap {
        partition_by_month_year(enriched)
    }

    /// Upload every partition to the intermediate store.
    pub async fn stage(&self, partitions: &PartitionMap) -> Result<Vec<StagedObject>, RunError> {
        Ok(self.stager.stage_all(partitions).await?)
    }

    /// Ensure dataset and table, then bulk-load all staged objects.
    pub async fn load(&self) -> Result<LoadSummary, RunError> {
        self.warehouse.create_dataset_if_absent(&self.dataset).await?;
        self.warehouse.create_table_if_absent(&self.dataset, &self.table).await?;
        let summary = self
            .warehouse
            .bulk_load(&self.dataset, &self.table, STAGED_OBJECT_PATTERN, &LoadOptions::default())
            .await?;
        Ok(summary)
    }
}

#[derive(Default)]
struct Progress {
    records: Vec<Record>,
    enriched: Vec<EnrichedRecord>,
    partitions: PartitionMap,
    staged: Vec<StagedObject>,
    loaded: Option<LoadSummary>,
}
