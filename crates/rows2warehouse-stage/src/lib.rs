// rows2warehouse-stage - Partition staging
//
// Serializes each partition to a CSV spool file, uploads it to the
// intermediate object store under its deterministic name, and removes the
// spool file on every exit path. Re-running with identical partitions
// overwrites the prior objects; that overwrite is the pipeline's
// idempotency guarantee.

mod error;
mod spool;

use opendal::Operator;
use rows2warehouse_core::schema::CANONICAL_COLUMNS;
use rows2warehouse_core::{EnrichedRecord, PartitionKey, PartitionMap};
use std::path::PathBuf;

pub use error::StageError;

use spool::SpoolFile;

/// Uploads serialized partitions to the intermediate object store.
pub struct Stager {
    operator: Operator,
    spool_dir: PathBuf,
}

/// One uploaded partition object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub name: String,
    pub rows: usize,
    pub bytes: u64,
}

impl Stager {
    pub fn new(operator: Operator, spool_dir: impl Into<PathBuf>) -> Self {
        Self { operator, spool_dir: spool_dir.into() }
    }

    /// Stage every partition, in deterministic key order.
    ///
    /// The first failed upload aborts the run; objects staged before the
    /// failure remain in place and are overwritten by the next run.
    pub async fn stage_all(&self, partitions: &PartitionMap) -> Result<Vec<StagedObject>, StageError> {
        let mut staged = Vec::with_capacity(partitions.len());
        for (key, records) in partitions {
            staged.push(self.stage_partition(key, records).await?);
        }
        Ok(staged)
    }

    /// Serialize one partition to a local spool file, upload it, and
    /// remove the local copy regardless of the upload outcome.
    pub async fn stage_partition(
        &self,
        key: &PartitionKey,
        records: &[EnrichedRecord],
    ) -> Result<StagedObject, StageError> {
        let name = key.object_name();

        std::fs::create_dir_all(&self.spool_dir).map_err(|source| StageError::Spool {
            partition: key.to_string(),
            source,
        })?;

        // Removed on drop, including every early return below.
        let spool = SpoolFile::new(self.spool_dir.join(&name));

        write_partition_csv(spool.path(), records).map_err(|source| StageError::Serialize {
            partition: key.to_string(),
            source,
        })?;

        let data = tokio::fs::read(spool.path()).await.map_err(|source| StageError::Spool {
            partition: key.to_string(),
            source,
        })?;
        let bytes = data.len() as u64;

        self.operator
            .write(&name, data)
            .await
            .map_err(|source| StageError::Upload { object: name.clone(), source })?;

        tracing::info!(object = %name, rows = records.len(), bytes, "staged partition");
        Ok(StagedObject { name, rows: records.len(), bytes })
    }
}

fn write_partition_csv(path: &std::path::Path, records: &[EnrichedRecord]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CANONICAL_COLUMNS)?;
    for record in records {
        writer.write_record(record.values())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rows2warehouse_core::{enrich, partition_by_month_year, Record, YearSpan, YearSpanTable};
    use serde_json::json;

    fn record(month: &str, age: u32) -> Record {
        serde_json::from_value(json!({
            "age": age, "job": "admin.", "marital": "married",
            "education": "university.degree", "default": "no",
            "housing": "yes", "loan": "no", "contact": "cellular",
            "month": month, "day_of_week": "thu", "duration": 180,
            "campaign": 1, "pdays": 999, "previous": 0,
            "poutcome": "nonexistent", "emp.var.rate": 1.4,
            "cons.price.idx": 93.444, "cons.conf.idx": -36.1,
            "euribor3m": 4.963, "nr.employed": 5228.1, "y": "no",
        }))
        .unwrap()
    }

    fn partitions(months: &[&str], year: i32) -> PartitionMap {
        let records: Vec<Record> =
            months.iter().enumerate().map(|(i, m)| record(m, 30 + i as u32)).collect();
        let table = YearSpanTable::new(vec![YearSpan::new(records.len(), year)]).unwrap();
        partition_by_month_year(enrich(&records, &table).unwrap())
    }

    fn memory_operator() -> Operator {
        Operator::new(opendal::services::Memory::default()).unwrap().finish()
    }

    #[tokio::test]
    async fn stages_each_partition_under_its_deterministic_name() {
        let spool = tempfile::tempdir().unwrap();
        let operator = memory_operator();
        let stager = Stager::new(operator.clone(), spool.path());

        let staged = stager.stage_all(&partitions(&["mar", "apr", "mar"], 2008)).await.unwrap();

        let names: Vec<&str> = staged.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["output_Apr_2008.csv", "output_Mar_2008.csv"]);
        assert_eq!(staged[1].rows, 2);

        let body = operator.read("output_Mar_2008.csv").await.unwrap().to_vec();
        let text = String::from_utf8(body).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("age,job,marital"));
        assert_eq!(lines.count(), 2);
    }

    #[tokio::test]
    async fn restaging_overwrites_with_latest_content() {
        let spool = tempfile::tempdir().unwrap();
        let operator = memory_operator();
        let stager = Stager::new(operator.clone(), spool.path());

        stager.stage_all(&partitions(&["mar", "mar"], 2008)).await.unwrap();
        stager.stage_all(&partitions(&["mar"], 2008)).await.unwrap();

        let body = operator.read("output_Mar_2008.csv").await.unwrap().to_vec();
        let text = String::from_utf8(body).unwrap();
        // One header row plus the single row of the latest run.
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn spool_file_is_removed_after_success() {
        let spool = tempfile::tempdir().unwrap();
        let stager = Stager::new(memory_operator(), spool.path());

        stager.stage_all(&partitions(&["jun"], 2009)).await.unwrap();

        assert!(!spool.path().join("output_Jun_2009.csv").exists());
    }

    #[tokio::test]
    async fn failed_upload_surfaces_and_still_cleans_the_spool() {
        let spool = tempfile::tempdir().unwrap();

        // Root the fs operator at a regular file so every write fails.
        let scratch = tempfile::tempdir().unwrap();
        let blocked = scratch.path().join("not-a-directory");
        std::fs::write(&blocked, b"x").unwrap();
        let operator = Operator::new(
            opendal::services::Fs::default().root(blocked.to_str().unwrap()),
        )
        .unwrap()
        .finish();

        let stager = Stager::new(operator, spool.path());
        let err = stager.stage_all(&partitions(&["jul"], 2009)).await.unwrap_err();

        assert!(matches!(err, StageError::Upload { .. }));
        assert!(!spool.path().join("output_Jul_2009.csv").exists());
    }

    #[tokio::test]
    async fn staging_no_partitions_is_a_no_op() {
        let spool = tempfile::tempdir().unwrap();
        let operator = memory_operator();
        let stager = Stager::new(operator.clone(), spool.path());

        let staged = stager.stage_all(&PartitionMap::new()).await.unwrap();
        assert!(staged.is_empty());

        let entries = operator.list("").await.unwrap();
        assert!(entries.iter().all(|e| e.metadata().is_dir()));
    }
}
