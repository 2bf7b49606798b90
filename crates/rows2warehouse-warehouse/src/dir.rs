// Directory warehouse: the reference `Warehouse` over an OpenDAL operator.
//
// Layout under the warehouse root:
//   {dataset}/                       dataset
//   {dataset}/{table}.csv            table snapshot, header row first
//   {dataset}/{table}.schema.json    inferred column types, when autodetected
//
// Bulk loads read staged objects from a second operator (the staging
// namespace), the same split a vendor warehouse has between its own
// storage and the load-from-storage URI.

use crate::error::WarehouseError;
use crate::infer::infer_schema;
use crate::pattern::matches_pattern;
use crate::{CreateDisposition, LoadOptions, LoadSummary, Warehouse, WriteDisposition};
use async_trait::async_trait;
use opendal::Operator;

pub struct DirWarehouse {
    warehouse: Operator,
    staging: Operator,
}

impl DirWarehouse {
    pub fn new(warehouse: Operator, staging: Operator) -> Self {
        Self { warehouse, staging }
    }

    fn table_path(dataset: &str, table: &str) -> String {
        format!("{}/{}.csv", dataset, table)
    }

    fn schema_path(dataset: &str, table: &str) -> String {
        format!("{}/{}.schema.json", dataset, table)
    }

    async fn exists(&self, path: &str) -> Result<bool, opendal::Error> {
        match self.warehouse.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read every staged object matching `pattern`, in sorted name order.
    async fn read_staged(
        &self,
        pattern: &str,
        skip_leading_rows: u32,
    ) -> Result<StagedRows, WarehouseError> {
        let entries = self.staging.list("").await.map_err(|source| {
            WarehouseError::ListObjects { pattern: pattern.to_string(), source }
        })?;

        let mut names: Vec<String> = entries
            .iter()
            .filter(|e| !e.metadata().is_dir())
            .map(|e| e.path().to_string())
            .filter(|name| matches_pattern(name, pattern))
            .collect();
        names.sort();

        let mut staged = StagedRows::default();
        for name in names {
            let data = self
                .staging
                .read(&name)
                .await
                .map_err(|source| WarehouseError::ReadObject { object: name.clone(), source })?
                .to_vec();

            let mut reader =
                csv::ReaderBuilder::new().has_headers(false).from_reader(data.as_slice());
            for (index, result) in reader.records().enumerate() {
                let record = result.map_err(|source| WarehouseError::Decode {
                    object: name.clone(),
                    source,
                })?;
                let row: Vec<String> = record.iter().map(str::to_string).collect();

                match &staged.header {
                    None => {}
                    Some(header) if header.len() == row.len() => {}
                    Some(header) => {
                        return Err(WarehouseError::ColumnCountMismatch {
                            object: name.clone(),
                            expected: header.len(),
                            actual: row.len(),
                        });
                    }
                }

                if (index as u32) < skip_leading_rows {
                    // The first skipped row of the first object is the header
                    // every other object must agree with.
                    if staged.header.is_none() {
                        staged.header = Some(row);
                    }
                } else {
                    if staged.header.is_none() {
                        staged.header = Some((0..row.len()).map(|i| format!("column_{}", i)).collect());
                    }
                    staged.rows.push(row);
                }
            }
            staged.objects += 1;
        }

        Ok(staged)
    }
}

#[derive(Default)]
struct StagedRows {
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    objects: usize,
}

#[async_trait]
impl Warehouse for DirWarehouse {
    async fn create_dataset_if_absent(&self, dataset: &str) -> Result<(), WarehouseError> {
        self.warehouse.create_dir(&format!("{}/", dataset)).await.map_err(|source| {
            WarehouseError::CreateDataset { dataset: dataset.to_string(), source }
        })?;
        tracing::debug!(dataset, "dataset ensured");
        Ok(())
    }

    async fn create_table_if_absent(
        &self,
        dataset: &str,
        table: &str,
    ) -> Result<(), WarehouseError> {
        let path = Self::table_path(dataset, table);
        let present = self.exists(&path).await.map_err(|source| WarehouseError::CreateTable {
            dataset: dataset.to_string(),
            table: table.to_string(),
            source,
        })?;
        if present {
            return Ok(());
        }

        self.warehouse.write(&path, Vec::<u8>::new()).await.map_err(|source| {
            WarehouseError::CreateTable {
                dataset: dataset.to_string(),
                table: table.to_string(),
                source,
            }
        })?;
        tracing::debug!(dataset, table, "created empty table");
        Ok(())
    }

    async fn bulk_load(
        &self,
        dataset: &str,
        table: &str,
        source_pattern: &str,
        options: &LoadOptions,
    ) -> Result<LoadSummary, WarehouseError> {
        let path = Self::table_path(dataset, table);
        let present = self.exists(&path).await.map_err(|source| WarehouseError::CreateTable {
            dataset: dataset.to_string(),
            table: table.to_string(),
            source,
        })?;
        if !present {
            match options.create_disposition {
                CreateDisposition::CreateIfNeeded => {
                    self.create_dataset_if_absent(dataset).await?;
                    self.create_table_if_absent(dataset, table).await?;
                }
                CreateDisposition::Never => {
                    return Err(WarehouseError::TableMissing {
                        dataset: dataset.to_string(),
                        table: table.to_string(),
                    });
                }
            }
        }

        let staged = self.read_staged(source_pattern, options.skip_leading_rows).await?;
        if staged.objects == 0 {
            tracing::warn!(pattern = source_pattern, "no staged objects matched the load pattern");
        }

        let mut snapshot: Vec<Vec<String>> = Vec::new();
        if options.write_disposition == WriteDisposition::Append {
            let existing = self
                .warehouse
                .read(&path)
                .await
                .map_err(|source| WarehouseError::ReadObject { object: path.clone(), source })?
                .to_vec();
            let mut reader =
                csv::ReaderBuilder::new().has_headers(false).from_reader(existing.as_slice());
            for (index, result) in reader.records().enumerate() {
                let record = result.map_err(|source| WarehouseError::Decode {
                    object: path.clone(),
                    source,
                })?;
                // The stored snapshot leads with its own header row.
                if index == 0 && staged.header.is_some() {
                    continue;
                }
                snapshot.push(record.iter().map(str::to_string).collect());
            }
        }
        snapshot.extend(staged.rows.iter().cloned());

        let body = encode_snapshot(dataset, table, staged.header.as_deref(), &snapshot)?;
        self.warehouse.write(&path, body).await.map_err(|source| {
            WarehouseError::WriteTable {
                dataset: dataset.to_string(),
                table: table.to_string(),
                source,
            }
        })?;

        if options.autodetect_schema {
            if let Some(header) = &staged.header {
                let schema = infer_schema(header, &staged.rows);
                let json = serde_json::to_vec_pretty(&schema).unwrap_or_default();
                self.warehouse
                    .write(&Self::schema_path(dataset, table), json)
                    .await
                    .map_err(|source| WarehouseError::WriteTable {
                        dataset: dataset.to_string(),
                        table: table.to_string(),
                        source,
                    })?;
            }
        }

        let summary = LoadSummary {
            objects_loaded: staged.objects,
            rows_loaded: staged.rows.len(),
        };
        tracing::info!(
            dataset,
            table,
            objects = summary.objects_loaded,
            rows = summary.rows_loaded,
            "bulk load complete"
        );
        Ok(summary)
    }
}

fn encode_snapshot(
    dataset: &str,
    table: &str,
    header: Option<&[String]>,
    rows: &[Vec<String>],
) -> Result<Vec<u8>, WarehouseError> {
    let encode_error = |source| WarehouseError::Encode {
        dataset: dataset.to_string(),
        table: table.to_string(),
        source,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    if let Some(header) = header {
        writer.write_record(header).map_err(encode_error)?;
    }
    for row in rows {
        writer.write_record(row).map_err(encode_error)?;
    }
    writer
        .into_inner()
        .map_err(|e| encode_error(csv::Error::from(e.into_error())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_operator() -> Operator {
        Operator::new(opendal::services::Memory::default()).unwrap().finish()
    }

    async fn stage_object(staging: &Operator, name: &str, body: &str) {
        staging.write(name, body.as_bytes().to_vec()).await.unwrap();
    }

    async fn table_lines(warehouse: &Operator, path: &str) -> Vec<String> {
        let body = warehouse.read(path).await.unwrap().to_vec();
        String::from_utf8(body).unwrap().lines().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn creates_dataset_and_table_idempotently() {
        let wh = memory_operator();
        let warehouse = DirWarehouse::new(wh.clone(), memory_operator());

        warehouse.create_dataset_if_absent("campaigns").await.unwrap();
        warehouse.create_dataset_if_absent("campaigns").await.unwrap();
        warehouse.create_table_if_absent("campaigns", "outcomes").await.unwrap();
        warehouse.create_table_if_absent("campaigns", "outcomes").await.unwrap();

        assert!(wh.stat("campaigns/outcomes.csv").await.is_ok());
    }

    #[tokio::test]
    async fn bulk_load_merges_matching_objects_and_skips_headers() {
        let staging = memory_operator();
        stage_object(&staging, "output_Mar_2008.csv", "month,year\nMar,2008\nMar,2008\n").await;
        stage_object(&staging, "output_Apr_2008.csv", "month,year\nApr,2008\n").await;
        stage_object(&staging, "scratch.txt", "not a staged object").await;

        let wh = memory_operator();
        let warehouse = DirWarehouse::new(wh.clone(), staging);

        let summary = warehouse
            .bulk_load("campaigns", "outcomes", "output_*.csv", &LoadOptions::default())
            .await
            .unwrap();

        assert_eq!(summary, LoadSummary { objects_loaded: 2, rows_loaded: 3 });

        let lines = table_lines(&wh, "campaigns/outcomes.csv").await;
        assert_eq!(lines[0], "month,year");
        assert_eq!(lines.len(), 4);
        // Objects merge in sorted name order.
        assert_eq!(lines[1], "Apr,2008");
    }

    #[tokio::test]
    async fn repeated_loads_do_not_accumulate_rows() {
        let staging = memory_operator();
        stage_object(&staging, "output_Mar_2008.csv", "month,year\nMar,2008\n").await;

        let wh = memory_operator();
        let warehouse = DirWarehouse::new(wh.clone(), staging);
        let options = LoadOptions::default();

        warehouse.bulk_load("campaigns", "outcomes", "output_*.csv", &options).await.unwrap();
        warehouse.bulk_load("campaigns", "outcomes", "output_*.csv", &options).await.unwrap();

        let lines = table_lines(&wh, "campaigns/outcomes.csv").await;
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn append_disposition_accumulates() {
        let staging = memory_operator();
        stage_object(&staging, "output_Mar_2008.csv", "month,year\nMar,2008\n").await;

        let wh = memory_operator();
        let warehouse = DirWarehouse::new(wh.clone(), staging);
        let options = LoadOptions { write_disposition: WriteDisposition::Append, ..Default::default() };

        warehouse.bulk_load("campaigns", "outcomes", "output_*.csv", &options).await.unwrap();
        warehouse.bulk_load("campaigns", "outcomes", "output_*.csv", &options).await.unwrap();

        let lines = table_lines(&wh, "campaigns/outcomes.csv").await;
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn zero_matching_objects_leaves_an_empty_table() {
        let wh = memory_operator();
        let warehouse = DirWarehouse::new(wh.clone(), memory_operator());

        let summary = warehouse
            .bulk_load("campaigns", "outcomes", "output_*.csv", &LoadOptions::default())
            .await
            .unwrap();

        assert_eq!(summary, LoadSummary { objects_loaded: 0, rows_loaded: 0 });
        assert!(table_lines(&wh, "campaigns/outcomes.csv").await.is_empty());
    }

    #[tokio::test]
    async fn missing_table_without_create_disposition_fails() {
        let warehouse = DirWarehouse::new(memory_operator(), memory_operator());
        let options =
            LoadOptions { create_disposition: CreateDisposition::Never, ..Default::default() };

        let err = warehouse
            .bulk_load("campaigns", "outcomes", "output_*.csv", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, WarehouseError::TableMissing { .. }));
    }

    #[tokio::test]
    async fn autodetect_writes_the_schema_sidecar() {
        let staging = memory_operator();
        stage_object(&staging, "output_Mar_2008.csv", "age,month\n41,Mar\n29,Mar\n").await;

        let wh = memory_operator();
        let warehouse = DirWarehouse::new(wh.clone(), staging);

        warehouse
            .bulk_load("campaigns", "outcomes", "output_*.csv", &LoadOptions::default())
            .await
            .unwrap();

        let body = wh.read("campaigns/outcomes.schema.json").await.unwrap().to_vec();
        let schema: Vec<crate::Field> = serde_json::from_slice(&body).unwrap();
        assert_eq!(schema[0].name, "age");
        assert_eq!(schema[0].field_type, crate::FieldType::Integer);
        assert_eq!(schema[1].field_type, crate::FieldType::String);
    }

    #[tokio::test]
    async fn column_count_drift_across_objects_is_rejected() {
        let staging = memory_operator();
        stage_object(&staging, "output_Mar_2008.csv", "month,year\nMar,2008\n").await;
        stage_object(&staging, "output_Apr_2008.csv", "month\nApr\n").await;

        let warehouse = DirWarehouse::new(memory_operator(), staging);
        let err = warehouse
            .bulk_load("campaigns", "outcomes", "output_*.csv", &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WarehouseError::ColumnCountMismatch { .. }));
    }
}
