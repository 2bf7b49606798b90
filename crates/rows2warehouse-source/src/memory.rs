// In-memory source for tests and offline runs.

use crate::error::SourceError;
use crate::SourceReader;
use async_trait::async_trait;
use rows2warehouse_core::Record;

pub struct StaticSource {
    records: Vec<Record>,
}

impl StaticSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl SourceReader for StaticSource {
    async fn fetch_all(&self, _collection: &str) -> Result<Vec<Record>, SourceError> {
        Ok(self.records.clone())
    }
}
