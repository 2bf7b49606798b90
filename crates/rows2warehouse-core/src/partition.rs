// Partitioning by (month, year) and the staged object naming scheme.
//
// Object names are deterministic, so re-running the pipeline overwrites
// the previous run's objects instead of accumulating new ones.

use std::collections::BTreeMap;
use std::fmt;

use crate::enrich::EnrichedRecord;

/// Glob pattern matching every staged object of a run.
pub const STAGED_OBJECT_PATTERN: &str = "output_*.csv";

/// Grouping key for one partition. Equality is exact and case-sensitive
/// on the normalized month string and the stringified year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub month: String,
    pub year: String,
}

impl PartitionKey {
    pub fn new(month: impl Into<String>, year: impl Into<String>) -> Self {
        Self { month: month.into(), year: year.into() }
    }

    /// Deterministic staged object name for this partition.
    pub fn object_name(&self) -> String {
        format!("output_{}_{}.csv", self.month, self.year)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.month, self.year)
    }
}

/// Partitions in deterministic (sorted-key) iteration order.
pub type PartitionMap = BTreeMap<PartitionKey, Vec<EnrichedRecord>>;

/// Group enriched records by (month, year).
///
/// Partitions are disjoint and their union is the input set; membership
/// order inside a partition preserves input order.
pub fn partition_by_month_year(records: Vec<EnrichedRecord>) -> PartitionMap {
    let mut partitions = PartitionMap::new();
    for record in records {
        let key = PartitionKey::new(record.month(), record.year());
        partitions.entry(key).or_default().push(record);
    }

    tracing::debug!(partitions = partitions.len(), "partitioned record set");
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{enrich, YearSpan, YearSpanTable};
    use crate::record::Record;
    use serde_json::json;

    fn record(month: &str, age: u32) -> Record {
        serde_json::from_value(json!({
            "age": age, "job": "services", "marital": "single",
            "education": "high.school", "default": "no", "housing": "no",
            "loan": "no", "contact": "telephone", "month": month,
            "day_of_week": "fri", "duration": 90, "campaign": 2,
            "pdays": 999, "previous": 0, "poutcome": "nonexistent",
            "emp.var.rate": -1.8, "cons.price.idx": 92.893,
            "cons.conf.idx": -46.2, "euribor3m": 1.313,
            "nr.employed": 5099.1, "y": "yes",
        }))
        .unwrap()
    }

    fn enriched(months: &[&str], year: i32) -> Vec<EnrichedRecord> {
        let records: Vec<Record> =
            months.iter().enumerate().map(|(i, m)| record(m, 20 + i as u32)).collect();
        let table = YearSpanTable::new(vec![YearSpan::new(records.len(), year)]).unwrap();
        enrich(&records, &table).unwrap()
    }

    #[test]
    fn groups_by_month_and_year() {
        let partitions = partition_by_month_year(enriched(&["mar", "apr", "mar"], 2008));

        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[&PartitionKey::new("Mar", "2008")].len(), 2);
        assert_eq!(partitions[&PartitionKey::new("Apr", "2008")].len(), 1);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let input = enriched(&["mar", "apr", "mar", "jun", "apr"], 2009);
        let total = input.len();
        let partitions = partition_by_month_year(input.clone());

        let mut reassembled: Vec<EnrichedRecord> =
            partitions.values().flatten().cloned().collect();
        assert_eq!(reassembled.len(), total);

        // Every input record appears exactly once across all partitions.
        for record in &input {
            let position = reassembled.iter().position(|r| r == record).unwrap();
            reassembled.remove(position);
        }
        assert!(reassembled.is_empty());
    }

    #[test]
    fn membership_preserves_input_order() {
        let input = enriched(&["mar", "apr", "mar"], 2008);
        let partitions = partition_by_month_year(input.clone());

        let mar = &partitions[&PartitionKey::new("Mar", "2008")];
        assert_eq!(mar[0], input[0]);
        assert_eq!(mar[1], input[2]);
    }

    #[test]
    fn empty_input_yields_no_partitions() {
        assert!(partition_by_month_year(Vec::new()).is_empty());
    }

    #[test]
    fn object_names_are_deterministic() {
        let key = PartitionKey::new("Mar", "2008");
        assert_eq!(key.object_name(), "output_Mar_2008.csv");
        assert_eq!(key.to_string(), "Mar_2008");
    }
}
