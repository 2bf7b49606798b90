use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the source collection, exactly as fetched.
///
/// Kept as a loose JSON object so schema validation happens during
/// enrichment, where a missing column can be reported with its row index,
/// rather than failing opaquely inside deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Render a JSON value as a CSV cell.
///
/// Strings are taken verbatim (no quotes), null becomes the empty cell,
/// everything else uses its compact JSON form.
pub(crate) fn render_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
