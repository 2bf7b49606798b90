// Column type inference for autodetected load schemas.
//
// Mirrors warehouse autodetection: every cell of a column votes for the
// narrowest type it parses as, and the column takes the widest vote.
// Integer widens to Float widens to String; Bool only survives if every
// non-empty cell is a boolean literal. Empty cells vote for nothing.

use serde::{Deserialize, Serialize};

/// One column of an inferred table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Bool,
    Integer,
    Float,
    String,
}

/// Infer a schema from a header and the data rows beneath it.
///
/// A column whose cells are all empty falls back to String.
pub fn infer_schema(header: &[String], rows: &[Vec<String>]) -> Vec<Field> {
    header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let mut column_type: Option<FieldType> = None;
            for row in rows {
                let cell = row.get(index).map(String::as_str).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                let cell_type = cell_type(cell);
                column_type = Some(match column_type {
                    None => cell_type,
                    Some(current) => widen(current, cell_type),
                });
            }
            Field {
                name: name.clone(),
                field_type: column_type.unwrap_or(FieldType::String),
            }
        })
        .collect()
}

fn cell_type(cell: &str) -> FieldType {
    if cell == "true" || cell == "false" {
        FieldType::Bool
    } else if cell.parse::<i64>().is_ok() {
        FieldType::Integer
    } else if cell.parse::<f64>().is_ok() {
        FieldType::Float
    } else {
        FieldType::String
    }
}

fn widen(a: FieldType, b: FieldType) -> FieldType {
    use FieldType::*;
    match (a, b) {
        (x, y) if x == y => x,
        (Integer, Float) | (Float, Integer) => Float,
        _ => String,
    }
}
