//! SQLite value mapping.
//!
//! SQLite is dynamically typed: the declared column type is only an affinity
//! hint and expression columns (`COUNT(*)`, `a || b`) have none at all. Values
//! are therefore decoded by the storage class of each individual value.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies a storage class or declared type name
//! 2. `decode_column` extracts the value for that category

use crate::models::ColumnMetadata;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for SQLite values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Null,
    Integer,
    Float,
    Text,
    Binary,
}

/// Classify a storage class or declared type name, following SQLite's affinity rules.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.to_uppercase();

    if upper == "NULL" {
        return TypeCategory::Null;
    }
    if upper.contains("INT") {
        return TypeCategory::Integer;
    }
    if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        return TypeCategory::Text;
    }
    if upper.is_empty() || upper.contains("BLOB") {
        return TypeCategory::Binary;
    }
    if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        return TypeCategory::Float;
    }
    // NUMERIC affinity (DECIMAL, BOOLEAN, DATE, ...) holds integers or reals;
    // the per-value storage class decides, here we only need a fallback.
    TypeCategory::Text
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode binary data to JSON value.
///
/// If `decode_binary` is true, attempts to decode as UTF-8 text first.
/// Falls back to base64 encoding if not valid UTF-8 or if `decode_binary` is false.
pub fn decode_binary_value(bytes: &[u8], decode_binary: bool) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    if decode_binary {
        match std::str::from_utf8(bytes) {
            Ok(s) => JsonValue::String(s.to_string()),
            Err(_) => JsonValue::String(STANDARD.encode(bytes)),
        }
    } else {
        JsonValue::String(STANDARD.encode(bytes))
    }
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Trait for converting database rows to ordered value lists.
pub trait RowToValues {
    fn to_values(&self, decode_binary: bool) -> Vec<JsonValue>;
    fn column_metadata(&self) -> Vec<ColumnMetadata>;
}

impl RowToValues for SqliteRow {
    fn to_values(&self, decode_binary: bool) -> Vec<JsonValue> {
        (0..self.columns().len())
            .map(|idx| decode_column(self, idx, decode_binary))
            .collect()
    }

    fn column_metadata(&self) -> Vec<ColumnMetadata> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let declared = col.type_info().name().to_string();
                let type_name = if declared == "NULL" {
                    storage_class(self, idx).unwrap_or_default()
                } else {
                    declared
                };
                ColumnMetadata::new(col.name(), type_name)
            })
            .collect()
    }
}

/// Storage class of the value at `idx` ("INTEGER", "REAL", "TEXT", "BLOB", "NULL").
fn storage_class(row: &SqliteRow, idx: usize) -> Option<String> {
    row.try_get_raw(idx)
        .ok()
        .map(|raw| raw.type_info().name().to_string())
}

fn decode_column(row: &SqliteRow, idx: usize, decode_binary: bool) -> JsonValue {
    let category = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => TypeCategory::Null,
        Ok(raw) => categorize_type(raw.type_info().name()),
        Err(e) => {
            tracing::error!(column = idx, error = %e, "Failed to read column");
            return JsonValue::Null;
        }
    };

    match category {
        TypeCategory::Null => JsonValue::Null,
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx, decode_binary),
        TypeCategory::Text => decode_text(row, idx),
    }
}

fn decode_integer(row: &SqliteRow, idx: usize) -> JsonValue {
    row.try_get_unchecked::<Option<i64>, _>(idx)
        .ok()
        .flatten()
        .map(|v| JsonValue::Number(v.into()))
        .unwrap_or(JsonValue::Null)
}

fn decode_float(row: &SqliteRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get_unchecked::<Option<f64>, _>(idx) {
        return serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    JsonValue::Null
}

fn decode_binary_col(row: &SqliteRow, idx: usize, decode_binary: bool) -> JsonValue {
    row.try_get_unchecked::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|v| decode_binary_value(&v, decode_binary))
        .unwrap_or(JsonValue::Null)
}

fn decode_text(row: &SqliteRow, idx: usize) -> JsonValue {
    row.try_get_unchecked::<Option<String>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::String)
        .unwrap_or(JsonValue::Null)
}
