//! Rebuilds the model's feature vector from a loosely-typed input record.

use serde_json::{Map, Value};
use tracing::warn;

use super::schema::{CategoricalField, FeatureSchema, NUMERIC_FIELDS};
use crate::error::EncodeError;

/// Caller-supplied key/value payload. Unrecognized keys are ignored.
#[derive(Debug, Clone, Default)]
pub struct InputRecord {
    fields: Map<String, Value>,
}

impl InputRecord {
    pub fn from_value(value: Value) -> std::result::Result<Self, EncodeError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(EncodeError::NotAnObject),
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl From<Map<String, Value>> for InputRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// A category value with no matching dummy column. The record is treated as
/// "none of the known categories" for that field.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownCategory {
    pub field: CategoricalField,
    /// Column name derived from the record, e.g. `genero_otro`.
    pub key: String,
}

/// Feature values in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures {
    pub values: Vec<f64>,
    pub unknown_categories: Vec<UnknownCategory>,
}

/// Builds the feature vector for `record`.
///
/// Every schema column starts at zero; numeric fields and at most one dummy
/// column per categorical field are then overwritten.
pub fn encode(
    record: &InputRecord,
    schema: &FeatureSchema,
) -> std::result::Result<EncodedFeatures, EncodeError> {
    let mut values = vec![0.0; schema.len()];

    for field in NUMERIC_FIELDS {
        // Validated even when the schema does not use the field.
        let value = coerce_numeric(field, record.get(field))?;
        if let Some(pos) = schema.position(field) {
            values[pos] = value;
        }
    }

    let mut unknown_categories = Vec::new();
    for field in CategoricalField::ALL {
        let normalized = normalize_category(field, record.get(field.as_str()))?;
        let table = schema.categories(field);
        match table.lookup(&normalized) {
            Some(pos) => values[pos] = 1.0,
            None => {
                let key = field.column_for(&normalized);
                let available: Vec<String> =
                    table.values().map(|v| field.column_for(v)).collect();
                warn!(
                    key = %key,
                    available = ?available,
                    "{} value has no matching column, leaving all its dummies at 0",
                    field
                );
                unknown_categories.push(UnknownCategory { field, key });
            }
        }
    }

    Ok(EncodedFeatures {
        values,
        unknown_categories,
    })
}

/// Absent and `null` fields read as zero.
fn coerce_numeric(field: &str, value: Option<&Value>) -> std::result::Result<f64, EncodeError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    let Some(number) = parsed else {
        return Err(EncodeError::NotNumeric {
            field: field.to_string(),
            value: value.map(Value::to_string).unwrap_or_default(),
        });
    };
    if !number.is_finite() {
        return Err(EncodeError::NotFinite {
            field: field.to_string(),
        });
    }
    Ok(number)
}

/// Trimmed, lower-cased category value; absent and `null` read as empty.
fn normalize_category(
    field: CategoricalField,
    value: Option<&Value>,
) -> std::result::Result<String, EncodeError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_lowercase()),
        Some(other) => Err(EncodeError::NotText {
            field: field.as_str().to_string(),
            value: other.to_string(),
        }),
    }
}
