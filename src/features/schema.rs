//! Training-time feature layout.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::error::ArtifactError;

/// Numeric fields read from the input record, in no particular order.
pub const NUMERIC_FIELDS: [&str; 5] = [
    "edad",
    "tiempo_ultima_atencion_dias",
    "visitas_ultimos_30_dias",
    "visitas_ultimos_6_meses",
    "hospitalizaciones_ultimo_anio",
];

/// Categorical fields one-hot encoded at training time as `<field>_<value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalField {
    Genero,
    Enfermedad,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 2] = [Self::Genero, Self::Enfermedad];

    /// Record key, which is also the dummy-column prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Genero => "genero",
            Self::Enfermedad => "enfermedad",
        }
    }

    /// Dummy-column name for an already normalized value.
    pub fn column_for(&self, value: &str) -> String {
        format!("{}_{}", self.as_str(), value)
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known category values of one field mapped to their column positions.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    known: BTreeMap<String, usize>,
}

impl CategoryTable {
    pub fn lookup(&self, value: &str) -> Option<usize> {
        self.known.get(value).copied()
    }

    /// Known category values, sorted.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.known.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

/// Ordered column names the model was trained against, plus lookups derived
/// from them once at load time.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    genero: CategoryTable,
    enfermedad: CategoryTable,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> std::result::Result<Self, ArtifactError> {
        if columns.is_empty() {
            return Err(ArtifactError::InvalidSchema(
                "column list is empty".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ArtifactError::InvalidSchema(format!(
                    "column {idx} has an empty name"
                )));
            }
            if positions.insert(name.clone(), idx).is_some() {
                return Err(ArtifactError::InvalidSchema(format!(
                    "column '{name}' appears more than once"
                )));
            }
        }

        let mut genero = CategoryTable::default();
        let mut enfermedad = CategoryTable::default();
        for (idx, name) in columns.iter().enumerate() {
            for field in CategoricalField::ALL {
                let Some(value) = name
                    .strip_prefix(field.as_str())
                    .and_then(|rest| rest.strip_prefix('_'))
                else {
                    continue;
                };
                let table = match field {
                    CategoricalField::Genero => &mut genero,
                    CategoricalField::Enfermedad => &mut enfermedad,
                };
                table.known.insert(value.to_string(), idx);
            }
        }

        Ok(Self {
            columns,
            positions,
            genero,
            enfermedad,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn categories(&self, field: CategoricalField) -> &CategoryTable {
        match field {
            CategoricalField::Genero => &self.genero,
            CategoricalField::Enfermedad => &self.enfermedad,
        }
    }
}
