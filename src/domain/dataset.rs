// Dataset domain model - Untyped query results and their inferred column types
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

/// A single result row keyed by column name.
pub type Row = serde_json::Map<String, Value>;

static NULL_VALUE: Value = Value::Null;

/// Ordered column names plus ordered rows, as handed over by the query layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Value of `column` in `row`; absent cells read as null.
    pub fn cell<'a>(row: &'a Row, column: &str) -> &'a Value {
        row.get(column).unwrap_or(&NULL_VALUE)
    }

    /// The first `size` values of a column, nulls included.
    pub fn sample(&self, column: &str, size: usize) -> Vec<&Value> {
        self.rows
            .iter()
            .take(size)
            .map(|row| Self::cell(row, column))
            .collect()
    }

    /// `row` re-keyed in dataset column order; cells outside `columns` follow.
    pub fn ordered_row(&self, row: &Row) -> Row {
        let mut ordered: Row = self
            .columns
            .iter()
            .map(|column| (column.clone(), Self::cell(row, column).clone()))
            .collect();
        for (key, value) in row {
            if !ordered.contains_key(key) {
                ordered.insert(key.clone(), value.clone());
            }
        }
        ordered
    }

    /// Structural fingerprint over columns and row contents.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.columns.hash(&mut hasher);
        self.rows.len().hash(&mut hasher);
        for row in &self.rows {
            serde_json::to_string(&self.ordered_row(row))
                .unwrap_or_default()
                .hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Numeric,
    Categorical,
    Date,
    Geographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSource {
    Inferred,
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    pub inferred_type: FieldType,
    pub source: TypeSource,
}

impl ColumnDescriptor {
    pub fn new(name: String, inferred_type: FieldType, source: TypeSource) -> Self {
        Self {
            name,
            inferred_type,
            source,
        }
    }
}

/// User-supplied type corrections keyed by column name.
///
/// Overrides outlive a dataset refresh: they keep applying to every column
/// whose name still exists and are ignored (and reported stale) otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeOverrides(BTreeMap<String, FieldType>);

impl TypeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, field_type: FieldType) -> Self {
        self.0.insert(column.into(), field_type);
        self
    }

    pub fn get(&self, column: &str) -> Option<FieldType> {
        self.0.get(column).copied()
    }

    /// Overrides naming columns that are not part of `dataset`.
    pub fn stale(&self, dataset: &Dataset) -> Vec<String> {
        self.0
            .keys()
            .filter(|name| !dataset.has_column(name))
            .cloned()
            .collect()
    }
}
