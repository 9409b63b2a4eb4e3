// Field type classifier - Infers a semantic type per column from a row sample
use crate::domain::dataset::{ColumnDescriptor, Dataset, FieldType, TypeOverrides, TypeSource};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Percentage of non-null sampled values that must parse as numbers.
const NUMERIC_PERCENT: usize = 70;

const COORDINATE_NAME_HINTS: [&str; 3] = ["lat", "long", "lng"];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Case-insensitive substring match on "lat", "long" or "lng".
///
/// Deliberately loose: "latency" matches too. Use [`TypeOverrides`] to correct it.
pub fn is_coordinate_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    COORDINATE_NAME_HINTS
        .iter()
        .any(|hint| lowered.contains(hint))
}

/// Reads a raw cell as a finite number. Numeric strings count, booleans do not.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn is_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_calendar_date(value: &Value) -> bool {
    let Value::String(s) = value else {
        return false;
    };
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(s, fmt).is_ok())
}

/// Classifies one column. First match wins: name hint, numeric, date, categorical.
pub fn classify_field(name: &str, sample: &[&Value]) -> FieldType {
    if is_coordinate_name(name) {
        return FieldType::Geographic;
    }

    let present: Vec<&Value> = sample.iter().copied().filter(|v| !is_null(v)).collect();
    if present.is_empty() {
        return FieldType::Categorical;
    }

    let numeric = present.iter().filter(|v| coerce_number(v).is_some()).count();
    if numeric * 100 >= present.len() * NUMERIC_PERCENT {
        return FieldType::Numeric;
    }

    if present.iter().all(|v| is_calendar_date(v)) {
        return FieldType::Date;
    }

    FieldType::Categorical
}

/// Describes every column of `dataset` in column order, applying overrides by name.
pub fn classify_columns(
    dataset: &Dataset,
    overrides: &TypeOverrides,
    sample_size: usize,
) -> Vec<ColumnDescriptor> {
    dataset
        .columns
        .iter()
        .map(|name| match overrides.get(name) {
            Some(field_type) => ColumnDescriptor::new(name.clone(), field_type, TypeSource::Override),
            None => {
                let sample = dataset.sample(name, sample_size);
                let field_type = classify_field(name, &sample);
                tracing::debug!("Classified column {} as {:?}", name, field_type);
                ColumnDescriptor::new(name.clone(), field_type, TypeSource::Inferred)
            }
        })
        .collect()
}
