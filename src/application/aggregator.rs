// Data aggregator - Grouping, row projection and KPI summaries over raw rows
use crate::application::field_classifier::coerce_number;
use crate::domain::chart::{AggregatedRow, AggregationOp, KpiSummary, ProjectedRow};
use crate::domain::dataset::{Dataset, Row};
use crate::domain::diagnostics::Diagnostic;
use serde_json::Value;
use std::collections::HashMap;

const NULL_GROUP: &str = "(null)";

/// Reads `field` from every row as a number, replacing unparseable cells with 0.
///
/// Emits a single `TypeMismatch` when anything had to be replaced.
fn coerced_column(rows: &[Row], field: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<f64> {
    let mut coerced = 0;
    let values: Vec<f64> = rows
        .iter()
        .map(|row| {
            coerce_number(Dataset::cell(row, field)).unwrap_or_else(|| {
                coerced += 1;
                0.0
            })
        })
        .collect();

    if coerced > 0 {
        Diagnostic::TypeMismatch {
            field: field.to_string(),
            coerced,
        }
        .emit(diagnostics);
    }
    values
}

/// Text form of a grouping cell.
///
/// Groups are keyed by this text, so the number `1` and the string `"1"`
/// land in the same group. Query layers often return the same key typed
/// differently across sources.
pub fn group_label(value: &Value) -> String {
    match value {
        Value::Null => NULL_GROUP.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Grouped mode: one row per distinct `group_field` value, in first-seen order.
///
/// `secondary_field` splits groups further (heatmap cells). Without a
/// `value_field` only `Count` is meaningful; other operators see no values
/// and produce 0.
pub fn group_rows(
    rows: &[Row],
    group_field: &str,
    secondary_field: Option<&str>,
    value_field: Option<&str>,
    op: AggregationOp,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<AggregatedRow> {
    if rows.is_empty() {
        Diagnostic::EmptyDataset.emit(diagnostics);
        return Vec::new();
    }

    let values = value_field.map(|field| coerced_column(rows, field, diagnostics));

    let mut order: Vec<(String, Option<String>)> = Vec::new();
    let mut members: HashMap<(String, Option<String>), Vec<usize>> = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        let key = (
            group_label(Dataset::cell(row, group_field)),
            secondary_field.map(|field| group_label(Dataset::cell(row, field))),
        );
        members
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(index);
    }

    order
        .into_iter()
        .map(|key| {
            let indices = members.remove(&key).unwrap_or_default();
            let aggregated_value = match (&values, op) {
                (_, AggregationOp::Count) => indices.len() as f64,
                (Some(values), op) => {
                    let group: Vec<f64> = indices.iter().map(|&i| values[i]).collect();
                    op.apply(&group)
                }
                (None, _) => 0.0,
            };
            AggregatedRow {
                group_key: key.0,
                secondary_key: key.1,
                aggregated_value,
                member_count: indices.len(),
            }
        })
        .collect()
}

/// Row-projection mode: every input row with its measure coerced to a number.
pub fn project_rows(
    rows: &[Row],
    x_field: &str,
    value_field: &str,
    size_field: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ProjectedRow> {
    if rows.is_empty() {
        Diagnostic::EmptyDataset.emit(diagnostics);
        return Vec::new();
    }

    let values = coerced_column(rows, value_field, diagnostics);
    let sizes = size_field.map(|field| coerced_column(rows, field, diagnostics));

    rows.iter()
        .zip(values)
        .enumerate()
        .map(|(index, (row, value))| ProjectedRow {
            x: Dataset::cell(row, x_field).clone(),
            value,
            size: sizes.as_ref().map(|s| s[index]),
        })
        .collect()
}

/// Scatter projection: like [`project_rows`] but the x axis is coerced too.
pub fn project_points(
    rows: &[Row],
    x_field: &str,
    value_field: &str,
    size_field: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ProjectedRow> {
    let xs = if rows.is_empty() {
        Vec::new()
    } else {
        coerced_column(rows, x_field, diagnostics)
    };

    project_rows(rows, x_field, value_field, size_field, diagnostics)
        .into_iter()
        .zip(xs)
        .map(|(row, x)| ProjectedRow {
            x: Value::from(x),
            ..row
        })
        .collect()
}

/// Single aggregate across the whole column, plus its extremes for normalization.
pub fn kpi_summary(
    rows: &[Row],
    value_field: &str,
    op: AggregationOp,
    diagnostics: &mut Vec<Diagnostic>,
) -> KpiSummary {
    if rows.is_empty() {
        Diagnostic::EmptyDataset.emit(diagnostics);
        return KpiSummary {
            value: 0.0,
            max: None,
            min: None,
            count: 0,
        };
    }

    let values = coerced_column(rows, value_field, diagnostics);
    KpiSummary {
        value: op.apply(&values),
        max: Some(AggregationOp::Max.apply(&values)),
        min: Some(AggregationOp::Min.apply(&values)),
        count: values.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(raw: Value) -> Vec<Row> {
        raw.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    fn revenue_rows() -> Vec<Row> {
        rows(json!([
            {"area": "A", "revenue": 10},
            {"area": "A", "revenue": 20},
            {"area": "B", "revenue": 5}
        ]))
    }

    #[test]
    fn test_grouped_sum_conserves_total() {
        let input = revenue_rows();
        let mut diagnostics = Vec::new();
        let grouped = group_rows(&input, "area", None, Some("revenue"), AggregationOp::Sum, &mut diagnostics);

        let summary: Vec<(&str, f64)> = grouped
            .iter()
            .map(|r| (r.group_key.as_str(), r.aggregated_value))
            .collect();
        assert_eq!(summary, vec![("A", 30.0), ("B", 5.0)]);
        assert_eq!(grouped.iter().map(|r| r.aggregated_value).sum::<f64>(), 10.0 + 20.0 + 5.0);
        assert_eq!(grouped[0].member_count, 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_coercion_keeps_conservation() {
        let input = rows(json!([
            {"area": "B", "revenue": "12"},
            {"area": "A", "revenue": "oops"},
            {"area": "B", "revenue": null},
            {"area": "A", "revenue": 4}
        ]));
        let mut diagnostics = Vec::new();
        let grouped = group_rows(&input, "area", None, Some("revenue"), AggregationOp::Sum, &mut diagnostics);

        assert_eq!(grouped[0].group_key, "B");
        assert_eq!(grouped[0].aggregated_value, 12.0);
        assert_eq!(grouped[1].aggregated_value, 4.0);
        assert_eq!(grouped.iter().map(|r| r.aggregated_value).sum::<f64>(), 16.0);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::TypeMismatch {
                field: "revenue".into(),
                coerced: 2
            }]
        );
    }

    #[test]
    fn test_other_operators() {
        let input = revenue_rows();
        let mut diagnostics = Vec::new();
        let avg = group_rows(&input, "area", None, Some("revenue"), AggregationOp::Avg, &mut diagnostics);
        assert_eq!(avg[0].aggregated_value, 15.0);

        let count = group_rows(&input, "area", None, None, AggregationOp::Count, &mut diagnostics);
        assert_eq!(count[0].aggregated_value, 2.0);
        assert_eq!(count[1].aggregated_value, 1.0);

        let max = group_rows(&input, "area", None, Some("revenue"), AggregationOp::Max, &mut diagnostics);
        assert_eq!(max[0].aggregated_value, 20.0);
        let min = group_rows(&input, "area", None, Some("revenue"), AggregationOp::Min, &mut diagnostics);
        assert_eq!(min[0].aggregated_value, 10.0);
    }

    #[test]
    fn test_secondary_key_splits_groups() {
        let input = rows(json!([
            {"station": "S1", "hour": 8, "swaps": 3},
            {"station": "S1", "hour": 9, "swaps": 1},
            {"station": "S1", "hour": 8, "swaps": 2}
        ]));
        let mut diagnostics = Vec::new();
        let cells = group_rows(&input, "station", Some("hour"), Some("swaps"), AggregationOp::Sum, &mut diagnostics);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].secondary_key.as_deref(), Some("8"));
        assert_eq!(cells[0].aggregated_value, 5.0);
    }

    #[test]
    fn test_number_and_numeric_string_share_a_group() {
        let input = rows(json!([
            {"zone": 1, "swaps": 2},
            {"zone": "1", "swaps": 3},
            {"zone": null, "swaps": 1}
        ]));
        let mut diagnostics = Vec::new();
        let grouped = group_rows(&input, "zone", None, Some("swaps"), AggregationOp::Sum, &mut diagnostics);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].group_key, "1");
        assert_eq!(grouped[0].aggregated_value, 5.0);
        assert_eq!(grouped[1].group_key, "(null)");
    }

    #[test]
    fn test_empty_rows() {
        let mut diagnostics = Vec::new();
        let grouped = group_rows(&[], "area", None, Some("revenue"), AggregationOp::Sum, &mut diagnostics);
        assert!(grouped.is_empty());
        assert_eq!(diagnostics, vec![Diagnostic::EmptyDataset]);
    }

    #[test]
    fn test_projection_keeps_every_row() {
        let input = rows(json!([
            {"speed": 30, "charge": "80", "load": 2},
            {"speed": 45, "charge": "n/a", "load": 3}
        ]));
        let mut diagnostics = Vec::new();
        let projected = project_rows(&input, "speed", "charge", Some("load"), &mut diagnostics);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].x, json!(30));
        assert_eq!(projected[0].value, 80.0);
        assert_eq!(projected[1].value, 0.0);
        assert_eq!(projected[1].size, Some(3.0));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_scatter_points_coerce_both_axes() {
        let input = rows(json!([
            {"speed": "30", "charge": 80},
            {"speed": 45, "charge": 70},
            {"speed": "fast", "charge": 60}
        ]));
        let mut diagnostics = Vec::new();
        let points = project_points(&input, "speed", "charge", None, &mut diagnostics);

        let xs: Vec<&Value> = points.iter().map(|p| &p.x).collect();
        assert_eq!(xs, vec![&json!(30.0), &json!(45.0), &json!(0.0)]);
        assert_eq!(points[2].value, 60.0);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::TypeMismatch {
                field: "speed".into(),
                coerced: 1
            }]
        );
    }

    #[test]
    fn test_kpi_summary() {
        let mut diagnostics = Vec::new();
        let kpi = kpi_summary(&revenue_rows(), "revenue", AggregationOp::Avg, &mut diagnostics);
        assert!((kpi.value - 35.0 / 3.0).abs() < 1e-12);
        assert_eq!(kpi.max, Some(20.0));
        assert_eq!(kpi.min, Some(5.0));
        assert_eq!(kpi.count, 3);
    }
}
