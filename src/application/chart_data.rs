// Chart data builder - Validates a chart configuration and shapes rows for the renderer
use crate::application::aggregator::{group_rows, kpi_summary, project_points, project_rows};
use crate::application::geo_resolver::resolve_geo_points;
use crate::domain::chart::{
    AggregationOp, ChartConfiguration, ChartType, FieldRole, MapFrame, RenderPayload,
};
use crate::domain::dataset::{ColumnDescriptor, Dataset, FieldType, Row};
use crate::domain::diagnostics::Diagnostic;
use crate::domain::geo::GeoResolution;
use serde::Serialize;
use serde_json::Value;

/// Roles a chart cannot be drawn without.
pub fn required_roles(chart_type: ChartType, op: Option<AggregationOp>) -> Vec<FieldRole> {
    let counting = op == Some(AggregationOp::Count);
    match chart_type {
        ChartType::Table => vec![],
        ChartType::Bar | ChartType::Line | ChartType::Area | ChartType::Pie | ChartType::Treemap
            if counting =>
        {
            vec![FieldRole::X]
        }
        ChartType::Bar | ChartType::Line | ChartType::Area | ChartType::Pie | ChartType::Treemap => {
            vec![FieldRole::X, FieldRole::Y]
        }
        ChartType::Heatmap if counting => vec![FieldRole::X, FieldRole::ColorBy],
        ChartType::Heatmap => vec![FieldRole::X, FieldRole::ColorBy, FieldRole::Y],
        ChartType::Scatter => vec![FieldRole::X, FieldRole::Y],
        ChartType::Kpi => vec![FieldRole::Y],
        ChartType::Map => vec![FieldRole::Latitude, FieldRole::Longitude],
    }
}

/// Checks roles against the dataset. Returns false when a required role is
/// unmapped or points at a column the dataset does not have.
pub fn validate_mapping(
    dataset: &Dataset,
    config: &ChartConfiguration,
    columns: &[ColumnDescriptor],
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let mapping = &config.field_mapping;
    let required = required_roles(config.chart_type, config.aggregation_op);
    let mut complete = true;

    for role in &required {
        if mapping.get(*role).is_none() {
            Diagnostic::ConfigurationIncomplete {
                role: *role,
                column: None,
            }
            .emit(diagnostics);
            complete = false;
        }
    }

    for (role, column) in mapping.assigned() {
        if !dataset.has_column(column) {
            Diagnostic::ConfigurationIncomplete {
                role,
                column: Some(column.to_string()),
            }
            .emit(diagnostics);
            complete &= !required.contains(&role);
            continue;
        }

        let field_type = columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.inferred_type);
        let expects_number = role.is_measure()
            || matches!(role, FieldRole::Latitude | FieldRole::Longitude)
            || (role == FieldRole::X && config.chart_type == ChartType::Scatter);
        let numeric_like = matches!(field_type, Some(FieldType::Numeric | FieldType::Geographic));
        if expects_number && !numeric_like {
            // Coercion happens downstream; each stage reports how many cells it replaced
            tracing::warn!(
                "Role {:?} mapped to {} column {}, values will be coerced",
                role,
                field_type.map(|t| format!("{:?}", t)).unwrap_or_default(),
                column
            );
        }
    }

    complete
}

fn to_rows<T: Serialize>(items: &[T]) -> Vec<Row> {
    items
        .iter()
        .filter_map(|item| match serde_json::to_value(item) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect()
}

/// Validates `config` and builds the payload for its chart type.
pub fn build_chart_data(
    dataset: &Dataset,
    config: &ChartConfiguration,
    columns: &[ColumnDescriptor],
) -> RenderPayload {
    let mut diagnostics = Vec::new();
    let mut payload = RenderPayload {
        chart_type: config.chart_type,
        rows: Vec::new(),
        field_mapping: config.field_mapping.clone(),
        needs_configuration: false,
        map: None,
        diagnostics: Vec::new(),
    };

    if !validate_mapping(dataset, config, columns, &mut diagnostics) {
        payload.needs_configuration = true;
        payload.diagnostics = diagnostics;
        return payload;
    }

    let mapping = &config.field_mapping;
    let rows = &dataset.rows;
    let x = mapping.get(FieldRole::X).unwrap_or_default();
    let y = mapping.get(FieldRole::Y);
    let op = config.aggregation_op;

    payload.rows = match config.chart_type {
        ChartType::Table => {
            if rows.is_empty() {
                Diagnostic::EmptyDataset.emit(&mut diagnostics);
            }
            rows.iter().map(|row| dataset.ordered_row(row)).collect()
        }
        ChartType::Bar | ChartType::Line | ChartType::Area => match (op, y) {
            (Some(op), _) => to_rows(&group_rows(rows, x, None, y, op, &mut diagnostics)),
            (None, Some(y)) => to_rows(&project_rows(rows, x, y, None, &mut diagnostics)),
            (None, None) => Vec::new(),
        },
        ChartType::Pie | ChartType::Treemap => {
            let op = op.unwrap_or(AggregationOp::Sum);
            to_rows(&group_rows(rows, x, None, y, op, &mut diagnostics))
        }
        ChartType::Heatmap => {
            let op = op.unwrap_or(AggregationOp::Sum);
            let secondary = mapping.get(FieldRole::ColorBy);
            to_rows(&group_rows(rows, x, secondary, y, op, &mut diagnostics))
        }
        ChartType::Scatter => match y {
            Some(y) => {
                let size = mapping.get(FieldRole::SizeBy);
                to_rows(&project_points(rows, x, y, size, &mut diagnostics))
            }
            None => Vec::new(),
        },
        ChartType::Kpi => match y {
            Some(y) => {
                let op = op.unwrap_or(AggregationOp::Sum);
                to_rows(&[kpi_summary(rows, y, op, &mut diagnostics)])
            }
            None => Vec::new(),
        },
        ChartType::Map => {
            if rows.is_empty() {
                Diagnostic::EmptyDataset.emit(&mut diagnostics);
            }
            match resolve_geo_points(rows, mapping, &mut diagnostics) {
                GeoResolution::Resolved(set) => {
                    payload.map = Some(MapFrame {
                        center: set.center(),
                        discarded_points: set.discarded(),
                    });
                    to_rows(set.points())
                }
                GeoResolution::NeedsConfiguration => {
                    payload.needs_configuration = true;
                    Vec::new()
                }
            }
        }
    };

    payload.diagnostics = diagnostics;
    payload
}
