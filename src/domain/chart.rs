// Chart domain model - Configuration handed in by the UI and data handed to the renderer
use super::dataset::Row;
use super::diagnostics::Diagnostic;
use super::geo::Coordinate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Table,
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
    Kpi,
    Map,
    Treemap,
    Heatmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldRole {
    X,
    Y,
    ColorBy,
    SizeBy,
    Latitude,
    Longitude,
    PingSpeed,
}

impl FieldRole {
    /// Roles whose column is read as a number.
    pub fn is_measure(self) -> bool {
        matches!(self, FieldRole::Y | FieldRole::SizeBy | FieldRole::PingSpeed)
    }
}

/// Role to column name assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_speed: Option<String>,
}

impl FieldMapping {
    pub fn get(&self, role: FieldRole) -> Option<&str> {
        let column = match role {
            FieldRole::X => &self.x,
            FieldRole::Y => &self.y,
            FieldRole::ColorBy => &self.color_by,
            FieldRole::SizeBy => &self.size_by,
            FieldRole::Latitude => &self.latitude,
            FieldRole::Longitude => &self.longitude,
            FieldRole::PingSpeed => &self.ping_speed,
        };
        column.as_deref().filter(|c| !c.is_empty())
    }

    pub fn with(mut self, role: FieldRole, column: impl Into<String>) -> Self {
        let slot = match role {
            FieldRole::X => &mut self.x,
            FieldRole::Y => &mut self.y,
            FieldRole::ColorBy => &mut self.color_by,
            FieldRole::SizeBy => &mut self.size_by,
            FieldRole::Latitude => &mut self.latitude,
            FieldRole::Longitude => &mut self.longitude,
            FieldRole::PingSpeed => &mut self.ping_speed,
        };
        *slot = Some(column.into());
        self
    }

    /// All mapped (role, column) pairs in role order.
    pub fn assigned(&self) -> Vec<(FieldRole, &str)> {
        [
            FieldRole::X,
            FieldRole::Y,
            FieldRole::ColorBy,
            FieldRole::SizeBy,
            FieldRole::Latitude,
            FieldRole::Longitude,
            FieldRole::PingSpeed,
        ]
        .into_iter()
        .filter_map(|role| self.get(role).map(|column| (role, column)))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationOp {
    Sum,
    Avg,
    Count,
    Max,
    Min,
}

impl AggregationOp {
    /// Applies the operator to already-coerced values. Empty input yields 0.
    pub fn apply(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            AggregationOp::Sum => values.iter().sum(),
            AggregationOp::Avg => values.iter().sum::<f64>() / values.len() as f64,
            AggregationOp::Count => values.len() as f64,
            AggregationOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregationOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfiguration {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    #[serde(default)]
    pub field_mapping: FieldMapping,
    #[serde(default)]
    pub aggregation_op: Option<AggregationOp>,
    /// Renderer-only options, passed through untouched.
    #[serde(default)]
    pub display_options: serde_json::Value,
}

impl ChartConfiguration {
    pub fn new(chart_type: ChartType, field_mapping: FieldMapping) -> Self {
        Self {
            chart_type,
            field_mapping,
            aggregation_op: None,
            display_options: serde_json::Value::Null,
        }
    }

    pub fn with_aggregation(mut self, op: AggregationOp) -> Self {
        self.aggregation_op = Some(op);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRow {
    pub group_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_key: Option<String>,
    pub aggregated_value: f64,
    pub member_count: usize,
}

/// One input row with its measure coerced to a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedRow {
    pub x: serde_json::Value,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub value: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub count: usize,
}

/// Framing hints for map payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFrame {
    pub center: Option<Coordinate>,
    pub discarded_points: usize,
}

/// What the renderer receives: `{type, rows, fieldMapping}` plus diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub rows: Vec<Row>,
    pub field_mapping: FieldMapping,
    pub needs_configuration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapFrame>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_ops() {
        let values = [10.0, 20.0, 5.0];
        assert_eq!(AggregationOp::Sum.apply(&values), 35.0);
        assert_eq!(AggregationOp::Count.apply(&values), 3.0);
        assert_eq!(AggregationOp::Max.apply(&values), 20.0);
        assert_eq!(AggregationOp::Min.apply(&values), 5.0);
        assert!((AggregationOp::Avg.apply(&values) - 35.0 / 3.0).abs() < 1e-12);
        assert_eq!(AggregationOp::Max.apply(&[]), 0.0);
    }

    #[test]
    fn test_configuration_from_json() {
        let config: ChartConfiguration = serde_json::from_str(
            r#"{"type":"bar","fieldMapping":{"x":"area","y":"revenue"},"aggregationOp":"sum"}"#,
        )
        .unwrap();
        assert_eq!(config.chart_type, ChartType::Bar);
        assert_eq!(config.field_mapping.get(FieldRole::X), Some("area"));
        assert_eq!(config.field_mapping.get(FieldRole::ColorBy), None);
        assert_eq!(config.aggregation_op, Some(AggregationOp::Sum));
    }

    #[test]
    fn test_empty_role_counts_as_unmapped() {
        let mapping = FieldMapping::default().with(FieldRole::Latitude, "");
        assert_eq!(mapping.get(FieldRole::Latitude), None);
        assert!(mapping.assigned().is_empty());
    }
}
