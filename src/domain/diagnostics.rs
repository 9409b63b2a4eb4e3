// Non-fatal pipeline diagnostics
use super::chart::FieldRole;
use serde::Serialize;

/// Degradations reported next to a (partial) result instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A required role is unmapped, or mapped to a column the dataset lacks.
    #[serde(rename_all = "camelCase")]
    ConfigurationIncomplete {
        role: FieldRole,
        column: Option<String>,
    },
    /// Non-numeric values were read as 0.
    #[serde(rename_all = "camelCase")]
    TypeMismatch { field: String, coerced: usize },
    EmptyDataset,
    /// Rows dropped for missing or out-of-bounds coordinates.
    #[serde(rename_all = "camelCase")]
    OutOfRangeCoordinate { discarded: usize },
    /// A unit or station without usable coordinates.
    #[serde(rename_all = "camelCase")]
    MissingCoordinate { entity_id: String },
    /// A unit whose charge level is absent or not a finite number.
    #[serde(rename_all = "camelCase")]
    MissingCharge { entity_id: String },
}

impl Diagnostic {
    /// Logs the diagnostic and appends it to `sink`.
    pub fn emit(self, sink: &mut Vec<Diagnostic>) {
        tracing::warn!(diagnostic = ?self, "pipeline degraded");
        sink.push(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(Diagnostic::TypeMismatch {
            field: "revenue".into(),
            coerced: 2,
        })
        .unwrap();
        assert_eq!(value, json!({"kind": "typeMismatch", "field": "revenue", "coerced": 2}));

        let value = serde_json::to_value(Diagnostic::ConfigurationIncomplete {
            role: FieldRole::Latitude,
            column: None,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"kind": "configurationIncomplete", "role": "latitude", "column": null})
        );
    }
}
