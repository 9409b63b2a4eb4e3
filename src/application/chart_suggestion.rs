// Chart suggestion engine - Which chart types a set of columns can support
use crate::application::field_classifier::is_coordinate_name;
use crate::domain::chart::ChartType;
use crate::domain::dataset::{ColumnDescriptor, FieldType};

/// Suggested chart types, always starting with `Table`.
///
/// Order is fixed by the rule sequence below, so identical inputs yield
/// identical lists.
pub fn suggest_charts(columns: &[ColumnDescriptor]) -> Vec<ChartType> {
    let count = |field_type: FieldType| {
        columns
            .iter()
            .filter(|c| c.inferred_type == field_type)
            .count()
    };
    let numeric = count(FieldType::Numeric);
    let categorical = count(FieldType::Categorical);
    let geographic = count(FieldType::Geographic);
    let numeric_coordinate = columns
        .iter()
        .any(|c| c.inferred_type == FieldType::Numeric && is_coordinate_name(&c.name));

    let mut suggested = vec![ChartType::Table];
    if categorical >= 1 && numeric >= 1 {
        add_unique(
            &mut suggested,
            &[ChartType::Bar, ChartType::Line, ChartType::Area, ChartType::Pie],
        );
    }
    if numeric >= 2 {
        add_unique(&mut suggested, &[ChartType::Scatter]);
    }
    if numeric >= 1 {
        add_unique(&mut suggested, &[ChartType::Kpi]);
    }
    if geographic >= 2 || numeric_coordinate {
        add_unique(&mut suggested, &[ChartType::Map]);
    }
    if categorical >= 1 && numeric >= 1 {
        add_unique(&mut suggested, &[ChartType::Treemap, ChartType::Heatmap]);
    }

    suggested
}

fn add_unique(suggested: &mut Vec<ChartType>, types: &[ChartType]) {
    for chart_type in types {
        if !suggested.contains(chart_type) {
            suggested.push(*chart_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::TypeSource;

    fn column(name: &str, field_type: FieldType) -> ColumnDescriptor {
        ColumnDescriptor::new(name.to_string(), field_type, TypeSource::Inferred)
    }

    #[test]
    fn test_table_always_present() {
        assert_eq!(suggest_charts(&[]), vec![ChartType::Table]);
        assert_eq!(
            suggest_charts(&[column("note", FieldType::Categorical)]),
            vec![ChartType::Table]
        );
    }

    #[test]
    fn test_categorical_and_numeric() {
        let columns = [
            column("area", FieldType::Categorical),
            column("revenue", FieldType::Numeric),
        ];
        assert_eq!(
            suggest_charts(&columns),
            vec![
                ChartType::Table,
                ChartType::Bar,
                ChartType::Line,
                ChartType::Area,
                ChartType::Pie,
                ChartType::Kpi,
                ChartType::Treemap,
                ChartType::Heatmap,
            ]
        );
    }

    #[test]
    fn test_scatter_and_map() {
        let columns = [
            column("lat", FieldType::Geographic),
            column("lng", FieldType::Geographic),
            column("charge", FieldType::Numeric),
            column("speed", FieldType::Numeric),
        ];
        assert_eq!(
            suggest_charts(&columns),
            vec![ChartType::Table, ChartType::Scatter, ChartType::Kpi, ChartType::Map]
        );
    }

    #[test]
    fn test_overridden_coordinate_still_maps() {
        let columns = [column("latitude", FieldType::Numeric)];
        assert_eq!(
            suggest_charts(&columns),
            vec![ChartType::Table, ChartType::Kpi, ChartType::Map]
        );
    }

    #[test]
    fn test_stable_order() {
        let columns = [
            column("revenue", FieldType::Numeric),
            column("area", FieldType::Categorical),
        ];
        assert_eq!(suggest_charts(&columns), suggest_charts(&columns));
    }
}
