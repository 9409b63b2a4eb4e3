// Geo point resolver - Projects rows onto map points using the field mapping
use crate::application::aggregator::group_label;
use crate::application::field_classifier::coerce_number;
use crate::domain::chart::{FieldMapping, FieldRole};
use crate::domain::dataset::{Dataset, Row};
use crate::domain::diagnostics::Diagnostic;
use crate::domain::geo::{Coordinate, GeoPoint, GeoPointSet, GeoResolution};
use serde_json::Value;

/// Marker size used when `sizeBy` is unmapped or unreadable.
pub const DEFAULT_POINT_SIZE: f64 = 1.0;

/// Builds map points from `rows`.
///
/// Unmapped latitude/longitude yields `NeedsConfiguration`. Rows with
/// missing or out-of-bounds coordinates are dropped and counted.
pub fn resolve_geo_points(
    rows: &[Row],
    mapping: &FieldMapping,
    diagnostics: &mut Vec<Diagnostic>,
) -> GeoResolution {
    let latitude_field = mapping.get(FieldRole::Latitude);
    let longitude_field = mapping.get(FieldRole::Longitude);
    let (Some(latitude_field), Some(longitude_field)) = (latitude_field, longitude_field) else {
        for (role, field) in [
            (FieldRole::Latitude, latitude_field),
            (FieldRole::Longitude, longitude_field),
        ] {
            if field.is_none() {
                Diagnostic::ConfigurationIncomplete { role, column: None }.emit(diagnostics);
            }
        }
        return GeoResolution::NeedsConfiguration;
    };

    let label_field = mapping.get(FieldRole::X);
    let size_field = mapping.get(FieldRole::SizeBy);
    let color_field = mapping.get(FieldRole::ColorBy);
    let ping_field = mapping.get(FieldRole::PingSpeed);

    let mut points = Vec::with_capacity(rows.len());
    let mut discarded = 0;
    let mut unreadable_size = 0;
    let mut unreadable_ping = 0;
    for (index, row) in rows.iter().enumerate() {
        let coordinate = match (
            coerce_number(Dataset::cell(row, latitude_field)),
            coerce_number(Dataset::cell(row, longitude_field)),
        ) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => {
                discarded += 1;
                continue;
            }
        };
        if !coordinate.is_valid() {
            discarded += 1;
            continue;
        }

        let id = format!("point-{}", index);
        let label = label_field
            .map(|field| group_label(Dataset::cell(row, field)))
            .unwrap_or_else(|| id.clone());

        let size_value = match size_field {
            Some(field) => coerce_number(Dataset::cell(row, field)).unwrap_or_else(|| {
                unreadable_size += 1;
                DEFAULT_POINT_SIZE
            }),
            None => DEFAULT_POINT_SIZE,
        };
        let ping_speed = ping_field.and_then(|field| {
            let speed = coerce_number(Dataset::cell(row, field));
            if speed.is_none() {
                unreadable_ping += 1;
            }
            speed
        });

        points.push(GeoPoint {
            id,
            label,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            size_value,
            color_value: color_field
                .map(|field| Dataset::cell(row, field).clone())
                .unwrap_or(Value::Null),
            ping_speed,
        });
    }

    if discarded > 0 {
        Diagnostic::OutOfRangeCoordinate { discarded }.emit(diagnostics);
    }
    for (field, coerced) in [(size_field, unreadable_size), (ping_field, unreadable_ping)] {
        if let (Some(field), true) = (field, coerced > 0) {
            Diagnostic::TypeMismatch {
                field: field.to_string(),
                coerced,
            }
            .emit(diagnostics);
        }
    }
    tracing::debug!("Resolved {} geo points, discarded {}", points.len(), discarded);

    GeoResolution::Resolved(GeoPointSet::new(points, discarded))
}
