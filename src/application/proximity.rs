// Proximity safety classifier - Distance to the nearest swap station vs. remaining range
use crate::domain::diagnostics::Diagnostic;
use crate::domain::fleet::{
    FixedStation, FleetSafetyReport, MobileUnit, NearestStation, SafetyAssessment, SafetyTier,
};
use crate::domain::geo::Coordinate;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Linear range model: each percent of charge is worth half a kilometre.
pub const METERS_PER_CHARGE_PERCENT: f64 = 500.0;

const LOW_CHARGE_PERCENT: f64 = 25.0;
const RANGE_MARGIN: f64 = 0.7;

/// Great-circle distance in meters (haversine, spherical Earth).
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi_a = a.latitude.to_radians();
    let phi_b = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

pub fn estimated_range_meters(charge_level_percent: f64) -> f64 {
    charge_level_percent * METERS_PER_CHARGE_PERCENT
}

/// Tier for a unit that has a known nearest station. Checks run in order:
/// out of range is danger, then low charge or thin margin is warning.
pub fn classify_tier(charge_level_percent: f64, nearest_distance_meters: f64) -> SafetyTier {
    let range = estimated_range_meters(charge_level_percent);
    if nearest_distance_meters > range {
        SafetyTier::Danger
    } else if charge_level_percent <= LOW_CHARGE_PERCENT
        || nearest_distance_meters > RANGE_MARGIN * range
    {
        SafetyTier::Warning
    } else {
        SafetyTier::Safe
    }
}

/// Linear scan, O(stations) per unit. Stations with invalid coordinates are skipped.
pub fn nearest_station<'a>(
    position: Coordinate,
    stations: &'a [FixedStation],
) -> Option<(&'a FixedStation, f64)> {
    stations
        .iter()
        .filter(|station| station.coordinate().is_valid())
        .map(|station| (station, haversine_distance(position, station.coordinate())))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Assesses one unit. Missing position, unreadable charge or no usable
/// station all yield `Unknown` with a diagnostic.
pub fn assess_unit(
    unit: &MobileUnit,
    stations: &[FixedStation],
    diagnostics: &mut Vec<Diagnostic>,
) -> SafetyAssessment {
    let charge = unit.charge_level_percent;
    let range_meters = estimated_range_meters(charge);
    let unknown = SafetyAssessment {
        unit_id: unit.id.clone(),
        tier: SafetyTier::Unknown,
        charge_level_percent: charge,
        range_meters,
        nearest_station: None,
    };

    let Some(position) = unit.coordinate() else {
        Diagnostic::MissingCoordinate {
            entity_id: unit.id.clone(),
        }
        .emit(diagnostics);
        return unknown;
    };
    if !charge.is_finite() {
        Diagnostic::MissingCharge {
            entity_id: unit.id.clone(),
        }
        .emit(diagnostics);
        return unknown;
    }

    let Some((station, distance)) = nearest_station(position, stations) else {
        tracing::warn!("No station with valid coordinates for unit {}", unit.id);
        return unknown;
    };

    SafetyAssessment {
        tier: classify_tier(charge, distance),
        nearest_station: Some(NearestStation {
            id: station.id.clone(),
            name: station.name.clone(),
            distance_meters: distance,
        }),
        ..unknown
    }
}

/// Reports every station the nearest-station search will skip.
pub fn station_diagnostics(stations: &[FixedStation], diagnostics: &mut Vec<Diagnostic>) {
    for station in stations.iter().filter(|s| !s.coordinate().is_valid()) {
        Diagnostic::MissingCoordinate {
            entity_id: station.id.clone(),
        }
        .emit(diagnostics);
    }
}

/// Assesses every unit against the same station snapshot. O(units × stations).
pub fn assess_fleet(units: &[MobileUnit], stations: &[FixedStation]) -> FleetSafetyReport {
    let mut report = FleetSafetyReport::default();
    station_diagnostics(stations, &mut report.diagnostics);

    for unit in units {
        let assessment = assess_unit(unit, stations, &mut report.diagnostics);
        report.summary.record(assessment.tier);
        report.assessments.push(assessment);
    }

    report
}
