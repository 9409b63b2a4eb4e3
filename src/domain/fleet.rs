// Fleet domain model - Swap stations, mobile units and their safety tiers
use super::diagnostics::Diagnostic;
use super::geo::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A battery-swap station from the station registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedStation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl FixedStation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A vehicle as last reported by the telemetry feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileUnit {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub charge_level_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
}

impl MobileUnit {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64, charge_level_percent: f64) -> Self {
        Self {
            id: id.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            charge_level_percent,
            reported_at: None,
        }
    }

    /// Position when both coordinates are present and in bounds.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(self.latitude?, self.longitude?);
        coordinate.is_valid().then_some(coordinate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyTier {
    Safe,
    Warning,
    Danger,
    /// Inputs were insufficient to classify.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestStation {
    pub id: String,
    pub name: String,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAssessment {
    pub unit_id: String,
    pub tier: SafetyTier,
    pub charge_level_percent: f64,
    pub range_meters: f64,
    pub nearest_station: Option<NearestStation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SafetySummary {
    pub safe: usize,
    pub warning: usize,
    pub danger: usize,
    pub unknown: usize,
}

impl SafetySummary {
    pub fn record(&mut self, tier: SafetyTier) {
        match tier {
            SafetyTier::Safe => self.safe += 1,
            SafetyTier::Warning => self.warning += 1,
            SafetyTier::Danger => self.danger += 1,
            SafetyTier::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.safe + self.warning + self.danger + self.unknown
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSafetyReport {
    pub assessments: Vec<SafetyAssessment>,
    pub summary: SafetySummary,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_without_position() {
        let mut unit = MobileUnit::new("ev-1", 31.2, 121.5, 80.0);
        assert!(unit.coordinate().is_some());

        unit.longitude = None;
        assert_eq!(unit.coordinate(), None);

        unit.longitude = Some(200.0);
        assert_eq!(unit.coordinate(), None);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = SafetySummary::default();
        for tier in [SafetyTier::Safe, SafetyTier::Danger, SafetyTier::Safe, SafetyTier::Unknown] {
            summary.record(tier);
        }
        assert_eq!(summary.safe, 2);
        assert_eq!(summary.danger, 1);
        assert_eq!(summary.total(), 4);
    }
}
