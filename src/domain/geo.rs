// Geographic domain model - Points projected from query rows
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_LATITUDE: f64 = 90.0;
pub const MAX_LONGITUDE: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within |lat| <= 90, |lng| <= 180.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= MAX_LATITUDE
            && self.longitude.abs() <= MAX_LONGITUDE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub id: String,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    pub size_value: f64,
    /// `null` renders with the neutral color.
    pub color_value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_speed: Option<f64>,
}

/// Outcome of projecting rows onto a map.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoResolution {
    Resolved(GeoPointSet),
    NeedsConfiguration,
}

impl GeoResolution {
    pub fn needs_configuration(&self) -> bool {
        matches!(self, GeoResolution::NeedsConfiguration)
    }

    pub fn points(&self) -> &[GeoPoint] {
        match self {
            GeoResolution::Resolved(set) => set.points(),
            GeoResolution::NeedsConfiguration => &[],
        }
    }
}

/// Valid points plus the number of rows dropped on the way.
///
/// Points are only reachable through accessors so the center is always
/// derived from the current set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoPointSet {
    points: Vec<GeoPoint>,
    discarded: usize,
}

impl GeoPointSet {
    pub fn new(points: Vec<GeoPoint>, discarded: usize) -> Self {
        Self { points, discarded }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Arithmetic mean of all point coordinates, `None` for an empty set.
    pub fn center(&self) -> Option<Coordinate> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (lat, lng) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(lat, lng), p| (lat + p.latitude, lng + p.longitude));
        Some(Coordinate::new(lat / n, lng / n))
    }
}
