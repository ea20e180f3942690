use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Coordinates are considered equal within this tolerance (degrees).
const COORD_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        (self.latitude - other.latitude).abs() < COORD_EPSILON
            && (self.longitude - other.longitude).abs() < COORD_EPSILON
    }
}

/// Great-circle distance between two coordinates, in meters.
pub fn great_circle_distance(from: Coordinates, to: Coordinates) -> f64 {
    // The law-of-cosines argument can land just past 1.0 for coincident
    // points at high latitude, yielding a spurious sub-meter distance.
    if from == to {
        return 0.0;
    }

    let lat_from = from.latitude * DEG_TO_RAD;
    let lat_to = to.latitude * DEG_TO_RAD;
    let delta_lng = (from.longitude - to.longitude).abs() * DEG_TO_RAD;

    (lat_from.sin() * lat_to.sin() + lat_from.cos() * lat_to.cos() * delta_lng.cos()).acos()
        * EARTH_RADIUS_M
}
