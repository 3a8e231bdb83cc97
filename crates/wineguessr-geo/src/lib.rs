//! Great-circle distance and distance-based scoring for Wineguessr.
//!
//! Two pure functions drive every round:
//!
//! - [`distance_km`]: haversine distance between the guess and the wine's
//!   origin, on a sphere of radius [`EARTH_RADIUS_KM`].
//! - [`score`]: maps that distance to points with exponential decay:
//!   `round(MAX_SCORE * exp(-d / DECAY_KM))`.
//!
//! ```text
//!  distance (km)      0     344    1000    2000    5000   20000
//!  score (points)  5000    4210    3033    1839     410       0
//! ```
//!
//! Nothing here knows about rooms or players; the room layer calls these
//! once per submitted guess.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Points awarded for a guess exactly on the origin.
pub const MAX_SCORE: u32 = 5000;

/// Distance over which the score decays by a factor of `e`.
pub const DECAY_KM: f64 = 2000.0;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A point on the globe, in degrees.
///
/// Serialized as `{ "lat": .., "lng": .. }`, the shape the map surface and
/// wine files use. Ranges are not validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Distance to `other` in kilometres. See [`distance_km`].
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        distance_km(self, other)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lng)
    }
}

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Haversine great-circle distance between two points, in kilometres.
///
/// Symmetric in its arguments and zero for identical points. The
/// intermediate `a` is clamped to `[0, 1]` so rounding near antipodal
/// points cannot produce a NaN.
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Points for a guess `distance_km` away from the origin.
///
/// `score(0.0) == MAX_SCORE`, non-increasing in distance, never negative.
/// Negative or NaN inputs are treated as zero distance.
pub fn score(distance_km: f64) -> u32 {
    let d = if distance_km.is_nan() { 0.0 } else { distance_km.max(0.0) };
    let raw = f64::from(MAX_SCORE) * (-d / DECAY_KM).exp();
    // `raw` is in [0, MAX_SCORE], so the cast cannot truncate.
    raw.round() as u32
}

/// Distance and score of `guess` against `target` in one call.
pub fn grade(guess: &Coordinates, target: &Coordinates) -> (f64, u32) {
    let d = distance_km(guess, target);
    (d, score(d))
}
