//! Geometry kernel
//!
//! Great-circle distance, initial bearing and signed turn angles between
//! WGS84 coordinates. Everything here is a pure function; callers own any
//! state such as a last-known bearing.
//!
//! # Conventions
//!
//! - Distances are meters on a sphere of radius [`EARTH_RADIUS_M`].
//! - Bearings are degrees clockwise from true north in `[0, 360)`.
//! - Turn angles are degrees in `(-180, 180]`: positive turns right,
//!   negative turns left, magnitude is sharpness.
//!
//! Degenerate input (coincident points, non-finite angles) yields a defined
//! fallback rather than NaN so that nothing downstream has to guard against it.

mod types;

pub use types::{CoordError, Coordinate, MAX_LAT, MAX_LNG, MIN_LAT, MIN_LNG};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Points closer than this are treated as coincident for bearing purposes.
pub const COINCIDENT_EPSILON_M: f64 = 1e-3;

/// Great-circle distance between two coordinates in meters (haversine).
///
/// Symmetric, and `haversine(a, a) == 0`.
#[inline]
pub fn haversine(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let s = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Rounding can push s a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_M * s.sqrt().min(1.0).asin()
}

/// Initial bearing from `a` to `b` in degrees `[0, 360)`.
///
/// Coincident points have no direction; the formula yields 0 for them.
/// Use [`bearing_or`] when a previous bearing should be carried instead.
#[inline]
pub fn bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    let deg = y.atan2(x).to_degrees();
    (deg + 360.0) % 360.0
}

/// Bearing from `a` to `b`, or `fallback` when the points coincide.
#[inline]
pub fn bearing_or(a: &Coordinate, b: &Coordinate, fallback: f64) -> f64 {
    if haversine(a, b) < COINCIDENT_EPSILON_M {
        fallback
    } else {
        bearing(a, b)
    }
}

/// Map any angle into `(-180, 180]`.
///
/// Non-finite input maps to 0.
#[inline]
pub fn normalize_180(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Map any angle into `[0, 360)`.
#[inline]
pub fn normalize_360(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let a = ((angle % 360.0) + 360.0) % 360.0;
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Absolute difference between two bearings, handling wraparound.
///
/// 350° to 10° is 20°, not 340°.
#[inline]
pub fn angle_difference(a: f64, b: f64) -> f64 {
    normalize_180(a - b).abs()
}

/// Signed turn angle at `here` when travelling `prev -> here -> next`.
///
/// `normalize_180(bearing(here, next) - bearing(prev, here))`. When either
/// leg is degenerate the other leg's bearing stands in for it, which makes
/// the turn angle 0.
pub fn turn_angle(prev: &Coordinate, here: &Coordinate, next: &Coordinate) -> f64 {
    let incoming_degenerate = haversine(prev, here) < COINCIDENT_EPSILON_M;
    let outgoing_degenerate = haversine(here, next) < COINCIDENT_EPSILON_M;
    if incoming_degenerate || outgoing_degenerate {
        return 0.0;
    }
    normalize_180(bearing(here, next) - bearing(prev, here))
}

/// Point reached by travelling `distance_m` from `origin` along `bearing_deg`.
pub fn destination_point(origin: &Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let br = bearing_deg.to_radians();
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();
    let d = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * br.cos()).asin();
    let lng2 = lng1
        + (br.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

    Coordinate::new(lat2.to_degrees(), normalize_180(lng2.to_degrees()))
}

/// Squared equirectangular distance in square meters.
///
/// Monotone with true distance over the few kilometres of a delivery route,
/// and cheaper than [`haversine`] for nearest-point scans.
#[inline]
pub fn planar_distance_sq(a: &Coordinate, b: &Coordinate) -> f64 {
    let mean_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let x = (b.lng - a.lng).to_radians() * mean_lat.cos() * EARTH_RADIUS_M;
    let y = (b.lat - a.lat).to_radians() * EARTH_RADIUS_M;
    x * x + y * y
}
