//! Route model.
//!
//! An ordered, immutable sequence of route points with a precomputed
//! cumulative-distance table. The model is built once per session and then
//! shared read-only (behind an `Arc`) by the leg tracker, the companion
//! announcer and the stop sequencer.
//!
//! # Cumulative Distance
//!
//! ```text
//! S[0] = 0
//! S[i] = S[i-1] + haversine(R[i-1], R[i])
//! ```
//!
//! `S` is non-decreasing, which makes "distance along the route between two
//! indices" a single subtraction.

use crate::geo::{haversine, planar_distance_sq, Coordinate};

/// Minimum number of points for the engine to leave the idle state.
pub const MIN_READY_POINTS: usize = 3;

/// Immutable route polyline with cumulative distances.
#[derive(Debug, Clone, Default)]
pub struct RouteModel {
    points: Vec<Coordinate>,
    cumulative: Vec<f64>,
}

impl RouteModel {
    /// Build a route from raw points.
    ///
    /// Points with non-finite or out-of-range coordinates are dropped; the
    /// remaining points keep their relative order.
    pub fn new(points: impl IntoIterator<Item = Coordinate>) -> Self {
        let mut dropped = 0usize;
        let points: Vec<Coordinate> = points
            .into_iter()
            .filter(|p| {
                let ok = p.is_valid();
                if !ok {
                    dropped += 1;
                }
                ok
            })
            .collect();

        if dropped > 0 {
            tracing::warn!(dropped, kept = points.len(), "Route: dropped invalid points");
        }

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += haversine(&points[i - 1], p);
            }
            cumulative.push(total);
        }

        tracing::debug!(
            points = points.len(),
            length_m = format!("{:.1}", total),
            "Route model built"
        );

        Self { points, cumulative }
    }

    /// Number of points in the route.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the route has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the route is long enough to drive guidance (`n > 2`).
    pub fn is_ready(&self) -> bool {
        self.points.len() >= MIN_READY_POINTS
    }

    /// All route points in order.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Point at `index`, if in range.
    pub fn point(&self, index: usize) -> Option<&Coordinate> {
        self.points.get(index)
    }

    /// The cumulative distance table `S`.
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Distance along the route from the first point to `index`.
    ///
    /// Indices past the end clamp to the last point.
    pub fn distance_to(&self, index: usize) -> f64 {
        match self.cumulative.len() {
            0 => 0.0,
            n => self.cumulative[index.min(n - 1)],
        }
    }

    /// Distance along the route from `from` to `to`, clamped to `>= 0`.
    pub fn distance_between(&self, from: usize, to: usize) -> f64 {
        (self.distance_to(to) - self.distance_to(from)).max(0.0)
    }

    /// Total route length in meters.
    pub fn total_length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Index of the route point nearest to `position`.
    ///
    /// Linear scan by squared planar distance; ties resolve to the lowest
    /// index. `None` for an empty route.
    pub fn nearest_index(&self, position: &Coordinate) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in self.points.iter().enumerate() {
            let d = planar_distance_sq(position, p);
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }
}

impl FromIterator<Coordinate> for RouteModel {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self::new(iter)
    }
}
