//! Maneuver extraction from route geometry.
//!
//! Turns a sub-range of the route polyline into an ordered list of
//! classified maneuvers, always terminated by an `arrive` maneuver.
//!
//! # Smoothing
//!
//! Digitized polylines jitter. Each point is replaced by the 3-tap average of
//! itself and its neighbours (clamped at the route ends) before the local turn
//! angle is measured:
//!
//! ```text
//! s(k)  = avg(R[k-1], R[k], R[k+1])
//! a(i)  = turn_angle(s(i-1), s(i), s(i+1))
//! ```
//!
//! # Corner Merging
//!
//! Smoothing spreads one sharp corner over up to three consecutive indices
//! (a 90° corner reads as roughly 27°, 37°, 27°). With merging enabled, a run
//! of consecutive candidate indices turning the same way becomes one maneuver
//! at the sharpest index whose angle is the sum of the run.

use crate::geo::{normalize_180, turn_angle, Coordinate};
use crate::route::RouteModel;

use super::types::{Maneuver, ManeuverThresholds};

/// Produces the maneuver plan for one leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverExtractor {
    thresholds: ManeuverThresholds,
    merge_adjacent: bool,
}

impl Default for ManeuverExtractor {
    fn default() -> Self {
        Self::new(ManeuverThresholds::default())
    }
}

/// One index whose smoothed angle cleared the straight threshold.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    angle: f64,
}

impl ManeuverExtractor {
    /// Extractor with corner merging enabled.
    pub fn new(thresholds: ManeuverThresholds) -> Self {
        Self {
            thresholds,
            merge_adjacent: true,
        }
    }

    /// Enable or disable corner merging.
    pub fn with_merge_adjacent(mut self, merge: bool) -> Self {
        self.merge_adjacent = merge;
        self
    }

    pub fn thresholds(&self) -> &ManeuverThresholds {
        &self.thresholds
    }

    /// Extract maneuvers for the inclusive index range `[si, ei]`.
    ///
    /// Indices are clamped to the route, and inverted ranges are swapped.
    /// An empty route yields an empty plan; otherwise the plan always ends
    /// with `arrive` at `ei`.
    pub fn extract(&self, route: &RouteModel, si: usize, ei: usize) -> Vec<Maneuver> {
        let n = route.len();
        if n == 0 {
            return Vec::new();
        }
        let (si, ei) = if si <= ei { (si, ei) } else { (ei, si) };
        let si = si.min(n - 1);
        let ei = ei.min(n - 1);

        let candidates = self.candidates(route, si, ei);
        let mut maneuvers = if self.merge_adjacent {
            self.merge(route, &candidates)
        } else {
            candidates
                .iter()
                .filter_map(|c| self.to_maneuver(route, c.index, c.angle))
                .collect()
        };

        if let Some(point) = route.point(ei) {
            maneuvers.push(Maneuver::arrive(ei, *point));
        }

        tracing::debug!(
            start = si,
            end = ei,
            maneuvers = maneuvers.len(),
            "Extracted leg maneuvers"
        );

        maneuvers
    }

    /// Interior indices whose smoothed angle reaches the slight threshold.
    fn candidates(&self, route: &RouteModel, si: usize, ei: usize) -> Vec<Candidate> {
        let n = route.len();
        if n < 3 {
            return Vec::new();
        }
        let first = (si + 1).max(1);
        let last = ei.saturating_sub(1).min(n - 2);
        if first > last {
            return Vec::new();
        }

        let points = route.points();
        (first..=last)
            .filter_map(|i| {
                let angle = turn_angle(
                    &smoothed(points, i - 1),
                    &smoothed(points, i),
                    &smoothed(points, i + 1),
                );
                (angle.abs() >= self.thresholds.slight_deg).then_some(Candidate { index: i, angle })
            })
            .collect()
    }

    /// Collapse runs of adjacent same-direction candidates.
    fn merge(&self, route: &RouteModel, candidates: &[Candidate]) -> Vec<Maneuver> {
        let mut out = Vec::new();
        let mut run: Vec<Candidate> = Vec::new();

        for c in candidates {
            let continues = run.last().is_some_and(|prev| {
                prev.index + 1 == c.index && prev.angle.signum() == c.angle.signum()
            });
            if !continues && !run.is_empty() {
                out.extend(self.collapse(route, &run));
                run.clear();
            }
            run.push(*c);
        }
        if !run.is_empty() {
            out.extend(self.collapse(route, &run));
        }
        out
    }

    fn collapse(&self, route: &RouteModel, run: &[Candidate]) -> Option<Maneuver> {
        let mut peak = run.first()?;
        for c in &run[1..] {
            if c.angle.abs() > peak.angle.abs() {
                peak = c;
            }
        }
        let sum: f64 = run.iter().map(|c| c.angle).sum();
        self.to_maneuver(route, peak.index, clamp_turn(sum))
    }

    fn to_maneuver(&self, route: &RouteModel, index: usize, angle: f64) -> Option<Maneuver> {
        let kind = self.thresholds.classify(angle)?;
        let point = *route.point(index)?;
        Some(Maneuver {
            route_index: index,
            point,
            kind,
            angle_deg: angle,
        })
    }
}

/// 3-tap moving average around `k`, clamped at the ends.
fn smoothed(points: &[Coordinate], k: usize) -> Coordinate {
    let last = points.len() - 1;
    let a = points[k.saturating_sub(1)];
    let b = points[k];
    let c = points[(k + 1).min(last)];
    Coordinate::new((a.lat + b.lat + c.lat) / 3.0, (a.lng + b.lng + c.lng) / 3.0)
}

/// Clamp a summed turn to `(-180, 180]`.
fn clamp_turn(sum: f64) -> f64 {
    if sum <= -180.0 {
        180.0
    } else if sum > 180.0 {
        180.0
    } else {
        normalize_180(sum)
    }
}
