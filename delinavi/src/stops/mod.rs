//! Delivery stop sequencing.
//!
//! Decides which stop the courier is heading to and re-seeds the leg tracker
//! whenever the (previous, current) stop pair changes.
//!
//! # Ordering
//!
//! Stops are ordered once, when loaded:
//!
//! 1. explicit `sequence` field, ascending (stops without one go last);
//! 2. nearest route index of the stop position;
//! 3. input order (the sort is stable).
//!
//! When no stop has a position at all, input order doubles as the route
//! index so that index-based arrival still works.
//!
//! # Current Stop
//!
//! The first unvisited stop at or ahead of the courier's route index, else
//! the first unvisited stop, else the last stop.
//!
//! # Arrival
//!
//! A stop with a position is reached within `arrival_radius_m`; one without
//! is reached once the courier's route index passes it. What happens next
//! depends on the [`ArrivalPolicy`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::GuidanceEvent;
use crate::geo::{haversine, Coordinate};
use crate::position::Fix;
use crate::route::RouteModel;

/// Default radius around a stop that counts as arrival.
pub const DEFAULT_STOP_ARRIVAL_RADIUS_M: f64 = 25.0;

/// What happens when the courier reaches the current stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalPolicy {
    /// Mark the stop visited and move on immediately.
    #[default]
    AutoAdvance,
    /// Report the arrival and wait for [`StopSequencer::confirm_arrival`].
    ManualConfirm,
}

impl std::str::FromStr for ArrivalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "auto" | "auto_advance" => Ok(ArrivalPolicy::AutoAdvance),
            "manual" | "manual_confirm" => Ok(ArrivalPolicy::ManualConfirm),
            other => Err(format!("unknown arrival policy: {}", other)),
        }
    }
}

impl std::fmt::Display for ArrivalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrivalPolicy::AutoAdvance => write!(f, "auto_advance"),
            ArrivalPolicy::ManualConfirm => write!(f, "manual_confirm"),
        }
    }
}

/// Stop sequencing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopConfig {
    pub arrival_radius_m: f64,
    pub policy: ArrivalPolicy,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: DEFAULT_STOP_ARRIVAL_RADIUS_M,
            policy: ArrivalPolicy::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stops
// ─────────────────────────────────────────────────────────────────────────────

/// One delivery stop as supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub address: String,
    pub note: String,
    pub position: Option<Coordinate>,
    pub sequence: Option<u32>,
}

impl Stop {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Coordinate) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Stop details carried in events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopSummary {
    /// Position in the ordered stop list.
    pub order: usize,
    pub id: String,
    pub name: String,
    pub address: String,
    pub note: String,
    pub position: Option<Coordinate>,
    pub route_index: Option<usize>,
}

#[derive(Debug, Clone)]
struct TrackedStop {
    stop: Stop,
    route_index: Option<usize>,
    visited: bool,
}

/// Result of feeding the sequencer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopUpdate {
    pub events: Vec<GuidanceEvent>,
    /// New `(previous, next)` pair for the leg tracker, if it changed.
    pub leg: Option<(Option<Coordinate>, Option<Coordinate>)>,
    /// A stop was visited, so the leg heading to it is over.
    pub visited: bool,
}

impl StopUpdate {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.leg.is_none() && !self.visited
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequencer
// ─────────────────────────────────────────────────────────────────────────────

/// Tracks visited stops and the current target.
#[derive(Debug, Clone)]
pub struct StopSequencer {
    route: Arc<RouteModel>,
    config: StopConfig,
    stops: Vec<TrackedStop>,
    /// Most recently visited stop.
    previous: Option<usize>,
    current: Option<usize>,
    /// Stop reported as reached and awaiting confirmation.
    pending: Option<usize>,
    here_index: Option<usize>,
    /// Last `(previous, current)` pair handed to the leg tracker.
    committed: Option<(Option<usize>, Option<usize>)>,
}

impl StopSequencer {
    pub fn new(route: Arc<RouteModel>, stops: Vec<Stop>, config: StopConfig) -> Self {
        let has_geo = stops.iter().any(|s| s.position.is_some_and(|p| p.is_valid()));

        let mut tracked: Vec<TrackedStop> = stops
            .into_iter()
            .enumerate()
            .map(|(i, mut stop)| {
                stop.position = stop.position.filter(Coordinate::is_valid);
                let route_index = match stop.position {
                    Some(p) => route.nearest_index(&p),
                    None if !has_geo => Some(i),
                    None => None,
                };
                TrackedStop {
                    stop,
                    route_index,
                    visited: false,
                }
            })
            .collect();

        tracked.sort_by_key(|t| {
            (
                t.stop.sequence.unwrap_or(u32::MAX),
                t.route_index.unwrap_or(usize::MAX),
            )
        });

        tracing::info!(
            stops = tracked.len(),
            policy = %config.policy,
            "Stops loaded"
        );

        Self {
            route,
            config,
            stops: tracked,
            previous: None,
            current: None,
            pending: None,
            here_index: None,
            committed: None,
        }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn policy(&self) -> ArrivalPolicy {
        self.config.policy
    }

    /// Stops in visiting order.
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter().map(|t| &t.stop)
    }

    pub fn current(&self) -> Option<StopSummary> {
        self.current.map(|i| self.summary(i))
    }

    pub fn previous(&self) -> Option<StopSummary> {
        self.previous.map(|i| self.summary(i))
    }

    pub fn pending_arrival(&self) -> Option<StopSummary> {
        self.pending.map(|i| self.summary(i))
    }

    pub fn visited_count(&self) -> usize {
        self.stops.iter().filter(|t| t.visited).count()
    }

    /// Select the initial stop before any fix has arrived.
    pub fn start(&mut self) -> StopUpdate {
        let mut update = StopUpdate::default();
        self.reselect(&mut update);
        update
    }

    /// Process one fix.
    pub fn on_fix(&mut self, fix: &Fix) -> StopUpdate {
        let mut update = StopUpdate::default();
        if !fix.is_usable() || self.stops.is_empty() {
            return update;
        }
        self.here_index = self.route.nearest_index(&fix.position);
        self.reselect(&mut update);

        let Some(current) = self.current else {
            return update;
        };
        if self.stops[current].visited || !self.reached(current, fix) {
            return update;
        }

        match self.config.policy {
            ArrivalPolicy::AutoAdvance => {
                self.visit(current);
                update.visited = true;
                self.reselect(&mut update);
            }
            ArrivalPolicy::ManualConfirm => {
                if self.pending != Some(current) {
                    self.pending = Some(current);
                    tracing::info!(stop = %self.stops[current].stop.id, "Arrival pending confirmation");
                    update.events.push(GuidanceEvent::ArrivalPending {
                        stop: self.summary(current),
                    });
                }
            }
        }
        update
    }

    /// Confirm the pending arrival, or the current stop if none is pending.
    pub fn confirm_arrival(&mut self) -> StopUpdate {
        let mut update = StopUpdate::default();
        let Some(target) = self.pending.or(self.current) else {
            return update;
        };
        if !self.stops[target].visited {
            self.visit(target);
            update.visited = true;
        }
        self.reselect(&mut update);
        update
    }

    fn visit(&mut self, index: usize) {
        self.stops[index].visited = true;
        self.previous = Some(index);
        if self.pending == Some(index) {
            self.pending = None;
        }
        tracing::info!(
            stop = %self.stops[index].stop.id,
            visited = self.visited_count(),
            total = self.stops.len(),
            "Stop visited"
        );
    }

    fn reached(&self, index: usize, fix: &Fix) -> bool {
        let tracked = &self.stops[index];
        match tracked.stop.position {
            Some(p) => haversine(&fix.position, &p) <= self.config.arrival_radius_m,
            None => match (tracked.route_index, self.here_index) {
                (Some(ri), Some(here)) => here >= ri,
                _ => false,
            },
        }
    }

    fn select(&self) -> Option<usize> {
        let unvisited = || self.stops.iter().enumerate().filter(|(_, t)| !t.visited);
        let ahead = self.here_index.and_then(|here| {
            unvisited()
                .find(|(_, t)| t.route_index.is_some_and(|ri| ri >= here))
                .map(|(i, _)| i)
        });
        ahead
            .or_else(|| unvisited().next().map(|(i, _)| i))
            .or_else(|| self.stops.len().checked_sub(1))
    }

    /// Recompute the current stop and report a pair change.
    fn reselect(&mut self, update: &mut StopUpdate) {
        self.current = self.select();
        let pair = (self.previous, self.current);
        if self.committed == Some(pair) {
            return;
        }
        self.committed = Some(pair);
        self.commit_pair(update);
    }

    fn commit_pair(&mut self, update: &mut StopUpdate) {
        let previous = self.previous.map(|i| self.summary(i));
        let current = self.current.map(|i| self.summary(i));
        let next_pos = self.current.and_then(|i| self.effective_position(i));
        let prev_pos = self.previous.and_then(|i| self.effective_position(i));

        tracing::info!(
            previous = previous.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
            current = current.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
            "Stop changed"
        );

        update.events.push(GuidanceEvent::StopChanged { previous, current });
        update.leg = Some((prev_pos, next_pos));
    }

    /// Stop position, or its route point when it has none.
    fn effective_position(&self, index: usize) -> Option<Coordinate> {
        let tracked = &self.stops[index];
        tracked
            .stop
            .position
            .or_else(|| tracked.route_index.and_then(|ri| self.route.point(ri).copied()))
    }

    fn summary(&self, index: usize) -> StopSummary {
        let t = &self.stops[index];
        StopSummary {
            order: index,
            id: t.stop.id.clone(),
            name: t.stop.name.clone(),
            address: t.stop.address.clone(),
            note: t.stop.note.clone(),
            position: t.stop.position,
            route_index: t.route_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Degrees per 10 m at the equator.
    const STEP: f64 = 10.0 / 111_194.93;

    /// 51 points, 10 m apart, heading east.
    fn route() -> Arc<RouteModel> {
        Arc::new(RouteModel::new(
            (0..=50).map(|k| Coordinate::new(0.0, k as f64 * STEP)),
        ))
    }

    fn at(index: usize) -> Coordinate {
        Coordinate::new(0.0, index as f64 * STEP)
    }

    fn fix(index: usize) -> Fix {
        Fix::new(at(index), Duration::from_secs(index as u64))
    }

    fn ids(seq: &StopSequencer) -> Vec<String> {
        seq.stops().map(|s| s.id.clone()).collect()
    }

    fn current_id(seq: &StopSequencer) -> Option<String> {
        seq.current().map(|s| s.id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ordering
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_orders_by_route_index() {
        let stops = vec![
            Stop::new("c", "C").with_position(at(40)),
            Stop::new("a", "A").with_position(at(10)),
            Stop::new("b", "B").with_position(at(25)),
        ];
        let seq = StopSequencer::new(route(), stops, StopConfig::default());
        assert_eq!(ids(&seq), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sequence_field_wins() {
        let stops = vec![
            Stop::new("a", "A").with_position(at(10)).with_sequence(2),
            Stop::new("b", "B").with_position(at(25)).with_sequence(1),
            Stop::new("c", "C").with_position(at(5)),
        ];
        let seq = StopSequencer::new(route(), stops, StopConfig::default());
        assert_eq!(ids(&seq), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_file_order_without_positions() {
        let stops = vec![Stop::new("x", "X"), Stop::new("y", "Y"), Stop::new("z", "Z")];
        let seq = StopSequencer::new(route(), stops, StopConfig::default());
        assert_eq!(ids(&seq), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_invalid_position_treated_as_missing() {
        let stops = vec![
            Stop::new("bad", "Bad").with_position(Coordinate::new(f64::NAN, 0.0)),
            Stop::new("good", "Good").with_position(at(3)),
        ];
        let seq = StopSequencer::new(route(), stops, StopConfig::default());
        assert_eq!(ids(&seq), vec!["good", "bad"]);
        assert_eq!(seq.stops().nth(1).and_then(|s| s.position), None);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Progress
    // ─────────────────────────────────────────────────────────────────────────

    fn three_stops(policy: ArrivalPolicy) -> StopSequencer {
        let stops = vec![
            Stop::new("a", "A").with_position(at(10)),
            Stop::new("b", "B").with_position(at(25)),
            Stop::new("c", "C").with_position(at(40)),
        ];
        StopSequencer::new(
            route(),
            stops,
            StopConfig {
                policy,
                ..StopConfig::default()
            },
        )
    }

    #[test]
    fn test_start_selects_first_and_seeds_leg() {
        let mut seq = three_stops(ArrivalPolicy::AutoAdvance);
        let update = seq.start();
        assert_eq!(current_id(&seq).as_deref(), Some("a"));
        assert_eq!(update.leg, Some((None, Some(at(10)))));
        assert!(matches!(update.events[..], [GuidanceEvent::StopChanged { .. }]));

        // Unchanged pair: nothing
        assert!(seq.on_fix(&fix(2)).is_empty());
    }

    #[test]
    fn test_auto_advance() {
        let mut seq = three_stops(ArrivalPolicy::AutoAdvance);
        seq.start();
        let update = seq.on_fix(&fix(10));
        assert_eq!(current_id(&seq).as_deref(), Some("b"));
        assert_eq!(seq.previous().map(|s| s.id).as_deref(), Some("a"));
        assert_eq!(update.leg, Some((Some(at(10)), Some(at(25)))));
        assert!(update.visited);
        assert_eq!(seq.visited_count(), 1);
    }

    #[test]
    fn test_skipping_ahead_retargets() {
        let mut seq = three_stops(ArrivalPolicy::AutoAdvance);
        seq.start();
        // Past stop a without reaching it
        let update = seq.on_fix(&fix(30));
        assert_eq!(current_id(&seq).as_deref(), Some("c"));
        assert!(update.leg.is_some());
        assert!(!update.visited);
        assert_eq!(seq.visited_count(), 0);
    }

    #[test]
    fn test_all_visited_keeps_last() {
        let mut seq = three_stops(ArrivalPolicy::AutoAdvance);
        seq.start();
        seq.on_fix(&fix(10));
        seq.on_fix(&fix(25));
        seq.on_fix(&fix(40));
        assert_eq!(seq.visited_count(), 3);
        assert_eq!(current_id(&seq).as_deref(), Some("c"));
        assert!(seq.on_fix(&fix(41)).is_empty());
    }

    #[test]
    fn test_manual_confirm() {
        let mut seq = three_stops(ArrivalPolicy::ManualConfirm);
        seq.start();

        let update = seq.on_fix(&fix(10));
        assert!(matches!(update.events[..], [GuidanceEvent::ArrivalPending { .. }]));
        assert!(update.leg.is_none());
        assert_eq!(current_id(&seq).as_deref(), Some("a"));

        // Reported once
        assert!(seq.on_fix(&fix(10)).is_empty());

        let update = seq.confirm_arrival();
        assert_eq!(current_id(&seq).as_deref(), Some("b"));
        assert!(seq.pending_arrival().is_none());
        assert_eq!(update.leg, Some((Some(at(10)), Some(at(25)))));
    }

    #[test]
    fn test_index_arrival_without_positions() {
        let stops = vec![Stop::new("x", "X"), Stop::new("y", "Y")];
        let mut seq = StopSequencer::new(route(), stops, StopConfig::default());
        let update = seq.start();
        // File order doubles as route index: x -> 0, y -> 1
        assert_eq!(update.leg, Some((None, Some(at(0)))));
        seq.on_fix(&fix(0));
        assert_eq!(current_id(&seq).as_deref(), Some("y"));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("manual".parse::<ArrivalPolicy>(), Ok(ArrivalPolicy::ManualConfirm));
        assert_eq!("auto-advance".parse::<ArrivalPolicy>(), Ok(ArrivalPolicy::AutoAdvance));
        assert!("sometimes".parse::<ArrivalPolicy>().is_err());
    }
}
