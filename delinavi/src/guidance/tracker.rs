//! Leg tracker state machine.
//!
//! # State Machine
//!
//! ```text
//!            set_leg(valid)              cursor == len
//!   Idle ─────────────────────> Active ────────────────> Arrived
//!    ^                            │                        │
//!    └──── set_leg(invalid) ──────┴────────────────────────┘
//! ```
//!
//! `set_leg` replaces the whole leg, so it is also the only way to cancel
//! guidance. `on_fix` only does work while `Active`.
//!
//! # Pass Detection
//!
//! A maneuver counts as passed when either
//!
//! - the nearest route index is at most `index_slack` short of the maneuver
//!   index, or
//! - the fix is within `pass_radius_m` of the maneuver point.
//!
//! Index comparison alone misses passes where the route doubles back near
//! itself and the nearest-point search jumps backwards; the radius alone
//! misses passes where GPS noise keeps the fix just outside. Several
//! maneuvers may be passed by one sparse fix.

use std::sync::Arc;

use crate::events::GuidanceEvent;
use crate::geo::{haversine, Coordinate};
use crate::maneuver::{Maneuver, ManeuverExtractor};
use crate::position::Fix;
use crate::route::RouteModel;

use super::dispatcher::{NotificationDispatcher, StageThresholds};
use super::leg::Leg;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Route points to look back when no previous stop is known.
pub const DEFAULT_LOOKBACK_POINTS: usize = 30;

/// Radius around a maneuver point that counts as passing it.
pub const DEFAULT_PASS_RADIUS_M: f64 = 18.0;

/// How many indices short of a maneuver still count as passing it.
pub const DEFAULT_INDEX_SLACK: usize = 2;

/// Leg tracker parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegConfig {
    pub lookback_points: usize,
    pub pass_radius_m: f64,
    pub index_slack: usize,
    pub stages: StageThresholds,
}

impl Default for LegConfig {
    fn default() -> Self {
        Self {
            lookback_points: DEFAULT_LOOKBACK_POINTS,
            pass_radius_m: DEFAULT_PASS_RADIUS_M,
            index_slack: DEFAULT_INDEX_SLACK,
            stages: StageThresholds::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracker state
// ─────────────────────────────────────────────────────────────────────────────

/// Observable tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerState {
    /// No leg.
    #[default]
    Idle,
    /// A leg with maneuvers still ahead.
    Active,
    /// Every maneuver of the leg has been passed.
    Arrived,
}

impl std::fmt::Display for TrackerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerState::Idle => write!(f, "idle"),
            TrackerState::Active => write!(f, "active"),
            TrackerState::Arrived => write!(f, "arrived"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Leg tracker
// ─────────────────────────────────────────────────────────────────────────────

/// Tracks progress through the current leg.
///
/// Both entry points return the events caused by the call. All tracker state
/// is already updated by the time the caller sees them.
#[derive(Debug, Clone)]
pub struct LegTracker {
    route: Arc<RouteModel>,
    extractor: ManeuverExtractor,
    dispatcher: NotificationDispatcher,
    config: LegConfig,
    state: TrackerState,
    leg: Option<Leg>,
    here_index: Option<usize>,
    remaining_m: Option<f64>,
}

impl LegTracker {
    pub fn new(route: Arc<RouteModel>, extractor: ManeuverExtractor, config: LegConfig) -> Self {
        Self {
            route,
            extractor,
            dispatcher: NotificationDispatcher::new(config.stages),
            config,
            state: TrackerState::Idle,
            leg: None,
            here_index: None,
            remaining_m: None,
        }
    }

    /// Tracker with default extractor and leg parameters.
    pub fn with_defaults(route: Arc<RouteModel>) -> Self {
        Self::new(route, ManeuverExtractor::default(), LegConfig::default())
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn leg(&self) -> Option<&Leg> {
        self.leg.as_ref()
    }

    pub fn route(&self) -> &Arc<RouteModel> {
        &self.route
    }

    pub fn config(&self) -> &LegConfig {
        &self.config
    }

    /// Whether a leg is held, exhausted or not.
    pub fn has_leg(&self) -> bool {
        self.leg.is_some()
    }

    /// The maneuver currently being approached.
    pub fn next_maneuver(&self) -> Option<&Maneuver> {
        match self.state {
            TrackerState::Active => self.leg.as_ref().and_then(Leg::next_maneuver),
            _ => None,
        }
    }

    /// Route distance from the last fix to the next maneuver.
    pub fn remaining_distance(&self) -> Option<f64> {
        self.remaining_m
    }

    /// Nearest route index of the last processed fix.
    pub fn here_index(&self) -> Option<usize> {
        self.here_index
    }

    /// Replace the current leg.
    ///
    /// `next` must be a valid coordinate on a ready route, otherwise the
    /// tracker drops to `Idle` and reports it. Without a usable `prev`, the
    /// leg starts `lookback_points` before the target.
    pub fn set_leg(&mut self, prev: Option<Coordinate>, next: Option<Coordinate>) -> Vec<GuidanceEvent> {
        let target = next.filter(Coordinate::is_valid);
        let ei = match target {
            Some(t) if self.route.is_ready() => self.route.nearest_index(&t),
            _ => None,
        };
        let Some(ei) = ei else {
            return self.go_idle();
        };

        let si = prev
            .filter(Coordinate::is_valid)
            .and_then(|p| self.route.nearest_index(&p))
            .unwrap_or_else(|| ei.saturating_sub(self.config.lookback_points));
        let (si, ei) = if si > ei { (ei, si) } else { (si, ei) };

        let maneuvers = self.extractor.extract(&self.route, si, ei);
        if maneuvers.is_empty() {
            return self.go_idle();
        }

        tracing::info!(
            start = si,
            end = ei,
            maneuvers = maneuvers.len(),
            "Leg set"
        );

        self.leg = Some(Leg::new(si, ei, maneuvers));
        self.state = TrackerState::Active;
        self.remaining_m = None;
        Vec::new()
    }

    /// Clear the leg explicitly.
    pub fn clear(&mut self) -> Vec<GuidanceEvent> {
        self.go_idle()
    }

    /// Process one position fix.
    pub fn on_fix(&mut self, fix: &Fix) -> Vec<GuidanceEvent> {
        if !fix.is_usable() || self.state != TrackerState::Active {
            return Vec::new();
        }
        let Some(here) = self.route.nearest_index(&fix.position) else {
            return Vec::new();
        };
        self.here_index = Some(here);

        let Some(leg) = self.leg.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        while let Some(maneuver) = leg.next_maneuver().copied() {
            let by_index = here + self.config.index_slack >= maneuver.route_index;
            let by_radius = haversine(&fix.position, &maneuver.point) <= self.config.pass_radius_m;
            if !(by_index || by_radius) {
                break;
            }
            leg.advance();
            tracing::info!(
                kind = %maneuver.kind,
                route_index = maneuver.route_index,
                here,
                by_index,
                by_radius,
                "Maneuver reached"
            );
            events.push(GuidanceEvent::ManeuverReached { maneuver });
        }

        match leg.next_maneuver().copied() {
            None => {
                self.state = TrackerState::Arrived;
                self.remaining_m = None;
                tracing::info!(end = leg.end_index(), "Leg complete");
                events.push(GuidanceEvent::Arrived);
            }
            Some(maneuver) => {
                let dist = self.route.distance_between(here, maneuver.route_index);
                self.remaining_m = Some(dist);
                if let Some(event) = self.dispatcher.dispatch(leg, &maneuver, dist) {
                    events.push(event);
                }
            }
        }

        events
    }

    /// End the current leg as arrived.
    ///
    /// Used when the destination is confirmed by other means (a stop's
    /// arrival radius, a courier's confirmation) before the fixes pass the
    /// terminal maneuver. Every maneuver still ahead is reported reached,
    /// followed by `Arrived`. Does nothing unless `Active`.
    pub fn finish(&mut self) -> Vec<GuidanceEvent> {
        if self.state != TrackerState::Active {
            return Vec::new();
        }
        let Some(leg) = self.leg.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        while let Some(maneuver) = leg.next_maneuver().copied() {
            leg.advance();
            events.push(GuidanceEvent::ManeuverReached { maneuver });
        }
        self.state = TrackerState::Arrived;
        self.remaining_m = None;
        tracing::info!(end = leg.end_index(), skipped = events.len(), "Leg finished early");
        events.push(GuidanceEvent::Arrived);
        events
    }

    fn go_idle(&mut self) -> Vec<GuidanceEvent> {
        if self.state != TrackerState::Idle {
            tracing::info!(from = %self.state, "Guidance idle");
        }
        self.leg = None;
        self.state = TrackerState::Idle;
        self.remaining_m = None;
        vec![GuidanceEvent::Idle]
    }
}
