//! Guidance session.
//!
//! [`GuidanceEngine`] wires the route, leg tracker, companion announcer, ride
//! mode detector and optional stop sequencer together for one session. Each
//! call updates every component first, then publishes the resulting events on
//! the session's [`EventBus`] in the order they were produced:
//!
//! | Step | Component | Events |
//! |------|-----------|--------|
//! | 1 | ride mode detector | `DisplayModeChanged` |
//! | 2 | leg tracker, or companion when no leg is held | maneuver, stage, arrival |
//! | 3 | stop sequencer | `StopChanged`, `ArrivalPending`, leg replacement |
//!
//! A visited stop finishes the current leg first, so `Arrived` always comes
//! before the `StopChanged` that moves on. The replacement leg sees its first
//! fix on the next call.
//!
//! The engine has no timers. Callers serialize fixes; [`feed`] does that for
//! async producers.

pub mod feed;

pub use feed::{spawn_fix_feed, FeedMessage, SharedGuidanceEngine};

use std::sync::Arc;

use crate::companion::CompanionAnnouncer;
use crate::config::GuidanceConfig;
use crate::events::{EventBus, GuidanceEvent};
use crate::geo::Coordinate;
use crate::guidance::{LegTracker, TrackerState};
use crate::position::Fix;
use crate::ride::{DisplayMode, ModeOverride, ModeTransition, RideModeDetector};
use crate::route::RouteModel;
use crate::stops::{Stop, StopConfig, StopSequencer, StopUpdate};

/// One guidance session over a loaded route.
#[derive(Debug)]
pub struct GuidanceEngine {
    route: Arc<RouteModel>,
    tracker: LegTracker,
    companion: CompanionAnnouncer,
    ride: RideModeDetector,
    stop_config: StopConfig,
    stops: Option<StopSequencer>,
    bus: EventBus,
    fixes: u64,
}

impl GuidanceEngine {
    pub fn new(route: impl Into<Arc<RouteModel>>, config: &GuidanceConfig) -> Self {
        let route = route.into();
        if !route.is_ready() {
            tracing::warn!(points = route.len(), "Route too short, guidance stays idle");
        }
        tracing::info!(
            points = route.len(),
            length_m = route.total_length(),
            "Guidance session started"
        );
        Self {
            tracker: LegTracker::new(route.clone(), config.extractor(), config.leg),
            companion: CompanionAnnouncer::new(route.clone(), config.companion),
            ride: RideModeDetector::new(config.ride),
            stop_config: config.stops,
            stops: None,
            bus: EventBus::new(),
            fixes: 0,
            route,
        }
    }

    /// Session with default settings.
    pub fn with_defaults(route: impl Into<Arc<RouteModel>>) -> Self {
        Self::new(route, &GuidanceConfig::default())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn route(&self) -> &Arc<RouteModel> {
        &self.route
    }

    pub fn tracker(&self) -> &LegTracker {
        &self.tracker
    }

    pub fn state(&self) -> TrackerState {
        self.tracker.state()
    }

    pub fn companion(&self) -> &CompanionAnnouncer {
        &self.companion
    }

    pub fn ride(&self) -> &RideModeDetector {
        &self.ride
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.ride.mode()
    }

    pub fn stops(&self) -> Option<&StopSequencer> {
        self.stops.as_ref()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe and unsubscribe through this.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Number of usable fixes processed.
    pub fn fix_count(&self) -> u64 {
        self.fixes
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the leg. Returns the published events.
    pub fn set_leg(&mut self, prev: Option<Coordinate>, next: Option<Coordinate>) -> Vec<GuidanceEvent> {
        let events = self.tracker.set_leg(prev, next);
        self.publish(events)
    }

    /// Drop the leg and go idle.
    pub fn clear_leg(&mut self) -> Vec<GuidanceEvent> {
        let events = self.tracker.clear();
        self.publish(events)
    }

    /// Load a stop list; the first stop becomes the leg target.
    ///
    /// Replaces any earlier list. An empty list removes stop sequencing and
    /// leaves the current leg alone.
    pub fn load_stops(&mut self, stops: Vec<Stop>) -> Vec<GuidanceEvent> {
        if stops.is_empty() {
            self.stops = None;
            return Vec::new();
        }
        let mut sequencer = StopSequencer::new(self.route.clone(), stops, self.stop_config);
        let update = sequencer.start();
        self.stops = Some(sequencer);

        let mut events = Vec::new();
        self.apply_stop_update(update, &mut events);
        self.publish(events)
    }

    /// Process one fix. Returns the published events.
    pub fn on_fix(&mut self, fix: &Fix) -> Vec<GuidanceEvent> {
        if !fix.is_usable() {
            tracing::debug!(position = %fix.position, "Ignoring unusable fix");
            return Vec::new();
        }
        self.fixes += 1;

        let mut events = Vec::new();
        if let Some(transition) = self.ride.update(fix) {
            events.push(mode_event(transition));
        }

        if self.tracker.has_leg() {
            events.extend(self.tracker.on_fix(fix));
        } else {
            events.extend(
                self.companion
                    .on_fix(fix)
                    .into_iter()
                    .map(|announcement| GuidanceEvent::Companion { announcement }),
            );
        }

        // The leg toward a stop ends before the sequencer moves to the next one
        if let Some(sequencer) = self.stops.as_mut() {
            let update = sequencer.on_fix(fix);
            self.apply_stop_update(update, &mut events);
        }

        tracing::debug!(
            fix = self.fixes,
            here = ?self.tracker.here_index(),
            state = %self.tracker.state(),
            events = events.len(),
            "Fix processed"
        );
        self.publish(events)
    }

    /// Confirm arrival at the current or pending stop.
    pub fn confirm_arrival(&mut self) -> Vec<GuidanceEvent> {
        let Some(sequencer) = self.stops.as_mut() else {
            tracing::debug!("No stops loaded, nothing to confirm");
            return Vec::new();
        };
        let update = sequencer.confirm_arrival();
        let mut events = Vec::new();
        self.apply_stop_update(update, &mut events);
        self.publish(events)
    }

    /// Pin or release the display mode.
    pub fn set_mode_override(&mut self, mode_override: ModeOverride) -> Vec<GuidanceEvent> {
        let events = self.ride.set_override(mode_override).map(mode_event).into_iter().collect();
        self.publish(events)
    }

    fn apply_stop_update(&mut self, update: StopUpdate, events: &mut Vec<GuidanceEvent>) {
        if update.visited {
            events.extend(self.tracker.finish());
        }
        events.extend(update.events);
        if let Some((prev, next)) = update.leg {
            events.extend(self.tracker.set_leg(prev, next));
        }
    }

    fn publish(&self, events: Vec<GuidanceEvent>) -> Vec<GuidanceEvent> {
        let failures = self.bus.publish_all(&events);
        if failures > 0 {
            tracing::warn!(failures, "Some event subscribers failed");
        }
        events
    }
}

fn mode_event(transition: ModeTransition) -> GuidanceEvent {
    GuidanceEvent::DisplayModeChanged {
        from: transition.from,
        to: transition.to,
    }
}
