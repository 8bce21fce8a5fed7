//! Lightweight companion announcer.
//!
//! Drives notifications while no maneuver leg is held (for example before the
//! first stop is assigned). It looks only one route point ahead:
//!
//! - **Arrive**: the next route point is within `arrive_radius_m`.
//! - **Turn**: the next point is within `lookahead_m` and the route bends
//!   there by more than `turn_deadband_deg`.
//! - **Off-route**: the next point is farther than `off_route_m`. Repeated
//!   at most once per `off_route_interval` while it persists.
//! - **Resumed**: first fix back under the off-route threshold.
//!
//! Each event is keyed by the route index it concerns and never repeats for
//! the same index.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::geo::{haversine, turn_angle};
use crate::position::Fix;
use crate::route::RouteModel;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Default arrival radius around the next route point.
pub const DEFAULT_ARRIVE_RADIUS_M: f64 = 25.0;

/// Default distance at which an upcoming bend is announced.
pub const DEFAULT_LOOKAHEAD_M: f64 = 60.0;

/// Default bend below which the road counts as straight.
pub const DEFAULT_TURN_DEADBAND_DEG: f64 = 20.0;

/// Default distance from the next point that counts as off-route.
pub const DEFAULT_OFF_ROUTE_M: f64 = 40.0;

/// Default minimum time between repeated off-route warnings.
pub const DEFAULT_OFF_ROUTE_INTERVAL: Duration = Duration::from_secs(20);

/// Companion announcer parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompanionConfig {
    pub arrive_radius_m: f64,
    pub lookahead_m: f64,
    pub turn_deadband_deg: f64,
    pub off_route_m: f64,
    pub off_route_interval: Duration,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            arrive_radius_m: DEFAULT_ARRIVE_RADIUS_M,
            lookahead_m: DEFAULT_LOOKAHEAD_M,
            turn_deadband_deg: DEFAULT_TURN_DEADBAND_DEG,
            off_route_m: DEFAULT_OFF_ROUTE_M,
            off_route_interval: DEFAULT_OFF_ROUTE_INTERVAL,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Side of a companion turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    Left,
    Right,
}

/// Companion announcement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompanionEvent {
    Arrive {
        route_index: usize,
        distance_m: f64,
    },
    Turn {
        direction: TurnDirection,
        route_index: usize,
        distance_m: f64,
        angle_deg: f64,
    },
    OffRoute {
        distance_m: f64,
    },
    Resumed,
}

// ─────────────────────────────────────────────────────────────────────────────
// Announcer
// ─────────────────────────────────────────────────────────────────────────────

/// One-point-lookahead announcer with arrival/turn/off-route dedup.
#[derive(Debug, Clone)]
pub struct CompanionAnnouncer {
    route: Arc<RouteModel>,
    config: CompanionConfig,
    last_arrive_index: Option<usize>,
    last_turn_index: Option<usize>,
    off_route: bool,
    last_off_route_at: Option<Duration>,
}

impl CompanionAnnouncer {
    pub fn new(route: Arc<RouteModel>, config: CompanionConfig) -> Self {
        Self {
            route,
            config,
            last_arrive_index: None,
            last_turn_index: None,
            off_route: false,
            last_off_route_at: None,
        }
    }

    pub fn with_defaults(route: Arc<RouteModel>) -> Self {
        Self::new(route, CompanionConfig::default())
    }

    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    pub fn is_off_route(&self) -> bool {
        self.off_route
    }

    /// Process one fix.
    pub fn on_fix(&mut self, fix: &Fix) -> Vec<CompanionEvent> {
        if !fix.is_usable() {
            return Vec::new();
        }
        let Some(here) = self.route.nearest_index(&fix.position) else {
            return Vec::new();
        };
        let points = self.route.points();
        let last = points.len() - 1;
        let next_index = (here + 1).min(last);
        let next = points[next_index];
        let distance_m = haversine(&fix.position, &next);

        let mut events = Vec::new();

        if distance_m <= self.config.arrive_radius_m && self.last_arrive_index != Some(next_index) {
            self.last_arrive_index = Some(next_index);
            // Arrival at a point also consumes its turn announcement
            self.last_turn_index = Some(next_index);
            tracing::debug!(route_index = next_index, "Companion: arrive");
            events.push(CompanionEvent::Arrive {
                route_index: next_index,
                distance_m,
            });
            return events;
        }

        if distance_m <= self.config.lookahead_m && self.last_turn_index != Some(next_index) {
            let angle = self.bend_at(next_index);
            if angle.abs() >= self.config.turn_deadband_deg {
                let direction = if angle > 0.0 {
                    TurnDirection::Right
                } else {
                    TurnDirection::Left
                };
                self.last_turn_index = Some(next_index);
                tracing::debug!(route_index = next_index, direction = ?direction, "Companion: turn");
                events.push(CompanionEvent::Turn {
                    direction,
                    route_index: next_index,
                    distance_m,
                    angle_deg: angle,
                });
            }
        }

        if distance_m > self.config.off_route_m {
            let interval_elapsed = self
                .last_off_route_at
                .map_or(true, |at| fix.timestamp.saturating_sub(at) >= self.config.off_route_interval);
            if !self.off_route || interval_elapsed {
                if !self.off_route {
                    tracing::info!(distance_m = format!("{:.1}", distance_m), "Off route");
                }
                self.off_route = true;
                self.last_off_route_at = Some(fix.timestamp);
                events.push(CompanionEvent::OffRoute { distance_m });
            }
        } else if self.off_route {
            self.off_route = false;
            tracing::info!("Back on route");
            events.push(CompanionEvent::Resumed);
        }

        events
    }

    /// Raw turn angle at `index`; 0 at the route ends.
    ///
    /// Callers pass the upcoming point, not the courier's nearest point, so a
    /// bend is announced while it is still ahead. Once the courier stands on
    /// the corner, the next point's (usually straight) angle applies.
    fn bend_at(&self, index: usize) -> f64 {
        let points = self.route.points();
        if index == 0 || index + 1 >= points.len() {
            return 0.0;
        }
        turn_angle(&points[index - 1], &points[index], &points[index + 1])
    }
}
