//! Position fixes reported by the host.
//!
//! A [`Fix`] is one GPS sample. The host delivers fixes one at a time in
//! chronological order; the engine does not reorder or deduplicate them.
//!
//! # Timestamps
//!
//! `timestamp` is monotonic time since an arbitrary session epoch chosen by
//! the host. Only differences between timestamps are ever used (off-route
//! re-announce interval, ride-mode exit hold, derived speed). Stale or
//! out-of-order fixes are not detected; that is the host's responsibility.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A single reported position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Reported position.
    pub position: Coordinate,
    /// Ground speed in meters per second, when the receiver reports it.
    pub speed_mps: Option<f64>,
    /// Direction of travel in degrees from north, when reported.
    pub heading_deg: Option<f64>,
    /// Time since session start.
    pub timestamp: Duration,
}

impl Fix {
    /// Create a fix with position and timestamp only.
    pub fn new(position: Coordinate, timestamp: Duration) -> Self {
        Self {
            position,
            speed_mps: None,
            heading_deg: None,
            timestamp,
        }
    }

    /// Create a fix from raw latitude/longitude at `timestamp`.
    pub fn at(lat: f64, lng: f64, timestamp: Duration) -> Self {
        Self::new(Coordinate::new(lat, lng), timestamp)
    }

    /// Attach a reported ground speed.
    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    /// Attach a reported heading.
    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }

    /// Whether the position can be fed to the engine.
    ///
    /// Fixes failing this check are ignored silently.
    pub fn is_usable(&self) -> bool {
        self.position.is_valid()
    }

    /// Reported speed, if present and meaningful.
    pub fn reported_speed(&self) -> Option<f64> {
        self.speed_mps.filter(|s| s.is_finite() && *s >= 0.0)
    }

    /// Reported heading, if present and finite.
    pub fn reported_heading(&self) -> Option<f64> {
        self.heading_deg.filter(|h| h.is_finite())
    }
}
