//! Ride mode detection.
//!
//! Switches the host display between the map and the simplified ride HUD
//! based on ground speed, and keeps a smoothed heading for the HUD arrow.
//!
//! # Hysteresis
//!
//! ```text
//! Map  --[speed >= enter]-------------------------> Ride
//! Ride --[speed <= exit, held for exit_hold]------> Map
//! ```
//!
//! Speeds between the two thresholds keep the current mode and cancel a
//! pending exit. Entering is immediate; leaving needs the slow speed to
//! persist so that a red light does not flip the display back and forth.
//!
//! A manual override pins the mode until it is set back to `Auto`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geo::{bearing, haversine, normalize_180, normalize_360, Coordinate};
use crate::position::Fix;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Speed at or above which ride mode is entered (km/h).
pub const DEFAULT_ENTER_KMH: f64 = 8.0;

/// Speed at or below which ride mode starts to exit (km/h).
pub const DEFAULT_EXIT_KMH: f64 = 2.0;

/// How long the exit condition must hold.
pub const DEFAULT_EXIT_HOLD: Duration = Duration::from_secs(4);

/// Exponential smoothing factor for the heading filter.
pub const DEFAULT_HEADING_ALPHA: f64 = 0.25;

/// Minimum movement before a bearing of travel is trusted.
pub const DEFAULT_MIN_MOVE_M: f64 = 1.5;

/// Lower bound on the time step used for derived speed.
const MIN_SPEED_DT_SECS: f64 = 0.5;

/// Ride mode parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RideConfig {
    pub enter_kmh: f64,
    pub exit_kmh: f64,
    pub exit_hold: Duration,
    pub heading_alpha: f64,
    pub min_move_m: f64,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            enter_kmh: DEFAULT_ENTER_KMH,
            exit_kmh: DEFAULT_EXIT_KMH,
            exit_hold: DEFAULT_EXIT_HOLD,
            heading_alpha: DEFAULT_HEADING_ALPHA,
            min_move_m: DEFAULT_MIN_MOVE_M,
        }
    }
}

impl RideConfig {
    /// Whether exit is below enter and the smoothing factor is in `(0, 1]`.
    pub fn is_consistent(&self) -> bool {
        self.exit_kmh.is_finite()
            && self.enter_kmh.is_finite()
            && self.exit_kmh < self.enter_kmh
            && self.heading_alpha > 0.0
            && self.heading_alpha <= 1.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Modes
// ─────────────────────────────────────────────────────────────────────────────

/// What the host should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Map,
    Ride,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Map => write!(f, "map"),
            DisplayMode::Ride => write!(f, "ride"),
        }
    }
}

/// Manual override of the automatic mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeOverride {
    #[default]
    Auto,
    Ride,
    Map,
}

impl std::str::FromStr for ModeOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ModeOverride::Auto),
            "ride" => Ok(ModeOverride::Ride),
            "map" => Ok(ModeOverride::Map),
            other => Err(format!("unknown mode override: {}", other)),
        }
    }
}

/// A committed mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: DisplayMode,
    pub to: DisplayMode,
}

// ─────────────────────────────────────────────────────────────────────────────
// Heading filter
// ─────────────────────────────────────────────────────────────────────────────

/// Exponentially smoothed heading, wrap-aware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingFilter {
    alpha: f64,
    heading: f64,
}

impl HeadingFilter {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            heading: 0.0,
        }
    }

    /// Current smoothed heading in `[0, 360)`.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Blend a raw heading sample into the filter.
    pub fn update(&mut self, sample_deg: f64) -> f64 {
        if sample_deg.is_finite() {
            let delta = normalize_180(sample_deg - self.heading);
            self.heading = normalize_360(self.heading + self.alpha * delta);
        }
        self.heading
    }

    /// Arrow angle from `from` towards `target`, relative to the heading.
    pub fn relative_bearing(&self, from: &Coordinate, target: &Coordinate) -> f64 {
        normalize_360(bearing(from, target) - self.heading)
    }
}

impl Default for HeadingFilter {
    fn default() -> Self {
        Self::new(DEFAULT_HEADING_ALPHA)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detector
// ─────────────────────────────────────────────────────────────────────────────

/// Speed-driven map/ride switch.
#[derive(Debug, Clone)]
pub struct RideModeDetector {
    config: RideConfig,
    mode: DisplayMode,
    mode_override: ModeOverride,
    /// When the exit condition started holding.
    exit_pending_since: Option<Duration>,
    heading: HeadingFilter,
    last_fix: Option<Fix>,
    last_speed_kmh: f64,
}

impl RideModeDetector {
    pub fn new(config: RideConfig) -> Self {
        Self {
            config,
            mode: DisplayMode::Map,
            mode_override: ModeOverride::Auto,
            exit_pending_since: None,
            heading: HeadingFilter::new(config.heading_alpha),
            last_fix: None,
            last_speed_kmh: 0.0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RideConfig::default())
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn mode_override(&self) -> ModeOverride {
        self.mode_override
    }

    pub fn heading(&self) -> &HeadingFilter {
        &self.heading
    }

    /// Speed used for the last decision, km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.last_speed_kmh
    }

    /// Update with a fix. Returns the transition if the mode changed.
    pub fn update(&mut self, fix: &Fix) -> Option<ModeTransition> {
        if !fix.is_usable() {
            return None;
        }

        let speed_kmh = self.speed_mps(fix) * 3.6;
        self.last_speed_kmh = speed_kmh;
        self.update_heading(fix);
        self.last_fix = Some(*fix);

        let target = match self.mode_override {
            ModeOverride::Ride => DisplayMode::Ride,
            ModeOverride::Map => DisplayMode::Map,
            ModeOverride::Auto => self.auto_mode(speed_kmh, fix.timestamp),
        };
        self.switch_to(target, speed_kmh)
    }

    /// Pin or release the mode. Returns the transition if the mode changed.
    pub fn set_override(&mut self, mode_override: ModeOverride) -> Option<ModeTransition> {
        self.mode_override = mode_override;
        self.exit_pending_since = None;
        tracing::debug!(mode_override = ?mode_override, "Ride mode override");
        match mode_override {
            ModeOverride::Ride => self.switch_to(DisplayMode::Ride, self.last_speed_kmh),
            ModeOverride::Map => self.switch_to(DisplayMode::Map, self.last_speed_kmh),
            ModeOverride::Auto => None,
        }
    }

    fn auto_mode(&mut self, speed_kmh: f64, now: Duration) -> DisplayMode {
        if speed_kmh >= self.config.enter_kmh {
            self.exit_pending_since = None;
            return DisplayMode::Ride;
        }
        if speed_kmh > self.config.exit_kmh {
            self.exit_pending_since = None;
            return self.mode;
        }
        if self.mode == DisplayMode::Map {
            return DisplayMode::Map;
        }
        let since = *self.exit_pending_since.get_or_insert(now);
        if now.saturating_sub(since) >= self.config.exit_hold {
            self.exit_pending_since = None;
            DisplayMode::Map
        } else {
            DisplayMode::Ride
        }
    }

    fn switch_to(&mut self, target: DisplayMode, speed_kmh: f64) -> Option<ModeTransition> {
        if target == self.mode {
            return None;
        }
        let from = self.mode;
        self.mode = target;
        tracing::info!(
            from = %from,
            to = %target,
            speed_kmh = format!("{:.1}", speed_kmh),
            "Display mode transition"
        );
        Some(ModeTransition { from, to: target })
    }

    /// Reported speed, else distance over time since the last fix.
    fn speed_mps(&self, fix: &Fix) -> f64 {
        if let Some(speed) = fix.reported_speed() {
            return speed;
        }
        match self.last_fix {
            Some(prev) => {
                let dt = fix
                    .timestamp
                    .saturating_sub(prev.timestamp)
                    .as_secs_f64()
                    .max(MIN_SPEED_DT_SECS);
                haversine(&prev.position, &fix.position) / dt
            }
            None => 0.0,
        }
    }

    fn update_heading(&mut self, fix: &Fix) {
        let sample = fix.reported_heading().or_else(|| {
            self.last_fix.and_then(|prev| {
                (haversine(&prev.position, &fix.position) > self.config.min_move_m)
                    .then(|| bearing(&prev.position, &fix.position))
            })
        });
        if let Some(sample) = sample {
            self.heading.update(sample);
        }
    }
}

impl Default for RideModeDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}
