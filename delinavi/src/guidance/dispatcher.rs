//! Distance stages and the notification dispatcher.
//!
//! # Stages
//!
//! ```text
//!   far         mid          near        immediate
//! ───────┼────────────┼────────────┼──────────── maneuver
//!       250 m        80 m         25 m
//! ```
//!
//! A threshold belongs to the closer stage: exactly 250 m is `Mid`, exactly
//! 80 m is `Near`, exactly 25 m is `Immediate`.
//!
//! # Firing
//!
//! One notification per stage entry per maneuver. Skipped stages are not
//! backfilled, and moving back into a farther stage is tracked but never
//! re-announced.

use serde::{Deserialize, Serialize};

use crate::events::GuidanceEvent;
use crate::maneuver::Maneuver;

use super::leg::Leg;

/// Default far/mid boundary in meters.
pub const DEFAULT_FAR_M: f64 = 250.0;

/// Default mid/near boundary in meters.
pub const DEFAULT_MID_M: f64 = 80.0;

/// Default near/immediate boundary in meters.
pub const DEFAULT_NEAR_M: f64 = 25.0;

/// Discrete distance band ahead of a maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Far,
    Mid,
    Near,
    Immediate,
}

impl Stage {
    /// Numeric stage, 0 (far) through 3 (immediate).
    pub fn index(&self) -> u8 {
        match self {
            Stage::Far => 0,
            Stage::Mid => 1,
            Stage::Near => 2,
            Stage::Immediate => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Stage::Far),
            1 => Some(Stage::Mid),
            2 => Some(Stage::Near),
            3 => Some(Stage::Immediate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Far => "far",
            Stage::Mid => "mid",
            Stage::Near => "near",
            Stage::Immediate => "immediate",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage boundaries in meters, farthest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageThresholds {
    pub far_m: f64,
    pub mid_m: f64,
    pub near_m: f64,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            far_m: DEFAULT_FAR_M,
            mid_m: DEFAULT_MID_M,
            near_m: DEFAULT_NEAR_M,
        }
    }
}

impl StageThresholds {
    /// Whether the boundaries are finite, positive and strictly decreasing.
    pub fn is_consistent(&self) -> bool {
        self.near_m.is_finite()
            && self.far_m.is_finite()
            && self.near_m > 0.0
            && self.near_m < self.mid_m
            && self.mid_m < self.far_m
    }

    /// Stage for a remaining distance.
    pub fn stage_for(&self, remaining_m: f64) -> Stage {
        if remaining_m > self.far_m {
            Stage::Far
        } else if remaining_m > self.mid_m {
            Stage::Mid
        } else if remaining_m > self.near_m {
            Stage::Near
        } else {
            Stage::Immediate
        }
    }
}

/// Decides which stage notification, if any, a fix produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationDispatcher {
    thresholds: StageThresholds,
}

impl NotificationDispatcher {
    pub fn new(thresholds: StageThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &StageThresholds {
        &self.thresholds
    }

    /// Update the leg's stage for `maneuver` at `remaining_m`.
    ///
    /// Returns the stage event when a stage closer than any already announced
    /// for this maneuver was entered.
    pub fn dispatch(
        &self,
        leg: &mut Leg,
        maneuver: &Maneuver,
        remaining_m: f64,
    ) -> Option<GuidanceEvent> {
        let stage = self.thresholds.stage_for(remaining_m);
        if !leg.enter_stage(stage) {
            return None;
        }

        tracing::debug!(
            kind = %maneuver.kind,
            route_index = maneuver.route_index,
            stage = %stage,
            remaining_m = format!("{:.1}", remaining_m),
            "Stage entered"
        );

        Some(GuidanceEvent::StageEntered {
            maneuver: *maneuver,
            remaining_m,
            stage,
        })
    }
}
