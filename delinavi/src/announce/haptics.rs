//! Vibration patterns.
//!
//! A pattern alternates vibrate/pause durations in milliseconds, starting
//! with a vibration, the same shape the platform vibration APIs take.

use serde::Serialize;

use crate::companion::TurnDirection;
use crate::maneuver::ManeuverKind;

/// Alternating vibrate/pause durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HapticPattern(&'static [u32]);

impl HapticPattern {
    // Approach (staged) patterns
    pub const APPROACH_LEFT: HapticPattern = HapticPattern(&[200, 90, 200, 90, 200]);
    pub const APPROACH_RIGHT: HapticPattern = HapticPattern(&[400, 120, 400]);

    // Maneuver reached
    pub const REACHED_LEFT: HapticPattern = HapticPattern(&[240, 80, 240, 80, 240]);
    pub const REACHED_RIGHT: HapticPattern = HapticPattern(&[500, 120, 500]);

    // Shared between approach and reached
    pub const UTURN: HapticPattern = HapticPattern(&[250, 80, 250, 80, 500]);
    pub const ARRIVE: HapticPattern = HapticPattern(&[300, 150, 900]);

    // Companion announcer
    pub const COMPANION_RIGHT: HapticPattern = HapticPattern(&[700, 250, 700]);
    pub const COMPANION_LEFT: HapticPattern = HapticPattern(&[250, 150, 250, 150, 250]);
    pub const OFF_ROUTE: HapticPattern = HapticPattern(&[200, 120, 200, 120, 600]);
    pub const RESUME: HapticPattern = HapticPattern(&[180, 120, 180]);

    pub fn durations_ms(&self) -> &'static [u32] {
        self.0
    }

    /// Sum of all vibrate and pause segments.
    pub fn total_ms(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Pattern announcing an upcoming maneuver.
    pub fn approach(kind: ManeuverKind) -> Self {
        match kind {
            ManeuverKind::Left | ManeuverKind::SlightLeft => Self::APPROACH_LEFT,
            ManeuverKind::Right | ManeuverKind::SlightRight => Self::APPROACH_RIGHT,
            ManeuverKind::UTurn => Self::UTURN,
            ManeuverKind::Arrive => Self::ARRIVE,
        }
    }

    /// Pattern marking a maneuver as reached.
    pub fn reached(kind: ManeuverKind) -> Self {
        match kind {
            ManeuverKind::Left | ManeuverKind::SlightLeft => Self::REACHED_LEFT,
            ManeuverKind::Right | ManeuverKind::SlightRight => Self::REACHED_RIGHT,
            ManeuverKind::UTurn => Self::UTURN,
            ManeuverKind::Arrive => Self::ARRIVE,
        }
    }

    pub fn companion_turn(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Left => Self::COMPANION_LEFT,
            TurnDirection::Right => Self::COMPANION_RIGHT,
        }
    }
}
