//! Maneuver types and angle classification.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Below this turn magnitude the road is treated as continuing straight.
pub const DEFAULT_SLIGHT_TURN_DEG: f64 = 25.0;

/// From this magnitude a turn is a full left/right.
pub const DEFAULT_TURN_DEG: f64 = 50.0;

/// Above this magnitude a turn is a U-turn.
pub const DEFAULT_UTURN_DEG: f64 = 160.0;

// ─────────────────────────────────────────────────────────────────────────────
// Maneuver kind
// ─────────────────────────────────────────────────────────────────────────────

/// Classified direction change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    SlightLeft,
    Left,
    Right,
    SlightRight,
    #[serde(rename = "uturn")]
    UTurn,
    /// Terminal maneuver at the end of every leg.
    Arrive,
}

impl ManeuverKind {
    /// Stable identifier used in logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ManeuverKind::SlightLeft => "slight_left",
            ManeuverKind::Left => "left",
            ManeuverKind::Right => "right",
            ManeuverKind::SlightRight => "slight_right",
            ManeuverKind::UTurn => "uturn",
            ManeuverKind::Arrive => "arrive",
        }
    }

    /// Left or slight left.
    pub fn is_left(&self) -> bool {
        matches!(self, ManeuverKind::Left | ManeuverKind::SlightLeft)
    }

    /// Right or slight right.
    pub fn is_right(&self) -> bool {
        matches!(self, ManeuverKind::Right | ManeuverKind::SlightRight)
    }
}

impl std::fmt::Display for ManeuverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Maneuver
// ─────────────────────────────────────────────────────────────────────────────

/// A classified direction change (or arrival) anchored to a route index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    /// Index into the route model.
    pub route_index: usize,
    /// Route point at `route_index`.
    pub point: Coordinate,
    pub kind: ManeuverKind,
    /// Signed turn angle in `(-180, 180]`, negative left. 0 for arrival.
    pub angle_deg: f64,
}

impl Maneuver {
    /// Terminal arrival maneuver at `route_index`.
    pub fn arrive(route_index: usize, point: Coordinate) -> Self {
        Self {
            route_index,
            point,
            kind: ManeuverKind::Arrive,
            angle_deg: 0.0,
        }
    }

    pub fn is_arrival(&self) -> bool {
        self.kind == ManeuverKind::Arrive
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Thresholds
// ─────────────────────────────────────────────────────────────────────────────

/// Angle thresholds used to classify a turn.
///
/// ```text
/// |a| <  slight          -> straight (no maneuver)
/// slight <= |a| < turn   -> slight_left / slight_right
/// turn <= |a| <= uturn   -> left / right
/// |a| >  uturn           -> uturn
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverThresholds {
    pub slight_deg: f64,
    pub turn_deg: f64,
    pub uturn_deg: f64,
}

impl Default for ManeuverThresholds {
    fn default() -> Self {
        Self {
            slight_deg: DEFAULT_SLIGHT_TURN_DEG,
            turn_deg: DEFAULT_TURN_DEG,
            uturn_deg: DEFAULT_UTURN_DEG,
        }
    }
}

impl ManeuverThresholds {
    /// Whether the thresholds are finite and strictly increasing within 180°.
    pub fn is_consistent(&self) -> bool {
        [self.slight_deg, self.turn_deg, self.uturn_deg]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
            && self.slight_deg < self.turn_deg
            && self.turn_deg < self.uturn_deg
            && self.uturn_deg <= 180.0
    }

    /// Classify a signed turn angle. `None` means straight.
    pub fn classify(&self, angle_deg: f64) -> Option<ManeuverKind> {
        let magnitude = angle_deg.abs();
        let left = angle_deg < 0.0;

        if !magnitude.is_finite() || magnitude < self.slight_deg {
            None
        } else if magnitude > self.uturn_deg {
            Some(ManeuverKind::UTurn)
        } else if magnitude >= self.turn_deg {
            Some(if left {
                ManeuverKind::Left
            } else {
                ManeuverKind::Right
            })
        } else {
            Some(if left {
                ManeuverKind::SlightLeft
            } else {
                ManeuverKind::SlightRight
            })
        }
    }
}
