//! Maneuver extraction.
//!
//! A maneuver is a classified direction change (or the arrival) anchored to a
//! route index. The [`ManeuverExtractor`] produces the ordered plan for one
//! leg; the plan is immutable once built and owned by the leg tracker.
//!
//! # Classification
//!
//! | `|angle|`          | kind                          |
//! |--------------------|-------------------------------|
//! | `< 25°`            | straight, not a maneuver      |
//! | `25° ..< 50°`      | `slight_left` / `slight_right`|
//! | `50° ..= 160°`     | `left` / `right`              |
//! | `> 160°`           | `uturn`                       |
//!
//! Negative angles turn left. Thresholds are configurable through
//! [`ManeuverThresholds`].

mod extractor;
mod types;

pub use extractor::ManeuverExtractor;
pub use types::{
    Maneuver, ManeuverKind, ManeuverThresholds, DEFAULT_SLIGHT_TURN_DEG, DEFAULT_TURN_DEG,
    DEFAULT_UTURN_DEG,
};
