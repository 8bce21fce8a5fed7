//! Turn-by-turn guidance core.
//!
//! The [`LegTracker`] owns the current [`Leg`] and advances through it as
//! fixes arrive; the [`NotificationDispatcher`] turns remaining distance into
//! at-most-once [`Stage`] notifications.
//!
//! ```text
//! Fix ──> nearest index ──> pass detection ──> stage check ──> events
//! ```
//!
//! Nothing in here performs I/O. Every call returns the events it caused.

mod dispatcher;
mod leg;
mod tracker;

pub use dispatcher::{
    NotificationDispatcher, Stage, StageThresholds, DEFAULT_FAR_M, DEFAULT_MID_M, DEFAULT_NEAR_M,
};
pub use leg::Leg;
pub use tracker::{
    LegConfig, LegTracker, TrackerState, DEFAULT_INDEX_SLACK, DEFAULT_LOOKBACK_POINTS,
    DEFAULT_PASS_RADIUS_M,
};
