//! DeliNavi - Turn-by-turn guidance for delivery couriers
//!
//! Couriers ride a route recorded ahead of time. This library turns that
//! polyline into classified maneuvers, tracks which maneuver is next as
//! position fixes arrive, and raises staged notifications as each one comes
//! closer. Around that core sit a lightweight companion announcer used when
//! no leg is set, a map/ride display mode switch, stop sequencing and a
//! presentation adapter that renders events as speech, vibration and HUD
//! cues.
//!
//! # Layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`geo`] | Distance, bearing and turn angle kernel |
//! | [`route`] | Immutable route with cumulative distances |
//! | [`maneuver`] | Maneuver classification and extraction |
//! | [`guidance`] | Leg tracker and staged notifications |
//! | [`companion`] | Point-by-point announcer without a leg |
//! | [`ride`] | Map/ride display mode detection |
//! | [`stops`] | Stop ordering and arrival handling |
//! | [`events`] | Event types and subscriber bus |
//! | [`announce`] | Speech, haptic and HUD cues from events |
//! | [`engine`] | Session wiring and the async fix feed |
//! | [`config`] | INI-backed settings |
//! | [`logging`] | Tracing subscriber setup |
//!
//! # Example
//!
//! ```ignore
//! use delinavi::engine::GuidanceEngine;
//! use delinavi::route::RouteModel;
//!
//! let mut engine = GuidanceEngine::with_defaults(RouteModel::new(points));
//! engine.set_leg(None, Some(destination));
//! for fix in fixes {
//!     for event in engine.on_fix(&fix) {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod announce;
pub mod companion;
pub mod config;
pub mod engine;
pub mod events;
pub mod geo;
pub mod guidance;
pub mod logging;
pub mod maneuver;
pub mod position;
pub mod ride;
pub mod route;
pub mod stops;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
