//! Async fix feed.
//!
//! Position sources, stop screens and UI controls run on their own tasks.
//! They send [`FeedMessage`]s into one channel and a single consumer task
//! applies them to the engine in arrival order, so fixes never overlap and
//! a leg replacement is seen either entirely before or after a fix.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::geo::Coordinate;
use crate::position::Fix;
use crate::ride::ModeOverride;

use super::GuidanceEngine;

/// Engine shared between the feed task and readers.
pub type SharedGuidanceEngine = Arc<Mutex<GuidanceEngine>>;

/// Input accepted by the feed task.
#[derive(Debug, Clone)]
pub enum FeedMessage {
    Fix(Fix),
    SetLeg {
        prev: Option<Coordinate>,
        next: Option<Coordinate>,
    },
    ClearLeg,
    ConfirmArrival,
    SetModeOverride(ModeOverride),
    /// Stop the feed task. Dropping every sender does the same.
    Shutdown,
}

/// Spawn the consumer task.
///
/// The task resolves to the number of messages applied once the channel
/// closes or [`FeedMessage::Shutdown`] arrives.
pub fn spawn_fix_feed(
    engine: SharedGuidanceEngine,
    mut rx: UnboundedReceiver<FeedMessage>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut applied = 0usize;
        while let Some(message) = rx.recv().await {
            if matches!(message, FeedMessage::Shutdown) {
                tracing::debug!("Fix feed shutdown requested");
                break;
            }
            apply(&engine, message);
            applied += 1;
        }
        tracing::info!(applied, "Fix feed stopped");
        applied
    })
}

fn apply(engine: &SharedGuidanceEngine, message: FeedMessage) {
    let mut engine = engine.lock();
    match message {
        FeedMessage::Fix(fix) => {
            engine.on_fix(&fix);
        }
        FeedMessage::SetLeg { prev, next } => {
            engine.set_leg(prev, next);
        }
        FeedMessage::ClearLeg => {
            engine.clear_leg();
        }
        FeedMessage::ConfirmArrival => {
            engine.confirm_arrival();
        }
        FeedMessage::SetModeOverride(mode_override) => {
            engine.set_mode_override(mode_override);
        }
        FeedMessage::Shutdown => {}
    }
}
