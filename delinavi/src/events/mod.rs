//! Guidance events and the subscriber bus.
//!
//! Core components never call out to speech, vibration or UI code. They
//! return [`GuidanceEvent`]s describing committed transitions, and the engine
//! publishes them on an [`EventBus`] after all state for the fix is updated.
//!
//! # Subscribers
//!
//! Each [`EventKind`] has its own ordered subscriber list. Handlers run in
//! registration order, synchronously, on the publishing thread. A handler
//! returning an error is logged and skipped; the remaining handlers still
//! run and engine state is unaffected.
//!
//! ```ignore
//! let mut bus = EventBus::new();
//! let id = bus.subscribe(EventKind::StageEntered, |event| {
//!     println!("{:?}", event);
//!     Ok(())
//! });
//! bus.unsubscribe(id);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::companion::CompanionEvent;
use crate::guidance::Stage;
use crate::maneuver::Maneuver;
use crate::ride::DisplayMode;
use crate::stops::StopSummary;

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// A committed guidance transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GuidanceEvent {
    /// The courier went by a maneuver.
    ManeuverReached { maneuver: Maneuver },

    /// A new distance stage was entered for the next maneuver.
    StageEntered {
        maneuver: Maneuver,
        remaining_m: f64,
        stage: Stage,
    },

    /// Every maneuver of the leg has been passed.
    Arrived,

    /// The leg was cleared or its target was invalid.
    Idle,

    /// Output of the lightweight companion announcer.
    Companion { announcement: CompanionEvent },

    /// Map/ride display switch.
    DisplayModeChanged { from: DisplayMode, to: DisplayMode },

    /// The (previous, current) stop pair changed.
    StopChanged {
        previous: Option<StopSummary>,
        current: Option<StopSummary>,
    },

    /// Arrival detected under manual confirmation; waiting for the courier.
    ArrivalPending { stop: StopSummary },
}

impl GuidanceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GuidanceEvent::ManeuverReached { .. } => EventKind::ManeuverReached,
            GuidanceEvent::StageEntered { .. } => EventKind::StageEntered,
            GuidanceEvent::Arrived => EventKind::Arrived,
            GuidanceEvent::Idle => EventKind::Idle,
            GuidanceEvent::Companion { .. } => EventKind::Companion,
            GuidanceEvent::DisplayModeChanged { .. } => EventKind::DisplayModeChanged,
            GuidanceEvent::StopChanged { .. } => EventKind::StopChanged,
            GuidanceEvent::ArrivalPending { .. } => EventKind::ArrivalPending,
        }
    }
}

/// Discriminant of [`GuidanceEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ManeuverReached,
    StageEntered,
    Arrived,
    Idle,
    Companion,
    DisplayModeChanged,
    StopChanged,
    ArrivalPending,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 8] = [
        EventKind::ManeuverReached,
        EventKind::StageEntered,
        EventKind::Arrived,
        EventKind::Idle,
        EventKind::Companion,
        EventKind::DisplayModeChanged,
        EventKind::StopChanged,
        EventKind::ArrivalPending,
    ];
}

// ─────────────────────────────────────────────────────────────────────────────
// Bus
// ─────────────────────────────────────────────────────────────────────────────

/// Errors a subscriber may report back to the bus.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The downstream backend failed.
    #[error("listener failed: {0}")]
    Failed(String),

    /// The downstream consumer has gone away.
    #[error("listener disconnected")]
    Disconnected,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Boxed subscriber callback.
pub type Handler = Box<dyn FnMut(&GuidanceEvent) -> Result<(), ListenerError> + Send>;

type SharedHandler = Arc<Mutex<Handler>>;

/// Ordered subscriber lists, one per event kind.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: HashMap<EventKind, Vec<(SubscriberId, SharedHandler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for one event kind.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriberId
    where
        F: FnMut(&GuidanceEvent) -> Result<(), ListenerError> + Send + 'static,
    {
        self.subscribe_many(&[kind], handler)
    }

    /// Register one handler for several kinds under a single id.
    ///
    /// The handler keeps its registration position independently in each
    /// kind's list.
    pub fn subscribe_many<F>(&mut self, kinds: &[EventKind], handler: F) -> SubscriberId
    where
        F: FnMut(&GuidanceEvent) -> Result<(), ListenerError> + Send + 'static,
    {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        let shared: SharedHandler = Arc::new(Mutex::new(Box::new(handler)));
        for kind in kinds {
            self.subscribers
                .entry(*kind)
                .or_default()
                .push((id, Arc::clone(&shared)));
        }
        tracing::debug!(subscriber = id.0, kinds = kinds.len(), "Subscriber registered");
        id
    }

    /// Register a handler for every event kind.
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriberId
    where
        F: FnMut(&GuidanceEvent) -> Result<(), ListenerError> + Send + 'static,
    {
        self.subscribe_many(&EventKind::ALL, handler)
    }

    /// Remove a subscriber from every list. Returns whether it was present.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let mut removed = false;
        for list in self.subscribers.values_mut() {
            let before = list.len();
            list.retain(|(sid, _)| *sid != id);
            removed |= list.len() != before;
        }
        removed
    }

    /// Number of handlers registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to its subscribers in registration order.
    ///
    /// Returns the number of handlers that failed.
    pub fn publish(&self, event: &GuidanceEvent) -> usize {
        let kind = event.kind();
        let Some(list) = self.subscribers.get(&kind) else {
            return 0;
        };

        let mut failures = 0;
        for (id, handler) in list {
            let result = {
                let mut handler = handler.lock();
                (*handler)(event)
            };
            if let Err(e) = result {
                failures += 1;
                tracing::warn!(subscriber = id.0, kind = ?kind, error = %e, "Subscriber failed");
            }
        }
        failures
    }

    /// Publish a batch in order.
    pub fn publish_all(&self, events: &[GuidanceEvent]) -> usize {
        events.iter().map(|e| self.publish(e)).sum()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .subscribers
            .iter()
            .map(|(k, v)| (*k, v.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("next_id", &self.next_id)
            .field("subscribers", &counts)
            .finish()
    }
}
