//! Presentation adapter.
//!
//! Turns committed [`GuidanceEvent`]s into [`Cue`]s (spoken text, vibration
//! pattern, HUD lines) and hands them to a [`CueSink`]. The speech and
//! vibration backends live behind the sink; nothing in the guidance core
//! knows about them.
//!
//! # Event Mapping
//!
//! | Event                 | Voice                   | Haptic                       |
//! |-----------------------|-------------------------|------------------------------|
//! | `StageEntered`        | approach phrase         | approach, from haptic stage  |
//! | `ManeuverReached`     | none                    | reached                      |
//! | `Arrived`             | none                    | none                         |
//! | `Companion` turn      | companion phrase        | companion left/right         |
//! | `Companion` arrive    | arrival phrase          | arrive                       |
//! | `Companion` off-route | off-route warning       | off-route                    |
//! | `Companion` resumed   | back on route           | resume                       |
//! | `ArrivalPending`      | arrival with stop name  | arrive                       |
//!
//! Every cue also carries the HUD lines to show, when they change.

mod haptics;
mod phrases;

pub use haptics::HapticPattern;
pub use phrases::{rounded_meters, Language, PhraseBook};

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::companion::CompanionEvent;
use crate::events::{EventBus, GuidanceEvent, ListenerError, SubscriberId};
use crate::guidance::Stage;

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Speech output settings, passed through to the speech backend.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub enabled: bool,
    /// BCP 47 language tag.
    pub lang: String,
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lang: "ja-JP".to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Vibration output settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticSettings {
    pub enabled: bool,
    /// Approach cues vibrate only from this stage on.
    pub from_stage: Stage,
}

impl Default for HapticSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            from_stage: Stage::Near,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cues
// ─────────────────────────────────────────────────────────────────────────────

/// Two-line HUD text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HudText {
    pub line1: String,
    pub line2: String,
}

/// What the host should say, buzz and show for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haptic: Option<HapticPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hud: Option<HudText>,
}

impl Cue {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.haptic.is_none() && self.hud.is_none()
    }
}

/// Destination for cues: a speech/vibration/UI backend.
pub trait CueSink: Send {
    fn deliver(&mut self, cue: &Cue) -> Result<(), ListenerError>;
}

impl<F> CueSink for F
where
    F: FnMut(&Cue) -> Result<(), ListenerError> + Send,
{
    fn deliver(&mut self, cue: &Cue) -> Result<(), ListenerError> {
        self(cue)
    }
}

/// Logs cues through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl CueSink for TracingSink {
    fn deliver(&mut self, cue: &Cue) -> Result<(), ListenerError> {
        tracing::info!(
            text = cue.text.as_deref().unwrap_or(""),
            haptic = ?cue.haptic.map(|h| h.durations_ms()),
            hud = cue.hud.as_ref().map(|h| h.line1.as_str()).unwrap_or(""),
            "Cue"
        );
        Ok(())
    }
}

/// Collects cues in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    cues: Arc<Mutex<Vec<Cue>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything delivered so far.
    pub fn cues(&self) -> Vec<Cue> {
        self.cues.lock().clone()
    }

    pub fn take(&self) -> Vec<Cue> {
        std::mem::take(&mut *self.cues.lock())
    }
}

impl CueSink for MemorySink {
    fn deliver(&mut self, cue: &Cue) -> Result<(), ListenerError> {
        self.cues.lock().push(cue.clone());
        Ok(())
    }
}

/// Forwards cues to an async consumer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<Cue>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Cue>) -> Self {
        Self { tx }
    }
}

impl CueSink for ChannelSink {
    fn deliver(&mut self, cue: &Cue) -> Result<(), ListenerError> {
        self.tx
            .send(cue.clone())
            .map_err(|_| ListenerError::Disconnected)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Announcer
// ─────────────────────────────────────────────────────────────────────────────

/// Maps guidance events to cues.
#[derive(Debug, Clone)]
pub struct Announcer {
    phrases: PhraseBook,
    voice: VoiceSettings,
    haptics: HapticSettings,
}

impl Announcer {
    pub fn new(voice: VoiceSettings, haptics: HapticSettings) -> Self {
        Self {
            phrases: PhraseBook::new(Language::from_tag(&voice.lang)),
            voice,
            haptics,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(VoiceSettings::default(), HapticSettings::default())
    }

    pub fn phrases(&self) -> &PhraseBook {
        &self.phrases
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.voice
    }

    /// Subscribe to every event on `bus`, delivering cues to `sink`.
    pub fn attach<S>(self, bus: &mut EventBus, mut sink: S) -> SubscriberId
    where
        S: CueSink + 'static,
    {
        bus.subscribe_all(move |event| match self.cue_for(event) {
            Some(cue) => sink.deliver(&cue),
            None => Ok(()),
        })
    }

    /// The cue for an event, if it produces anything.
    pub fn cue_for(&self, event: &GuidanceEvent) -> Option<Cue> {
        let p = &self.phrases;
        let (text, haptic, hud) = match event {
            GuidanceEvent::StageEntered {
                maneuver,
                remaining_m,
                stage,
            } => (
                Some(p.approach(maneuver.kind, *remaining_m)),
                (*stage >= self.haptics.from_stage).then(|| HapticPattern::approach(maneuver.kind)),
                Some(HudText {
                    line1: p.hud_line(maneuver.kind, *remaining_m),
                    line2: p.hud_hint(maneuver.kind),
                }),
            ),
            GuidanceEvent::ManeuverReached { maneuver } => {
                (None, Some(HapticPattern::reached(maneuver.kind)), None)
            }
            GuidanceEvent::Arrived => (
                None,
                None,
                Some(HudText {
                    line1: p.arrival_banner(),
                    line2: String::new(),
                }),
            ),
            GuidanceEvent::Idle => (
                None,
                None,
                Some(HudText {
                    line1: p.idle(),
                    line2: String::new(),
                }),
            ),
            GuidanceEvent::Companion { announcement } => match announcement {
                CompanionEvent::Arrive { .. } => {
                    (Some(p.arrived(None)), Some(HapticPattern::ARRIVE), None)
                }
                CompanionEvent::Turn {
                    direction,
                    distance_m,
                    ..
                } => (
                    Some(p.companion_turn(*direction, *distance_m)),
                    Some(HapticPattern::companion_turn(*direction)),
                    None,
                ),
                CompanionEvent::OffRoute { .. } => {
                    (Some(p.off_route()), Some(HapticPattern::OFF_ROUTE), None)
                }
                CompanionEvent::Resumed => (Some(p.resumed()), Some(HapticPattern::RESUME), None),
            },
            GuidanceEvent::ArrivalPending { stop } => (
                Some(p.arrived(Some(&stop.name))),
                Some(HapticPattern::ARRIVE),
                None,
            ),
            GuidanceEvent::DisplayModeChanged { .. } | GuidanceEvent::StopChanged { .. } => {
                return None;
            }
        };

        let cue = Cue {
            text: text.filter(|_| self.voice.enabled),
            haptic: haptic.filter(|_| self.haptics.enabled),
            hud,
        };
        (!cue.is_empty()).then_some(cue)
    }
}

impl Default for Announcer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::TurnDirection;
    use crate::geo::Coordinate;
    use crate::maneuver::{Maneuver, ManeuverKind};

    fn left() -> Maneuver {
        Maneuver {
            route_index: 5,
            point: Coordinate::new(0.0, 0.0),
            kind: ManeuverKind::Left,
            angle_deg: -90.0,
        }
    }

    fn stage_event(stage: Stage, remaining_m: f64) -> GuidanceEvent {
        GuidanceEvent::StageEntered {
            maneuver: left(),
            remaining_m,
            stage,
        }
    }

    #[test]
    fn test_far_stage_speaks_without_vibration() {
        let cue = Announcer::with_defaults()
            .cue_for(&stage_event(Stage::Mid, 200.0))
            .unwrap();
        assert_eq!(cue.text.as_deref(), Some("200メートル先、左折です"));
        assert_eq!(cue.haptic, None);
        assert_eq!(cue.hud.unwrap().line1, "200m 先、左折");
    }

    #[test]
    fn test_near_stage_vibrates() {
        let cue = Announcer::with_defaults()
            .cue_for(&stage_event(Stage::Near, 60.0))
            .unwrap();
        assert_eq!(cue.haptic, Some(HapticPattern::APPROACH_LEFT));
    }

    #[test]
    fn test_reached_is_haptic_only() {
        let cue = Announcer::with_defaults()
            .cue_for(&GuidanceEvent::ManeuverReached { maneuver: left() })
            .unwrap();
        assert_eq!(cue.text, None);
        assert_eq!(cue.haptic, Some(HapticPattern::REACHED_LEFT));
    }

    #[test]
    fn test_disabled_channels() {
        let announcer = Announcer::new(
            VoiceSettings {
                enabled: false,
                ..VoiceSettings::default()
            },
            HapticSettings {
                enabled: false,
                ..HapticSettings::default()
            },
        );
        // Reached has neither voice nor HUD, so nothing is left
        assert_eq!(
            announcer.cue_for(&GuidanceEvent::ManeuverReached { maneuver: left() }),
            None
        );
        let cue = announcer.cue_for(&stage_event(Stage::Immediate, 10.0)).unwrap();
        assert_eq!(cue.text, None);
        assert_eq!(cue.haptic, None);
        assert!(cue.hud.is_some());
    }

    #[test]
    fn test_companion_cues() {
        let a = Announcer::new(
            VoiceSettings {
                lang: "en-US".into(),
                ..VoiceSettings::default()
            },
            HapticSettings::default(),
        );
        let cue = a
            .cue_for(&GuidanceEvent::Companion {
                announcement: CompanionEvent::Turn {
                    direction: TurnDirection::Right,
                    route_index: 3,
                    distance_m: 41.6,
                    angle_deg: 80.0,
                },
            })
            .unwrap();
        assert_eq!(cue.text.as_deref(), Some("In 42 meters, go right."));
        assert_eq!(cue.haptic, Some(HapticPattern::COMPANION_RIGHT));

        let cue = a
            .cue_for(&GuidanceEvent::Companion {
                announcement: CompanionEvent::Resumed,
            })
            .unwrap();
        assert_eq!(cue.haptic, Some(HapticPattern::RESUME));
    }

    #[test]
    fn test_idle_hud() {
        let cue = Announcer::with_defaults().cue_for(&GuidanceEvent::Idle).unwrap();
        assert_eq!(cue.hud.unwrap().line1, "案内待機中");
    }

    #[test]
    fn test_attach_delivers_to_sink() {
        let mut bus = EventBus::new();
        let sink = MemorySink::new();
        Announcer::with_defaults().attach(&mut bus, sink.clone());

        bus.publish(&stage_event(Stage::Far, 300.0));
        bus.publish(&GuidanceEvent::DisplayModeChanged {
            from: crate::ride::DisplayMode::Map,
            to: crate::ride::DisplayMode::Ride,
        });

        let cues = sink.cues();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text.as_deref(), Some("300メートル先、左折です"));
    }

    #[test]
    fn test_closed_channel_reports_disconnected() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        let cue = Cue {
            text: Some("x".into()),
            haptic: None,
            hud: None,
        };
        assert!(matches!(sink.deliver(&cue), Err(ListenerError::Disconnected)));
    }
}
