//! Spoken and on-screen text.

use crate::companion::TurnDirection;
use crate::maneuver::ManeuverKind;

/// Supported announcement languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Japanese,
    English,
}

impl Language {
    /// Pick a language from a BCP 47 tag such as `ja-JP` or `en-US`.
    ///
    /// Unknown tags fall back to Japanese.
    pub fn from_tag(tag: &str) -> Self {
        let lower = tag.trim().to_ascii_lowercase();
        if lower.starts_with("en") {
            Language::English
        } else {
            if !lower.starts_with("ja") {
                tracing::warn!(lang = tag, "Unsupported language, using Japanese");
            }
            Language::Japanese
        }
    }
}

/// Round a distance for speech and display.
pub fn rounded_meters(distance_m: f64) -> u64 {
    if distance_m.is_finite() {
        distance_m.max(0.0).round() as u64
    } else {
        0
    }
}

/// Phrase book for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhraseBook {
    language: Language,
}

impl PhraseBook {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Spoken approach announcement for a maneuver.
    ///
    /// The distance prefix is dropped when it rounds to zero; arrival ignores
    /// distance entirely.
    pub fn approach(&self, kind: ManeuverKind, distance_m: f64) -> String {
        let d = rounded_meters(distance_m);
        match self.language {
            Language::Japanese => {
                if kind == ManeuverKind::Arrive {
                    return "まもなく目的地です".to_string();
                }
                let base = if d > 0 {
                    format!("{}メートル先、", d)
                } else {
                    String::new()
                };
                let action = match kind {
                    ManeuverKind::Left => "左折です",
                    ManeuverKind::Right => "右折です",
                    ManeuverKind::SlightLeft => "やや左です",
                    ManeuverKind::SlightRight => "やや右です",
                    ManeuverKind::UTurn => "Uターンです",
                    ManeuverKind::Arrive => "",
                };
                base + action
            }
            Language::English => {
                if kind == ManeuverKind::Arrive {
                    return "Arriving at your destination soon.".to_string();
                }
                let action = match kind {
                    ManeuverKind::Left => "turn left",
                    ManeuverKind::Right => "turn right",
                    ManeuverKind::SlightLeft => "keep left",
                    ManeuverKind::SlightRight => "keep right",
                    ManeuverKind::UTurn => "make a U-turn",
                    ManeuverKind::Arrive => "",
                };
                if d > 0 {
                    format!("In {} meters, {}.", d, action)
                } else {
                    format!("{}.", capitalize(action))
                }
            }
        }
    }

    /// Companion turn announcement.
    pub fn companion_turn(&self, direction: TurnDirection, distance_m: f64) -> String {
        let d = rounded_meters(distance_m);
        match (self.language, direction) {
            (Language::Japanese, TurnDirection::Left) if d > 0 => {
                format!("この先 {} メートルで左です。", d)
            }
            (Language::Japanese, TurnDirection::Right) if d > 0 => {
                format!("この先 {} メートルで右です。", d)
            }
            (Language::Japanese, TurnDirection::Left) => "左です。".to_string(),
            (Language::Japanese, TurnDirection::Right) => "右です。".to_string(),
            (Language::English, TurnDirection::Left) if d > 0 => {
                format!("In {} meters, go left.", d)
            }
            (Language::English, TurnDirection::Right) if d > 0 => {
                format!("In {} meters, go right.", d)
            }
            (Language::English, TurnDirection::Left) => "Go left.".to_string(),
            (Language::English, TurnDirection::Right) => "Go right.".to_string(),
        }
    }

    /// Arrival at a point or named stop.
    pub fn arrived(&self, name: Option<&str>) -> String {
        let name = name.filter(|n| !n.trim().is_empty());
        match (self.language, name) {
            (Language::Japanese, Some(n)) => format!("{} に到着しました。", n),
            (Language::Japanese, None) => "目的地に到着しました。".to_string(),
            (Language::English, Some(n)) => format!("Arrived at {}.", n),
            (Language::English, None) => "You have arrived.".to_string(),
        }
    }

    pub fn off_route(&self) -> String {
        match self.language {
            Language::Japanese => {
                "予定ルートから外れています。安全に停車してご確認ください。".to_string()
            }
            Language::English => {
                "You are off the planned route. Please stop safely and check.".to_string()
            }
        }
    }

    pub fn resumed(&self) -> String {
        match self.language {
            Language::Japanese => "ルートへ復帰しました。".to_string(),
            Language::English => "Back on route.".to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HUD
    // ─────────────────────────────────────────────────────────────────────────

    /// First HUD line while approaching a maneuver.
    pub fn hud_line(&self, kind: ManeuverKind, distance_m: f64) -> String {
        if kind == ManeuverKind::Arrive {
            return self.arrival_banner();
        }
        let d = rounded_meters(distance_m);
        match self.language {
            Language::Japanese => {
                let label = match kind {
                    ManeuverKind::Left => "左折",
                    ManeuverKind::Right => "右折",
                    ManeuverKind::SlightLeft => "やや左",
                    ManeuverKind::SlightRight => "やや右",
                    ManeuverKind::UTurn => "Uターン",
                    ManeuverKind::Arrive => "目的地",
                };
                format!("{}m 先、{}", d, label)
            }
            Language::English => {
                let label = match kind {
                    ManeuverKind::Left => "left",
                    ManeuverKind::Right => "right",
                    ManeuverKind::SlightLeft => "slight left",
                    ManeuverKind::SlightRight => "slight right",
                    ManeuverKind::UTurn => "U-turn",
                    ManeuverKind::Arrive => "destination",
                };
                format!("{} m ahead, {}", d, label)
            }
        }
    }

    /// Second HUD line: a safety hint for the maneuver.
    pub fn hud_hint(&self, kind: ManeuverKind) -> String {
        match (self.language, kind) {
            (Language::Japanese, ManeuverKind::Arrive) => {
                "安全に停車して配達を完了してください".to_string()
            }
            (Language::Japanese, ManeuverKind::UTurn) => "安全を確認し、可能なら転回".to_string(),
            (Language::Japanese, _) => "周囲と歩行者にご注意ください".to_string(),
            (Language::English, ManeuverKind::Arrive) => {
                "Stop safely and complete the delivery".to_string()
            }
            (Language::English, ManeuverKind::UTurn) => {
                "Check surroundings and turn when safe".to_string()
            }
            (Language::English, _) => "Watch for traffic and pedestrians".to_string(),
        }
    }

    pub fn arrival_banner(&self) -> String {
        match self.language {
            Language::Japanese => "🏁 まもなく目的地です".to_string(),
            Language::English => "🏁 Destination ahead".to_string(),
        }
    }

    pub fn idle(&self) -> String {
        match self.language {
            Language::Japanese => "案内待機中".to_string(),
            Language::English => "Waiting for guidance".to_string(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_japanese_approach() {
        let ja = PhraseBook::new(Language::Japanese);
        assert_eq!(ja.approach(ManeuverKind::Left, 120.4), "120メートル先、左折です");
        assert_eq!(ja.approach(ManeuverKind::SlightRight, 59.5), "60メートル先、やや右です");
        assert_eq!(ja.approach(ManeuverKind::UTurn, 0.3), "Uターンです");
        assert_eq!(ja.approach(ManeuverKind::Arrive, 80.0), "まもなく目的地です");
    }

    #[test]
    fn test_english_approach() {
        let en = PhraseBook::new(Language::English);
        assert_eq!(en.approach(ManeuverKind::Right, 200.0), "In 200 meters, turn right.");
        assert_eq!(en.approach(ManeuverKind::Left, 0.0), "Turn left.");
        assert_eq!(en.approach(ManeuverKind::Arrive, 10.0), "Arriving at your destination soon.");
    }

    #[test]
    fn test_companion_phrases() {
        let ja = PhraseBook::new(Language::Japanese);
        assert_eq!(ja.companion_turn(TurnDirection::Right, 42.2), "この先 42 メートルで右です。");
        assert_eq!(ja.companion_turn(TurnDirection::Left, 0.0), "左です。");
        assert_eq!(ja.arrived(None), "目的地に到着しました。");
        assert_eq!(ja.arrived(Some("山田")), "山田 に到着しました。");
        assert_eq!(ja.arrived(Some("  ")), "目的地に到着しました。");
    }

    #[test]
    fn test_hud_lines() {
        let ja = PhraseBook::new(Language::Japanese);
        assert_eq!(ja.hud_line(ManeuverKind::Left, 85.0), "85m 先、左折");
        assert_eq!(ja.hud_line(ManeuverKind::Arrive, 85.0), "🏁 まもなく目的地です");
        assert_eq!(ja.idle(), "案内待機中");

        let en = PhraseBook::new(Language::English);
        assert_eq!(en.hud_line(ManeuverKind::SlightLeft, 30.0), "30 m ahead, slight left");
    }

    #[test]
    fn test_language_from_tag() {
        assert_eq!(Language::from_tag("ja-JP"), Language::Japanese);
        assert_eq!(Language::from_tag("en-GB"), Language::English);
        assert_eq!(Language::from_tag("fr-FR"), Language::Japanese);
    }

    #[test]
    fn test_rounded_meters() {
        assert_eq!(rounded_meters(-3.0), 0);
        assert_eq!(rounded_meters(f64::NAN), 0);
        assert_eq!(rounded_meters(24.5), 25);
    }
}
