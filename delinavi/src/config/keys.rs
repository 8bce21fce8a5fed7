//! Typed `section.key` addressing for configuration values.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::guidance::Stage;
use crate::stops::ArrivalPolicy;

use super::{ConfigError, ConfigFile};

/// One configurable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    VoiceEnabled,
    VoiceLang,
    VoiceRate,
    VoicePitch,
    VoiceVolume,
    HapticEnabled,
    HapticFromStage,
    ManeuverSlightDeg,
    ManeuverTurnDeg,
    ManeuverUturnDeg,
    ManeuverMergeAdjacent,
    LegLookbackPoints,
    LegPassRadiusM,
    LegIndexSlack,
    LegStageFarM,
    LegStageMidM,
    LegStageNearM,
    CompanionArriveRadiusM,
    CompanionLookaheadM,
    CompanionTurnDeadbandDeg,
    CompanionOffRouteM,
    CompanionOffRouteIntervalS,
    RideEnterKmh,
    RideExitKmh,
    RideExitHoldS,
    RideHeadingAlpha,
    RideMinMoveM,
    StopsArrivalRadiusM,
    StopsArrivalPolicy,
    LoggingLevel,
    LoggingDirectory,
}

const ALL_KEYS: [ConfigKey; 31] = [
    ConfigKey::VoiceEnabled,
    ConfigKey::VoiceLang,
    ConfigKey::VoiceRate,
    ConfigKey::VoicePitch,
    ConfigKey::VoiceVolume,
    ConfigKey::HapticEnabled,
    ConfigKey::HapticFromStage,
    ConfigKey::ManeuverSlightDeg,
    ConfigKey::ManeuverTurnDeg,
    ConfigKey::ManeuverUturnDeg,
    ConfigKey::ManeuverMergeAdjacent,
    ConfigKey::LegLookbackPoints,
    ConfigKey::LegPassRadiusM,
    ConfigKey::LegIndexSlack,
    ConfigKey::LegStageFarM,
    ConfigKey::LegStageMidM,
    ConfigKey::LegStageNearM,
    ConfigKey::CompanionArriveRadiusM,
    ConfigKey::CompanionLookaheadM,
    ConfigKey::CompanionTurnDeadbandDeg,
    ConfigKey::CompanionOffRouteM,
    ConfigKey::CompanionOffRouteIntervalS,
    ConfigKey::RideEnterKmh,
    ConfigKey::RideExitKmh,
    ConfigKey::RideExitHoldS,
    ConfigKey::RideHeadingAlpha,
    ConfigKey::RideMinMoveM,
    ConfigKey::StopsArrivalRadiusM,
    ConfigKey::StopsArrivalPolicy,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::VoiceEnabled => "voice.enabled",
            ConfigKey::VoiceLang => "voice.lang",
            ConfigKey::VoiceRate => "voice.rate",
            ConfigKey::VoicePitch => "voice.pitch",
            ConfigKey::VoiceVolume => "voice.volume",
            ConfigKey::HapticEnabled => "haptic.enabled",
            ConfigKey::HapticFromStage => "haptic.from_stage",
            ConfigKey::ManeuverSlightDeg => "maneuver.slight_deg",
            ConfigKey::ManeuverTurnDeg => "maneuver.turn_deg",
            ConfigKey::ManeuverUturnDeg => "maneuver.uturn_deg",
            ConfigKey::ManeuverMergeAdjacent => "maneuver.merge_adjacent",
            ConfigKey::LegLookbackPoints => "leg.lookback_points",
            ConfigKey::LegPassRadiusM => "leg.pass_radius_m",
            ConfigKey::LegIndexSlack => "leg.index_slack",
            ConfigKey::LegStageFarM => "leg.stage_far_m",
            ConfigKey::LegStageMidM => "leg.stage_mid_m",
            ConfigKey::LegStageNearM => "leg.stage_near_m",
            ConfigKey::CompanionArriveRadiusM => "companion.arrive_radius_m",
            ConfigKey::CompanionLookaheadM => "companion.lookahead_m",
            ConfigKey::CompanionTurnDeadbandDeg => "companion.turn_deadband_deg",
            ConfigKey::CompanionOffRouteM => "companion.off_route_m",
            ConfigKey::CompanionOffRouteIntervalS => "companion.off_route_interval_s",
            ConfigKey::RideEnterKmh => "ride.enter_kmh",
            ConfigKey::RideExitKmh => "ride.exit_kmh",
            ConfigKey::RideExitHoldS => "ride.exit_hold_s",
            ConfigKey::RideHeadingAlpha => "ride.heading_alpha",
            ConfigKey::RideMinMoveM => "ride.min_move_m",
            ConfigKey::StopsArrivalRadiusM => "stops.arrival_radius_m",
            ConfigKey::StopsArrivalPolicy => "stops.arrival_policy",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingDirectory => "logging.directory",
        }
    }

    /// INI section name.
    pub fn section(&self) -> &'static str {
        self.name().split_once('.').map_or("", |(s, _)| s)
    }

    /// Key name within the section.
    pub fn key_name(&self) -> &'static str {
        self.name().split_once('.').map_or("", |(_, k)| k)
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let g = &config.guidance;
        match self {
            ConfigKey::VoiceEnabled => g.voice.enabled.to_string(),
            ConfigKey::VoiceLang => g.voice.lang.clone(),
            ConfigKey::VoiceRate => g.voice.rate.to_string(),
            ConfigKey::VoicePitch => g.voice.pitch.to_string(),
            ConfigKey::VoiceVolume => g.voice.volume.to_string(),
            ConfigKey::HapticEnabled => g.haptic.enabled.to_string(),
            ConfigKey::HapticFromStage => g.haptic.from_stage.to_string(),
            ConfigKey::ManeuverSlightDeg => g.maneuver.thresholds.slight_deg.to_string(),
            ConfigKey::ManeuverTurnDeg => g.maneuver.thresholds.turn_deg.to_string(),
            ConfigKey::ManeuverUturnDeg => g.maneuver.thresholds.uturn_deg.to_string(),
            ConfigKey::ManeuverMergeAdjacent => g.maneuver.merge_adjacent.to_string(),
            ConfigKey::LegLookbackPoints => g.leg.lookback_points.to_string(),
            ConfigKey::LegPassRadiusM => g.leg.pass_radius_m.to_string(),
            ConfigKey::LegIndexSlack => g.leg.index_slack.to_string(),
            ConfigKey::LegStageFarM => g.leg.stages.far_m.to_string(),
            ConfigKey::LegStageMidM => g.leg.stages.mid_m.to_string(),
            ConfigKey::LegStageNearM => g.leg.stages.near_m.to_string(),
            ConfigKey::CompanionArriveRadiusM => g.companion.arrive_radius_m.to_string(),
            ConfigKey::CompanionLookaheadM => g.companion.lookahead_m.to_string(),
            ConfigKey::CompanionTurnDeadbandDeg => g.companion.turn_deadband_deg.to_string(),
            ConfigKey::CompanionOffRouteM => g.companion.off_route_m.to_string(),
            ConfigKey::CompanionOffRouteIntervalS => {
                g.companion.off_route_interval.as_secs_f64().to_string()
            }
            ConfigKey::RideEnterKmh => g.ride.enter_kmh.to_string(),
            ConfigKey::RideExitKmh => g.ride.exit_kmh.to_string(),
            ConfigKey::RideExitHoldS => g.ride.exit_hold.as_secs_f64().to_string(),
            ConfigKey::RideHeadingAlpha => g.ride.heading_alpha.to_string(),
            ConfigKey::RideMinMoveM => g.ride.min_move_m.to_string(),
            ConfigKey::StopsArrivalRadiusM => g.stops.arrival_radius_m.to_string(),
            ConfigKey::StopsArrivalPolicy => g.stops.policy.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse `value` and store it.
    ///
    /// Only the single value is checked here; cross-field constraints are
    /// checked by [`super::GuidanceConfig::validate`].
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let g = &mut config.guidance;
        match self {
            ConfigKey::VoiceEnabled => g.voice.enabled = self.parse_bool(value)?,
            ConfigKey::VoiceLang => g.voice.lang = self.parse_non_empty(value)?,
            ConfigKey::VoiceRate => g.voice.rate = self.parse_positive(value)?,
            ConfigKey::VoicePitch => g.voice.pitch = self.parse_non_negative(value)?,
            ConfigKey::VoiceVolume => g.voice.volume = self.parse_unit(value)?,
            ConfigKey::HapticEnabled => g.haptic.enabled = self.parse_bool(value)?,
            ConfigKey::HapticFromStage => g.haptic.from_stage = self.parse_stage(value)?,
            ConfigKey::ManeuverSlightDeg => {
                g.maneuver.thresholds.slight_deg = self.parse_non_negative(value)?
            }
            ConfigKey::ManeuverTurnDeg => {
                g.maneuver.thresholds.turn_deg = self.parse_non_negative(value)?
            }
            ConfigKey::ManeuverUturnDeg => {
                g.maneuver.thresholds.uturn_deg = self.parse_non_negative(value)?
            }
            ConfigKey::ManeuverMergeAdjacent => g.maneuver.merge_adjacent = self.parse_bool(value)?,
            ConfigKey::LegLookbackPoints => g.leg.lookback_points = self.parse_count(value)?,
            ConfigKey::LegPassRadiusM => g.leg.pass_radius_m = self.parse_non_negative(value)?,
            ConfigKey::LegIndexSlack => g.leg.index_slack = self.parse_count(value)?,
            ConfigKey::LegStageFarM => g.leg.stages.far_m = self.parse_positive(value)?,
            ConfigKey::LegStageMidM => g.leg.stages.mid_m = self.parse_positive(value)?,
            ConfigKey::LegStageNearM => g.leg.stages.near_m = self.parse_positive(value)?,
            ConfigKey::CompanionArriveRadiusM => {
                g.companion.arrive_radius_m = self.parse_non_negative(value)?
            }
            ConfigKey::CompanionLookaheadM => {
                g.companion.lookahead_m = self.parse_non_negative(value)?
            }
            ConfigKey::CompanionTurnDeadbandDeg => {
                g.companion.turn_deadband_deg = self.parse_non_negative(value)?
            }
            ConfigKey::CompanionOffRouteM => {
                g.companion.off_route_m = self.parse_non_negative(value)?
            }
            ConfigKey::CompanionOffRouteIntervalS => {
                g.companion.off_route_interval = self.parse_seconds(value)?
            }
            ConfigKey::RideEnterKmh => g.ride.enter_kmh = self.parse_non_negative(value)?,
            ConfigKey::RideExitKmh => g.ride.exit_kmh = self.parse_non_negative(value)?,
            ConfigKey::RideExitHoldS => g.ride.exit_hold = self.parse_seconds(value)?,
            ConfigKey::RideHeadingAlpha => g.ride.heading_alpha = self.parse_unit(value)?,
            ConfigKey::RideMinMoveM => g.ride.min_move_m = self.parse_non_negative(value)?,
            ConfigKey::StopsArrivalRadiusM => {
                g.stops.arrival_radius_m = self.parse_non_negative(value)?
            }
            ConfigKey::StopsArrivalPolicy => {
                g.stops.policy = value
                    .parse::<ArrivalPolicy>()
                    .map_err(|reason| self.invalid(value, &reason))?
            }
            ConfigKey::LoggingLevel => config.logging.level = self.parse_non_empty(value)?,
            ConfigKey::LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value))
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Value parsing
    // ─────────────────────────────────────────────────────────────────────────

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_non_empty(&self, value: &str) -> Result<String, ConfigError> {
        if value.is_empty() {
            Err(self.invalid(value, "must not be empty"))
        } else {
            Ok(value.to_string())
        }
    }

    fn parse_number(&self, value: &str) -> Result<f64, ConfigError> {
        match f64::from_str(value) {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(self.invalid(value, "expected a finite number")),
        }
    }

    fn parse_non_negative(&self, value: &str) -> Result<f64, ConfigError> {
        let v = self.parse_number(value)?;
        if v < 0.0 {
            return Err(self.invalid(value, "must not be negative"));
        }
        Ok(v)
    }

    fn parse_positive(&self, value: &str) -> Result<f64, ConfigError> {
        let v = self.parse_number(value)?;
        if v <= 0.0 {
            return Err(self.invalid(value, "must be greater than zero"));
        }
        Ok(v)
    }

    fn parse_unit(&self, value: &str) -> Result<f64, ConfigError> {
        let v = self.parse_number(value)?;
        if !(0.0..=1.0).contains(&v) {
            return Err(self.invalid(value, "must be between 0 and 1"));
        }
        Ok(v)
    }

    fn parse_count(&self, value: &str) -> Result<usize, ConfigError> {
        value
            .parse::<usize>()
            .map_err(|_| self.invalid(value, "expected a whole number"))
    }

    fn parse_seconds(&self, value: &str) -> Result<Duration, ConfigError> {
        let secs = self.parse_non_negative(value)?;
        Duration::try_from_secs_f64(secs).map_err(|_| self.invalid(value, "duration out of range"))
    }

    fn parse_stage(&self, value: &str) -> Result<Stage, ConfigError> {
        let stage = match value.to_ascii_lowercase().as_str() {
            "far" | "0" => Stage::Far,
            "mid" | "1" => Stage::Mid,
            "near" | "2" => Stage::Near,
            "immediate" | "3" => Stage::Immediate,
            _ => return Err(self.invalid(value, "expected far, mid, near or immediate")),
        };
        Ok(stage)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
