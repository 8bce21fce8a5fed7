//! Configuration.
//!
//! [`GuidanceConfig`] gathers every tunable of the engine and the
//! presentation adapter, each defaulting to the values the field app shipped
//! with. [`ConfigFile`] persists it, together with the logging settings, as
//! an INI file:
//!
//! ```ini
//! [voice]
//! enabled = true
//! lang = ja-JP
//!
//! [leg]
//! pass_radius_m = 18
//! stage_far_m = 250
//!
//! [stops]
//! arrival_policy = auto_advance
//! ```
//!
//! Missing keys keep their defaults. Keys are addressed as `section.key`
//! through [`ConfigKey`].

mod file;
mod keys;

pub use file::{config_file_path, ConfigFile};
pub use keys::ConfigKey;

use std::path::PathBuf;

use thiserror::Error;

use crate::announce::{Announcer, HapticSettings, VoiceSettings};
use crate::companion::CompanionConfig;
use crate::guidance::LegConfig;
use crate::maneuver::{ManeuverExtractor, ManeuverThresholds};
use crate::ride::RideConfig;
use crate::stops::StopConfig;

/// Errors raised while loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid INI.
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// `section.key` does not name a setting.
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// A value could not be parsed or is out of range.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// Values are individually valid but contradict each other.
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Maneuver extraction settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverConfig {
    pub thresholds: ManeuverThresholds,
    /// Collapse smoothed corners spread over adjacent indices.
    pub merge_adjacent: bool,
}

impl Default for ManeuverConfig {
    fn default() -> Self {
        Self {
            thresholds: ManeuverThresholds::default(),
            merge_adjacent: true,
        }
    }
}

/// Every guidance tunable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuidanceConfig {
    pub maneuver: ManeuverConfig,
    pub leg: LegConfig,
    pub companion: CompanionConfig,
    pub ride: RideConfig,
    pub stops: StopConfig,
    pub voice: VoiceSettings,
    pub haptic: HapticSettings,
}

impl GuidanceConfig {
    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.maneuver.thresholds.is_consistent() {
            return Err(ConfigError::Inconsistent(
                "maneuver thresholds must satisfy slight < turn < uturn <= 180".to_string(),
            ));
        }
        if !self.leg.stages.is_consistent() {
            return Err(ConfigError::Inconsistent(
                "stage thresholds must satisfy 0 < near < mid < far".to_string(),
            ));
        }
        if !self.ride.is_consistent() {
            return Err(ConfigError::Inconsistent(
                "ride.exit_kmh must be below ride.enter_kmh and heading_alpha in (0, 1]"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Extractor built from the maneuver settings.
    pub fn extractor(&self) -> ManeuverExtractor {
        ManeuverExtractor::new(self.maneuver.thresholds)
            .with_merge_adjacent(self.maneuver.merge_adjacent)
    }

    /// Announcer built from the voice and haptic settings.
    pub fn announcer(&self) -> Announcer {
        Announcer::new(self.voice.clone(), self.haptic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GuidanceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_stages_rejected() {
        let mut config = GuidanceConfig::default();
        config.leg.stages.mid_m = 300.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_ride_thresholds_checked() {
        let mut config = GuidanceConfig::default();
        config.ride.exit_kmh = 10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extractor_follows_merge_flag() {
        let mut config = GuidanceConfig::default();
        config.maneuver.merge_adjacent = false;
        assert_eq!(
            config.extractor(),
            ManeuverExtractor::default().with_merge_adjacent(false)
        );
    }
}
