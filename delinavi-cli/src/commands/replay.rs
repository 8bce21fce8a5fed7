//! Replay command - run a recorded fix log through the engine.
//!
//! Every published event is printed as one JSON line on stdout, followed by
//! the cue the presentation adapter renders for it (if any). Logs go to
//! stderr so the output can be piped.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use delinavi::announce::Cue;
use delinavi::config::ConfigFile;
use delinavi::engine::GuidanceEngine;
use delinavi::events::ListenerError;
use delinavi::geo::Coordinate;
use delinavi::logging::init_logging;
use delinavi::position::Fix;
use delinavi::route::RouteModel;
use delinavi::stops::Stop;

use crate::error::CliError;

/// Arguments for the replay command.
#[derive(Debug)]
pub struct ReplayArgs {
    pub route: PathBuf,
    pub fixes: PathBuf,
    pub stops: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub lang: Option<String>,
    pub companion: bool,
}

#[derive(Debug, Deserialize)]
struct PointRecord {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct FixRecord {
    lat: f64,
    lng: f64,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    heading: Option<f64>,
    /// Seconds since the start of the recording.
    #[serde(default)]
    t: f64,
}

impl FixRecord {
    fn to_fix(&self) -> Fix {
        let timestamp = if self.t.is_finite() && self.t > 0.0 {
            Duration::try_from_secs_f64(self.t).unwrap_or_default()
        } else {
            Duration::ZERO
        };
        let mut fix = Fix::at(self.lat, self.lng, timestamp);
        fix.speed_mps = self.speed;
        fix.heading_deg = self.heading;
        fix
    }
}

/// Run the replay command.
pub fn run(args: ReplayArgs) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    if let Some(lang) = &args.lang {
        config.guidance.voice.lang = lang.clone();
    }
    let _logging = init_logging(&config.logging)?;

    let points: Vec<PointRecord> = read_json(&args.route)?;
    let route = RouteModel::new(points.iter().map(|p| Coordinate::new(p.lat, p.lng)));
    let fixes: Vec<FixRecord> = read_json(&args.fixes)?;
    let stops: Vec<Stop> = match &args.stops {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let mut engine = GuidanceEngine::new(route, &config.guidance);
    engine.bus_mut().subscribe_all(|event| {
        let line = serde_json::to_string(event).map_err(|e| ListenerError::Failed(e.to_string()))?;
        println!("{}", line);
        Ok(())
    });
    config.guidance.announcer().attach(engine.bus_mut(), |cue: &Cue| {
        let line = serde_json::to_string(&serde_json::json!({ "cue": cue }))
            .map_err(|e| ListenerError::Failed(e.to_string()))?;
        println!("{}", line);
        Ok(())
    });

    if !stops.is_empty() {
        engine.load_stops(stops);
    } else if !args.companion {
        let start = engine.route().point(0).copied();
        let end = engine.route().points().last().copied();
        engine.set_leg(start, end);
    }

    for record in &fixes {
        engine.on_fix(&record.to_fix());
    }
    std::io::stdout().flush()?;

    tracing::info!(
        fixes = fixes.len(),
        used = engine.fix_count(),
        state = %engine.state(),
        "Replay finished"
    );
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::Input {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| CliError::Input {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fix_record_optional_fields() {
        let records: Vec<FixRecord> = serde_json::from_str(
            r#"[{"lat": 35.0, "lng": 139.0, "t": 1.5},
                {"lat": 35.0, "lng": 139.0, "speed": 4.2, "heading": 90, "t": 2}]"#,
        )
        .unwrap();

        let first = records[0].to_fix();
        assert_eq!(first.timestamp, Duration::from_millis(1500));
        assert!(first.speed_mps.is_none());

        let second = records[1].to_fix();
        assert_eq!(second.speed_mps, Some(4.2));
        assert_eq!(second.heading_deg, Some(90.0));
    }

    #[test]
    fn test_negative_timestamp_clamped() {
        let record = FixRecord {
            lat: 0.0,
            lng: 0.0,
            speed: None,
            heading: None,
            t: -3.0,
        };
        assert_eq!(record.to_fix().timestamp, Duration::ZERO);
    }

    #[test]
    fn test_read_json_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("route.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = read_json::<Vec<PointRecord>>(&path).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
        assert!(err.to_string().contains("route.json"));
    }

    #[test]
    fn test_broken_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.ini");
        std::fs::write(&config, "[leg]\npass_radius_m = oops\n").unwrap();

        let err = run(ReplayArgs {
            route: dir.path().join("route.json"),
            fixes: dir.path().join("fixes.json"),
            stops: None,
            config: Some(config),
            lang: None,
            companion: false,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_stops_parse_with_defaults() {
        let stops: Vec<Stop> = serde_json::from_str(
            r#"[{"id": "1", "name": "Yamada", "position": {"lat": 35.0, "lng": 139.0}},
                {"id": "2", "sequence": 1}]"#,
        )
        .unwrap();
        assert_eq!(stops[0].name, "Yamada");
        assert_eq!(stops[1].sequence, Some(1));
        assert!(stops[1].position.is_none());
    }
}
