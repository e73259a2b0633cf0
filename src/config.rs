//! Runtime configuration.
//!
//! Settings come from an HCL file (by default `~/.config/tactical-hud/config.hcl`)
//! and are then overridden by command-line flags. Every field has a default so an
//! empty or missing default file is fine; a file named explicitly must exist.
//!
//! ```hcl
//! model         = "gemini-3-flash-preview"
//! poll_interval = 60
//!
//! sensor {
//!   source = "gpsd"
//!   gpsd   = "127.0.0.1:2947"
//! }
//!
//! threat "leb" {
//!   name = "Lebanon"
//!   lat  = 33.9
//!   lng  = 35.5
//!   risk = "HIGH"
//! }
//! ```

use crate::error::ConfigError;
use crate::geo::Coordinate;
use crate::model::{default_threats, RiskLevel, Threat};
use directories::BaseDirs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace};

/// Config filename
const CONFIG: &str = "config.hcl";

/// Directory name under the config base
const TAG: &str = "tactical-hud";

/// Where positions and headings come from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// gpsd daemon over TCP
    Gpsd,
    /// Deterministic random walk
    #[default]
    Simulated,
    /// A single configured position
    Fixed,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub source: SourceKind,
    /// gpsd address
    pub gpsd: String,
    /// Origin of simulated/fixed sources
    pub lat: f64,
    pub lng: f64,
    /// Heading reported by the fixed source
    pub heading: Option<f64>,
    /// Reported accuracy of the fixed source, in meters
    pub accuracy: f64,
    /// Seconds between simulated updates or gpsd reconnects
    pub interval: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Simulated,
            gpsd: "127.0.0.1:2947".to_string(),
            lat: 32.0853,
            lng: 34.7818,
            heading: None,
            accuracy: 8.0,
            interval: 1,
        }
    }
}

impl SensorConfig {
    pub fn origin(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// One `threat "<id>" { ... }` block
#[derive(Clone, Debug, Deserialize)]
pub struct ThreatConfig {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub risk: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generative model name
    pub model: String,
    /// API root, without the `/v1beta/...` path
    pub api_base: String,
    /// Environment variables searched, in order, for the API key
    pub api_key_env: Vec<String>,
    /// Seconds between real-time alert polls
    pub poll_interval: u64,
    /// Seconds a real-time alert stays on screen
    pub alert_duration: u64,
    /// Screen rotation added to the heading (0, 90, 180, 270)
    pub rotation: f64,
    /// GeoJSON directory
    pub data_dir: PathBuf,
    /// Log directory, None disables file logging
    pub log_dir: Option<PathBuf>,
    pub sensor: SensorConfig,
    pub threat: BTreeMap<String, ThreatConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gemini-3-flash-preview".to_string(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: vec!["GEMINI_API_KEY".to_string(), "API_KEY".to_string()],
            poll_interval: 60,
            alert_duration: 15,
            rotation: 0.0,
            data_dir: PathBuf::from("data"),
            log_dir: config_dir(),
            sensor: SensorConfig::default(),
            threat: BTreeMap::new(),
        }
    }
}

/// Base configuration directory, `~/.config/tactical-hud` on Unix
pub fn config_dir() -> Option<PathBuf> {
    let base = BaseDirs::new()?;

    #[cfg(unix)]
    let dir = base.home_dir().join(".config").join(TAG);

    #[cfg(not(unix))]
    let dir = base.data_local_dir().join(TAG);

    Some(dir)
}

impl Config {
    /// Load `fname`, or the default file when present, or defaults.
    #[tracing::instrument]
    pub fn load(fname: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match fname {
            Some(p) if p.exists() => p.to_path_buf(),
            Some(p) => return Err(ConfigError::NotFound(p.display().to_string())),
            None => match config_dir().map(|d| d.join(CONFIG)) {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        trace!("loading config from {path:?}");
        let data = fs::read_to_string(&path)?;
        let cfg = Self::from_hcl(&data)?;
        debug!("config = {cfg:?}");
        Ok(cfg)
    }

    pub fn from_hcl(data: &str) -> Result<Self, ConfigError> {
        let cfg: Config = hcl::from_str(data)?;
        // Surface bad risk levels at load time rather than at first render
        cfg.threats()?;
        Ok(cfg)
    }

    /// Configured threat list, or the built-in one
    pub fn threats(&self) -> Result<Vec<Threat>, ConfigError> {
        if self.threat.is_empty() {
            return Ok(default_threats());
        }
        self.threat
            .iter()
            .map(|(id, t)| {
                let risk: RiskLevel = t.risk.parse().map_err(|reason| ConfigError::InvalidThreat {
                    id: id.clone(),
                    reason,
                })?;
                if !(-90.0..=90.0).contains(&t.lat) || !(-180.0..=180.0).contains(&t.lng) {
                    return Err(ConfigError::InvalidThreat {
                        id: id.clone(),
                        reason: format!("position {}, {} out of range", t.lat, t.lng),
                    });
                }
                Ok(Threat::new(id, &t.name, t.lat, t.lng, risk))
            })
            .collect()
    }

    pub fn poll_every(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(5))
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::from_secs(self.alert_duration)
    }

    /// First non-empty API key found in the configured variables
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let cfg = Config::from_hcl("").unwrap();
        assert_eq!(cfg.poll_interval, 60);
        assert_eq!(cfg.alert_duration, 15);
        assert_eq!(cfg.sensor.source, SourceKind::Simulated);
        assert_eq!(cfg.threats().unwrap().len(), 5);
    }

    #[test]
    fn test_parse_full() {
        let data = r#"
model         = "gemini-test"
poll_interval = 30
rotation      = 90

sensor {
  source = "fixed"
  lat    = 31.0
  lng    = 35.0
  heading = 45
}

threat "hai" {
  name = "Haifa Bay"
  lat  = 32.8
  lng  = 35.0
  risk = "LOW"
}
"#;
        let cfg = Config::from_hcl(data).unwrap();
        assert_eq!(cfg.model, "gemini-test");
        assert_eq!(cfg.poll_every(), Duration::from_secs(30));
        assert_eq!(cfg.rotation, 90.0);
        assert_eq!(cfg.sensor.source, SourceKind::Fixed);
        assert_eq!(cfg.sensor.heading, Some(45.0));
        assert_eq!(cfg.sensor.gpsd, "127.0.0.1:2947");

        let threats = cfg.threats().unwrap();
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].id, "hai");
        assert_eq!(threats[0].risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_bad_risk_is_rejected() {
        let data = r#"
threat "x" {
  name = "X"
  lat  = 1
  lng  = 2
  risk = "EXTREME"
}
"#;
        assert!(matches!(
            Config::from_hcl(data),
            Err(ConfigError::InvalidThreat { .. })
        ));
    }

    #[test]
    fn test_poll_interval_floor() {
        let cfg = Config {
            poll_interval: 0,
            ..Default::default()
        };
        assert_eq!(cfg.poll_every(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_explicit_file() {
        let res = Config::load(Some(Path::new("/nonexistent/tactical.hcl")));
        assert!(matches!(res, Err(ConfigError::NotFound(_))));
    }
}
