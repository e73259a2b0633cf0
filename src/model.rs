use crate::genai::GroundingSource;
use crate::geo::{distance_km, Coordinate};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Threat risk classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Med,
    High,
}

impl RiskLevel {
    /// Marker and label color on the HUD
    pub fn color(self) -> Color {
        match self {
            RiskLevel::High => Color::Rgb(0xff, 0x00, 0x00),
            RiskLevel::Med => Color::Rgb(0xff, 0xaa, 0x00),
            RiskLevel::Low => Color::Rgb(0x00, 0xff, 0x00),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Med => "MED",
            RiskLevel::High => "HIGH",
        })
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MED" | "MEDIUM" => Ok(RiskLevel::Med),
            "HIGH" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level {other:?}")),
        }
    }
}

/// A monitored sector with a static location
#[derive(Clone, Debug, PartialEq)]
pub struct Threat {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
    pub risk_level: RiskLevel,
    /// Distance from the user, recomputed on every position fix
    pub distance_km: Option<f64>,
    pub last_intel: Option<String>,
}

impl Threat {
    pub fn new(id: &str, name: &str, lat: f64, lng: f64, risk_level: RiskLevel) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            location: Coordinate::new(lat, lng),
            risk_level,
            distance_km: None,
            last_intel: None,
        }
    }

    pub fn update_distance(&mut self, from: Coordinate) {
        self.distance_km = Some(distance_km(from, self.location));
    }
}

/// Built-in sectors used when the configuration does not list any
pub fn default_threats() -> Vec<Threat> {
    vec![
        Threat::new("leb", "Lebanon", 33.9, 35.5, RiskLevel::High),
        Threat::new("gaz", "Gaza", 31.4, 34.4, RiskLevel::High),
        Threat::new("yem", "Yemen", 15.3, 44.2, RiskLevel::Med),
        Threat::new("ira", "Iran", 32.6, 53.6, RiskLevel::Med),
        Threat::new("syr", "Syria", 33.5, 36.3, RiskLevel::Med),
    ]
}

/// A Home Front Command alert as summarized by the AI backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HfcAlert {
    pub id: String,
    pub area: String,
    pub alert_type: String,
    pub time: String,
    pub date: String,
    pub is_new: bool,
    pub source_url: Option<String>,
}

impl HfcAlert {
    /// Ticker fragment for this alert
    pub fn ticker_text(&self) -> String {
        format!("[ ALERT: {} - {} ]", self.alert_type, self.area)
    }
}

/// HUD lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemStatus {
    Standby,
    Initializing,
    Active,
    /// Never entered by the control flow
    Error,
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SystemStatus::Standby => "STANDBY",
            SystemStatus::Initializing => "INITIALIZING",
            SystemStatus::Active => "ACTIVE",
            SystemStatus::Error => "ERROR",
        })
    }
}

/// Sitrep shown in the intel modal
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntelReport {
    pub threat_id: String,
    pub text: String,
    pub translated_text: Option<String>,
    /// Pages the report was grounded on
    pub sources: Vec<GroundingSource>,
    pub loading: bool,
    pub translating: bool,
    pub show_translated: bool,
}

impl IntelReport {
    pub fn loading(threat_id: &str) -> Self {
        Self {
            threat_id: threat_id.to_string(),
            loading: true,
            ..Default::default()
        }
    }

    /// Text currently on display
    pub fn display_text(&self) -> &str {
        match (&self.translated_text, self.show_translated) {
            (Some(t), true) => t,
            _ => &self.text,
        }
    }
}

/// GPS quality heuristics derived from the reported accuracy radius
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpsQuality {
    pub text: &'static str,
    pub sats: &'static str,
    pub quality: &'static str,
    pub color: Color,
}

impl GpsQuality {
    pub fn from_accuracy(accuracy_m: Option<f64>) -> Self {
        match accuracy_m {
            None => Self {
                text: "NO SIGNAL",
                sats: "0/0",
                quality: "0%",
                color: Color::Red,
            },
            Some(acc) if acc < 10.0 => Self {
                text: "SIG: EXCELLENT",
                sats: "14/22",
                quality: "98%",
                color: Color::Green,
            },
            Some(acc) if acc < 30.0 => Self {
                text: "SIG: GOOD",
                sats: "9/18",
                quality: "75%",
                color: Color::Yellow,
            },
            Some(_) => Self {
                text: "SIG: POOR",
                sats: "4/15",
                quality: "32%",
                color: Color::Rgb(0xff, 0x80, 0x00),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "NO SIGNAL", "0%")]
    #[case(Some(3.0), "SIG: EXCELLENT", "98%")]
    #[case(Some(10.0), "SIG: GOOD", "75%")]
    #[case(Some(29.9), "SIG: GOOD", "75%")]
    #[case(Some(30.0), "SIG: POOR", "32%")]
    fn test_gps_quality(#[case] acc: Option<f64>, #[case] text: &str, #[case] quality: &str) {
        let q = GpsQuality::from_accuracy(acc);
        assert_eq!(q.text, text);
        assert_eq!(q.quality, quality);
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!("high".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert_eq!("Med".parse::<RiskLevel>(), Ok(RiskLevel::Med));
        assert!("severe".parse::<RiskLevel>().is_err());
        assert_eq!(RiskLevel::Low.to_string(), "LOW");
    }

    #[test]
    fn test_update_distance() {
        let mut t = Threat::new("gaz", "Gaza", 31.4, 34.4, RiskLevel::High);
        assert!(t.distance_km.is_none());
        t.update_distance(Coordinate::new(31.4, 34.4));
        assert_eq!(t.distance_km, Some(0.0));
    }

    #[test]
    fn test_intel_display_text() {
        let mut r = IntelReport {
            text: "quiet".into(),
            ..Default::default()
        };
        assert_eq!(r.display_text(), "quiet");
        r.show_translated = true;
        assert_eq!(r.display_text(), "quiet");
        r.translated_text = Some("שקט".into());
        assert_eq!(r.display_text(), "שקט");
    }

    #[test]
    fn test_default_threats() {
        let threats = default_threats();
        assert_eq!(threats.len(), 5);
        assert_eq!(threats[0].id, "leb");
    }
}
