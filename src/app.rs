use crate::event::AppEvent;
use crate::geo::{normalize_heading, Coordinate};
use crate::map::{Lod, MapRenderer, Viewport};
use crate::model::{HfcAlert, IntelReport, SystemStatus, Threat};
use crate::ui;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Alerts shown on the ticker
const TICKER_ALERTS: usize = 5;

/// How long a live alert stays on screen unless configured otherwise
pub const DEFAULT_ALERT_TTL: Duration = Duration::from_secs(15);

/// Work the UI loop hands to the background services
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Start sensors, fetch history and begin polling
    Start,
    RefreshHistory,
    Intel { threat_id: String, sector: String },
    Translate { threat_id: String, text: String },
}

/// The live alert currently on screen
#[derive(Clone, Debug)]
pub struct ActiveAlert {
    pub alert: HfcAlert,
    pub expires_at: Instant,
}

/// Application state
pub struct App {
    pub status: SystemStatus,
    pub user_location: Option<Coordinate>,
    /// GPS accuracy radius, meters
    pub accuracy: Option<f64>,
    /// Normalized compass heading
    pub heading: f64,
    /// Added to the heading before the map is rotated
    pub rotation_offset: f64,
    pub threats: Vec<Threat>,
    /// First few history entries, shown on the ticker
    pub hfc_alerts: Vec<HfcAlert>,
    pub alert_history: Vec<HfcAlert>,
    pub is_scanning: bool,
    /// Keep the map centered on the user
    pub map_locked: bool,
    pub error: Option<String>,
    pub active_alert: Option<ActiveAlert>,
    pub alert_ttl: Duration,
    pub intel: Option<IntelReport>,
    pub show_history: bool,
    pub history_scroll: usize,
    /// Index into `sorted_threats()`
    pub selected: usize,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    /// Map cells on screen, inside the border
    pub map_area: Rect,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Frame counter for the marquee
    pub frame: u64,
}

impl App {
    pub fn new(width: u16, height: u16, threats: Vec<Threat>) -> Self {
        let map_area = ui::map_inner(Rect::new(0, 0, width, height));
        // Braille gives 2x4 resolution per character
        let viewport = Viewport::theatre(map_area.width as usize * 2, map_area.height as usize * 4);

        Self {
            status: SystemStatus::Standby,
            user_location: None,
            accuracy: None,
            heading: 0.0,
            rotation_offset: 0.0,
            threats,
            hfc_alerts: Vec::new(),
            alert_history: Vec::new(),
            is_scanning: false,
            map_locked: true,
            error: None,
            active_alert: None,
            alert_ttl: DEFAULT_ALERT_TTL,
            intel: None,
            show_history: false,
            history_scroll: 0,
            selected: 0,
            viewport,
            map_renderer: MapRenderer::new(),
            map_area,
            should_quit: false,
            last_mouse: None,
            frame: 0,
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_area = ui::map_inner(Rect::new(0, 0, width, height));
        self.viewport.width = self.map_area.width as usize * 2;
        self.viewport.height = self.map_area.height as usize * 4;
    }

    /// Leave standby. Returns the startup work, or `None` when already started.
    pub fn start_system(&mut self) -> Option<Command> {
        if self.status != SystemStatus::Standby {
            return None;
        }
        info!("system initialization");
        self.status = SystemStatus::Initializing;
        Some(Command::Start)
    }

    /// Sensors and services are running
    pub fn activate(&mut self) {
        if self.status == SystemStatus::Initializing {
            self.status = SystemStatus::Active;
        }
    }

    pub fn handle_position(&mut self, coord: Coordinate, accuracy_m: Option<f64>) {
        self.user_location = Some(coord);
        self.accuracy = accuracy_m;
        for threat in &mut self.threats {
            threat.update_distance(coord);
        }
        if self.map_locked {
            self.viewport.center_on(coord.lng, coord.lat);
        }
    }

    pub fn handle_heading(&mut self, heading: f64) {
        self.heading = normalize_heading(heading);
        self.apply_rotation();
    }

    /// Screen-mounting offset, e.g. a display installed sideways
    pub fn set_rotation_offset(&mut self, offset: f64) {
        self.rotation_offset = normalize_heading(offset);
        self.apply_rotation();
    }

    pub fn rotate_view(&mut self, delta: f64) {
        self.set_rotation_offset(self.rotation_offset + delta);
    }

    fn apply_rotation(&mut self) {
        self.viewport
            .set_heading(normalize_heading(self.heading + self.rotation_offset));
    }

    /// Merge a background result into the state
    pub fn apply(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::Position { coord, accuracy_m } => self.handle_position(coord, accuracy_m),
            AppEvent::Heading(h) => self.handle_heading(h),
            AppEvent::SensorError(msg) => self.error = Some(msg),
            AppEvent::HistoryStarted => self.is_scanning = true,
            AppEvent::History(result) => {
                self.is_scanning = false;
                if let Some(alerts) = result {
                    self.hfc_alerts = alerts.iter().take(TICKER_ALERTS).cloned().collect();
                    self.alert_history = alerts;
                    self.history_scroll = 0;
                }
            }
            AppEvent::RealTimeAlert(alert) => {
                self.alert_history.insert(0, alert.clone());
                self.active_alert = Some(ActiveAlert {
                    alert,
                    expires_at: now + self.alert_ttl,
                });
            }
            AppEvent::Intel { threat_id, report } => self.apply_intel(threat_id, report),
            AppEvent::Translation { threat_id, text } => self.apply_translation(threat_id, text),
        }
    }

    fn apply_intel(&mut self, threat_id: String, report: Option<crate::event::IntelResult>) {
        // Ignore answers for a modal that was closed or replaced
        match self.intel.as_ref() {
            Some(current) if current.threat_id == threat_id && current.loading => {}
            _ => {
                debug!("dropping stale intel for {threat_id}");
                return;
            }
        }

        match report {
            Some(result) => {
                if let Some(threat) = self.threats.iter_mut().find(|t| t.id == threat_id) {
                    threat.last_intel = Some(result.text.clone());
                }
                self.intel = Some(IntelReport {
                    threat_id,
                    text: result.text,
                    sources: result.sources,
                    ..Default::default()
                });
            }
            None => {
                self.intel = None;
                self.error = Some("INTEL_FETCH_ERROR".to_string());
            }
        }
    }

    fn apply_translation(&mut self, threat_id: String, text: Option<String>) {
        // Only the report that asked for it, and only while it still waits
        let Some(intel) = self
            .intel
            .as_mut()
            .filter(|i| i.threat_id == threat_id && i.translating)
        else {
            debug!("dropping stale translation for {threat_id}");
            return;
        };
        intel.translating = false;
        if let Some(text) = text {
            intel.translated_text = Some(text);
            intel.show_translated = true;
        }
    }

    /// Per-frame housekeeping
    pub fn tick(&mut self, now: Instant) {
        self.frame = self.frame.wrapping_add(1);
        if self
            .active_alert
            .as_ref()
            .is_some_and(|a| now >= a.expires_at)
        {
            self.active_alert = None;
        }
    }

    /// Threats ordered by ascending distance, unknown distances first
    pub fn sorted_threats(&self) -> Vec<&Threat> {
        let mut sorted: Vec<&Threat> = self.threats.iter().collect();
        sorted.sort_by(|a, b| {
            a.distance_km
                .unwrap_or(0.0)
                .total_cmp(&b.distance_km.unwrap_or(0.0))
        });
        sorted
    }

    pub fn select_next(&mut self) {
        if !self.threats.is_empty() {
            self.selected = (self.selected + 1) % self.threats.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.threats.is_empty() {
            self.selected = (self.selected + self.threats.len() - 1) % self.threats.len();
        }
    }

    /// Open the intel modal for the selected threat
    pub fn request_intel(&mut self) -> Option<Command> {
        if self.status != SystemStatus::Active {
            return None;
        }
        let threat = self.sorted_threats().get(self.selected).copied()?;
        let (threat_id, sector) = (threat.id.clone(), threat.name.clone());
        self.intel = Some(IntelReport::loading(&threat_id));
        Some(Command::Intel { threat_id, sector })
    }

    pub fn close_intel(&mut self) {
        self.intel = None;
    }

    /// Translate the open report, or flip between original and translation
    pub fn toggle_translation(&mut self) -> Option<Command> {
        let intel = self.intel.as_mut()?;
        if intel.loading || intel.translating {
            return None;
        }
        if intel.translated_text.is_some() {
            intel.show_translated = !intel.show_translated;
            return None;
        }
        intel.translating = true;
        Some(Command::Translate {
            threat_id: intel.threat_id.clone(),
            text: intel.text.clone(),
        })
    }

    pub fn toggle_history(&mut self) {
        self.show_history = !self.show_history;
        self.history_scroll = 0;
    }

    /// Force a history sync unless one is in flight
    pub fn refresh_history(&mut self) -> Option<Command> {
        if self.is_scanning || self.status != SystemStatus::Active {
            return None;
        }
        Some(Command::RefreshHistory)
    }

    pub fn scroll_history(&mut self, delta: isize) {
        let max = self.alert_history.len().saturating_sub(1);
        self.history_scroll = self.history_scroll.saturating_add_signed(delta).min(max);
    }

    pub fn toggle_lock(&mut self) {
        self.map_locked = !self.map_locked;
        if self.map_locked {
            if let Some(loc) = self.user_location {
                self.viewport.center_on(loc.lng, loc.lat);
            }
        }
    }

    /// Any manual map gesture releases the lock
    fn user_interaction(&mut self) {
        if self.map_locked {
            debug!("map unlocked by user");
        }
        self.map_locked = false;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.user_interaction();
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.user_interaction();
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.user_interaction();
        self.viewport.zoom_out();
    }

    /// Terminal cell to braille pixel inside the map
    fn to_map_pixels(&self, col: u16, row: u16) -> (i32, i32) {
        let px = col.saturating_sub(self.map_area.x) as i32 * 2;
        let py = row.saturating_sub(self.map_area.y) as i32 * 4;
        (px, py)
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        self.user_interaction();
        let (px, py) = self.to_map_pixels(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        self.user_interaction();
        let (px, py) = self.to_map_pixels(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Braille pixels per cell
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn lod_level(&self) -> &'static str {
        Lod::from_zoom(self.viewport.zoom).label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::IntelResult;
    use crate::genai::GroundingSource;
    use crate::model::{default_threats, RiskLevel};

    fn app() -> App {
        App::new(120, 40, default_threats())
    }

    fn active_app() -> App {
        let mut app = app();
        app.start_system();
        app.activate();
        app
    }

    fn alert(id: &str, area: &str) -> HfcAlert {
        HfcAlert {
            id: id.to_string(),
            area: area.to_string(),
            alert_type: "Rockets".to_string(),
            time: "12:00".to_string(),
            date: "01/01/2026".to_string(),
            is_new: false,
            source_url: None,
        }
    }

    #[test]
    fn test_start_system_once() {
        let mut app = app();
        assert_eq!(app.status, SystemStatus::Standby);
        assert_eq!(app.start_system(), Some(Command::Start));
        assert_eq!(app.status, SystemStatus::Initializing);
        app.activate();
        assert_eq!(app.status, SystemStatus::Active);
        assert_eq!(app.start_system(), None);
    }

    #[test]
    fn test_position_updates_distances_and_centers() {
        let mut app = app();
        let tel_aviv = Coordinate::new(32.0853, 34.7818);
        app.apply(
            AppEvent::Position {
                coord: tel_aviv,
                accuracy_m: Some(8.0),
            },
            Instant::now(),
        );
        assert_eq!(app.user_location, Some(tel_aviv));
        assert_eq!(app.accuracy, Some(8.0));
        assert!(app.threats.iter().all(|t| t.distance_km.is_some()));
        assert!((app.viewport.center_lat - 32.0853).abs() < 1e-9);

        let order: Vec<&str> = app.sorted_threats().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order[0], "gaz");
        assert_eq!(&order[3..], &["ira", "yem"]);
    }

    #[test]
    fn test_unlocked_map_stays_put() {
        let mut app = app();
        app.pan(10, 0);
        assert!(!app.map_locked);
        let lon = app.viewport.center_lon;
        app.handle_position(Coordinate::new(31.0, 34.0), None);
        assert_eq!(app.viewport.center_lon, lon);

        app.toggle_lock();
        assert!(app.map_locked);
        assert_eq!(app.viewport.center_lon, 34.0);
    }

    #[test]
    fn test_zoom_unlocks() {
        let mut app = app();
        app.zoom_in_at(10, 10);
        assert!(!app.map_locked);
    }

    #[test]
    fn test_heading_rotates_view() {
        let mut app = app();
        app.handle_heading(-90.0);
        assert_eq!(app.heading, 270.0);
        assert_eq!(app.viewport.rotation_deg, -270.0);

        app.set_rotation_offset(90.0);
        assert_eq!(app.viewport.rotation_deg, 0.0);
    }

    #[test]
    fn test_history_fills_ticker() {
        let mut app = active_app();
        app.apply(AppEvent::HistoryStarted, Instant::now());
        assert!(app.is_scanning);
        assert_eq!(app.refresh_history(), None);

        let alerts: Vec<_> = (0..8).map(|i| alert(&format!("h{i}"), "Sderot")).collect();
        app.apply(AppEvent::History(Some(alerts)), Instant::now());
        assert!(!app.is_scanning);
        assert_eq!(app.alert_history.len(), 8);
        assert_eq!(app.hfc_alerts.len(), 5);
        assert_eq!(app.refresh_history(), Some(Command::RefreshHistory));
    }

    #[test]
    fn test_failed_history_keeps_previous() {
        let mut app = active_app();
        app.apply(AppEvent::History(Some(vec![alert("h0", "Ashdod")])), Instant::now());
        app.apply(AppEvent::HistoryStarted, Instant::now());
        app.apply(AppEvent::History(None), Instant::now());
        assert!(!app.is_scanning);
        assert_eq!(app.alert_history.len(), 1);
    }

    #[test]
    fn test_empty_history_clears_ticker() {
        let mut app = active_app();
        app.apply(AppEvent::History(Some(vec![alert("h0", "Ashdod")])), Instant::now());
        app.apply(AppEvent::History(Some(Vec::new())), Instant::now());
        assert!(app.alert_history.is_empty());
        assert!(app.hfc_alerts.is_empty());
    }

    #[test]
    fn test_realtime_alert_expires() {
        let mut app = active_app();
        app.apply(AppEvent::History(Some(vec![alert("h0", "Ashdod")])), Instant::now());

        let start = Instant::now();
        app.apply(AppEvent::RealTimeAlert(alert("rt-1", "Haifa")), start);
        assert_eq!(app.alert_history[0].id, "rt-1");
        assert_eq!(app.alert_history.len(), 2);

        app.tick(start + Duration::from_secs(14));
        assert!(app.active_alert.is_some());
        app.tick(start + Duration::from_secs(15));
        assert!(app.active_alert.is_none());
    }

    #[test]
    fn test_intel_flow() {
        let mut app = active_app();
        assert!(app.request_intel().is_some());
        let threat_id = app.intel.as_ref().unwrap().threat_id.clone();
        assert!(app.intel.as_ref().unwrap().loading);
        assert_eq!(app.toggle_translation(), None);

        app.apply(
            AppEvent::Intel {
                threat_id: threat_id.clone(),
                report: Some(IntelResult {
                    text: "Quiet night.".to_string(),
                    sources: vec![GroundingSource {
                        uri: "https://example.com".to_string(),
                        title: None,
                    }],
                }),
            },
            Instant::now(),
        );
        let intel = app.intel.as_ref().unwrap();
        assert!(!intel.loading);
        assert_eq!(intel.display_text(), "Quiet night.");
        let threat = app.threats.iter().find(|t| t.id == threat_id).unwrap();
        assert_eq!(threat.last_intel.as_deref(), Some("Quiet night."));

        assert_eq!(
            app.toggle_translation(),
            Some(Command::Translate {
                threat_id: threat_id.clone(),
                text: "Quiet night.".to_string(),
            })
        );
        assert_eq!(app.toggle_translation(), None);
        app.apply(
            AppEvent::Translation {
                threat_id,
                text: Some("לילה שקט.".to_string()),
            },
            Instant::now(),
        );
        assert_eq!(app.intel.as_ref().unwrap().display_text(), "לילה שקט.");

        // Second press flips back without a request
        assert_eq!(app.toggle_translation(), None);
        assert_eq!(app.intel.as_ref().unwrap().display_text(), "Quiet night.");
    }

    #[test]
    fn test_intel_failure_sets_error() {
        let mut app = active_app();
        let Some(Command::Intel { threat_id, .. }) = app.request_intel() else {
            panic!("expected intel command");
        };
        app.apply(AppEvent::Intel { threat_id, report: None }, Instant::now());
        assert!(app.intel.is_none());
        assert_eq!(app.error.as_deref(), Some("INTEL_FETCH_ERROR"));
    }

    #[test]
    fn test_stale_intel_is_dropped() {
        let mut app = active_app();
        app.request_intel();
        app.close_intel();
        app.apply(
            AppEvent::Intel {
                threat_id: "leb".to_string(),
                report: None,
            },
            Instant::now(),
        );
        assert!(app.intel.is_none());
        assert!(app.error.is_none());
    }

    fn load_intel(app: &mut App, text: &str) -> String {
        let Some(Command::Intel { threat_id, .. }) = app.request_intel() else {
            panic!("expected intel command");
        };
        app.apply(
            AppEvent::Intel {
                threat_id: threat_id.clone(),
                report: Some(IntelResult {
                    text: text.to_string(),
                    sources: Vec::new(),
                }),
            },
            Instant::now(),
        );
        threat_id
    }

    #[test]
    fn test_translation_for_closed_report_is_dropped() {
        let mut app = active_app();
        let first = load_intel(&mut app, "Report A");
        assert!(app.toggle_translation().is_some());
        app.close_intel();

        app.select_next();
        let second = load_intel(&mut app, "Report B");
        assert_ne!(first, second);

        app.apply(
            AppEvent::Translation {
                threat_id: first,
                text: Some("TRANSLATION OF A".to_string()),
            },
            Instant::now(),
        );
        let intel = app.intel.as_ref().unwrap();
        assert_eq!(intel.display_text(), "Report B");
        assert!(intel.translated_text.is_none());
        assert!(!intel.show_translated);
    }

    #[test]
    fn test_translation_for_reopened_report_is_dropped() {
        let mut app = active_app();
        let threat_id = load_intel(&mut app, "Report A");
        assert!(app.toggle_translation().is_some());
        app.close_intel();
        load_intel(&mut app, "Report A");

        // Same threat, but the fresh report never asked for a translation
        app.apply(
            AppEvent::Translation {
                threat_id,
                text: Some("late".to_string()),
            },
            Instant::now(),
        );
        assert_eq!(app.intel.as_ref().unwrap().display_text(), "Report A");
    }

    #[test]
    fn test_intel_needs_active_system() {
        let mut app = app();
        assert_eq!(app.request_intel(), None);
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = App::new(
            80,
            24,
            vec![
                Threat::new("a", "A", 0.0, 0.0, RiskLevel::Low),
                Threat::new("b", "B", 1.0, 1.0, RiskLevel::Low),
            ],
        );
        app.select_prev();
        assert_eq!(app.selected, 1);
        app.select_next();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_sensor_error_shown() {
        let mut app = app();
        app.apply(
            AppEvent::SensorError("GPS: connection refused".to_string()),
            Instant::now(),
        );
        assert_eq!(app.error.as_deref(), Some("GPS: connection refused"));
    }

    #[test]
    fn test_history_scroll_clamps() {
        let mut app = app();
        app.alert_history = vec![alert("a", "x"), alert("b", "y")];
        app.scroll_history(5);
        assert_eq!(app.history_scroll, 1);
        app.scroll_history(-3);
        assert_eq!(app.history_scroll, 0);
    }
}
