mod cli;

use anyhow::{Context, Result};
use clap::{crate_name, crate_version, Parser};
use crossterm::event::{
    self as term, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tactical_hud::alerts::AlertService;
use tactical_hud::app::{App, Command};
use tactical_hud::config::Config;
use tactical_hud::data;
use tactical_hud::event::{self, EventReceiver};
use tactical_hud::genai::GeminiClient;
use tactical_hud::logging::init_logging;
use tactical_hud::model::SystemStatus;
use tactical_hud::sensor::SensorBridge;
use tactical_hud::ui;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::cli::Opts;

/// Background work started from the UI loop
struct Services {
    alerts: AlertService,
    sensors: SensorBridge,
}

impl Services {
    fn dispatch(&self, app: &mut App, command: Command) {
        match command {
            Command::Start => {
                self.sensors.start();
                self.alerts.fetch_history();
                self.alerts.start_polling();
                app.activate();
            }
            Command::RefreshHistory => {
                self.alerts.fetch_history();
            }
            Command::Intel { threat_id, sector } => {
                self.alerts.request_intel(&threat_id, &sector);
            }
            Command::Translate { threat_id, text } => {
                self.alerts.request_translation(&threat_id, &text);
            }
        }
    }
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    let mut cfg = Config::load(opts.config.as_deref()).context("loading configuration")?;
    opts.apply(&mut cfg);

    let _guard = init_logging(cfg.log_dir.as_deref(), opts.log_level.as_deref())?;
    info!("{} {} starting", crate_name!(), crate_version!());

    let threats = cfg.threats()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("hud-worker")
        .build()
        .context("starting runtime")?;

    let key_hint = cfg.api_key_env.join("/");
    let model = GeminiClient::new(&cfg.api_base, &cfg.model, cfg.api_key(), &key_hint)?;
    if !model.is_configured() {
        warn!("no API key in {key_hint}, alert feed disabled");
    }

    let (tx, rx) = event::channel();
    let services = Services {
        alerts: AlertService::new(
            Arc::new(model),
            tx.clone(),
            cfg.poll_every(),
            runtime.handle().clone(),
        ),
        sensors: SensorBridge::new(cfg.sensor.clone(), tx, runtime.handle().clone()),
    };

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &cfg, threats, &services, rx, opts.autostart);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    shutdown(runtime);
    result
}

fn shutdown(runtime: Runtime) {
    info!("shutting down");
    runtime.shutdown_timeout(Duration::from_millis(500));
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.status == SystemStatus::Standby {
        return;
    }
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

/// Returns the background work a key asks for
fn handle_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    if app.status == SystemStatus::Standby {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => return app.start_system(),
            KeyCode::Char('q') | KeyCode::Esc => app.quit(),
            _ => {}
        }
        return None;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        // Close the topmost panel; Esc quits when nothing is open
        KeyCode::Esc | KeyCode::Char('x') => {
            if app.intel.is_some() {
                app.close_intel();
            } else if app.show_history {
                app.toggle_history();
            } else if key.code == KeyCode::Esc {
                app.quit();
            }
        }

        KeyCode::Enter | KeyCode::Char('i') => return app.request_intel(),
        KeyCode::Char('t') => return app.toggle_translation(),
        KeyCode::Char('H') => app.toggle_history(),
        KeyCode::Char('r') => return app.refresh_history(),
        KeyCode::Char('f') | KeyCode::Char('F') => app.toggle_lock(),

        // Target selection, or history scrolling when the panel is open
        KeyCode::Up if app.show_history => app.scroll_history(-1),
        KeyCode::Down if app.show_history => app.scroll_history(1),
        KeyCode::PageUp if app.show_history => app.scroll_history(-10),
        KeyCode::PageDown if app.show_history => app.scroll_history(10),
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Screen rotation
        KeyCode::Char('[') => app.rotate_view(-15.0),
        KeyCode::Char(']') => app.rotate_view(15.0),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
        KeyCode::Char('p') | KeyCode::Char('P') => app.map_renderer.toggle_places(),
        KeyCode::Char('g') | KeyCode::Char('G') => app.map_renderer.toggle_rings(),
        KeyCode::Char('L') => app.map_renderer.toggle_labels(),

        _ => {}
    }
    None
}

fn run(
    terminal: &mut DefaultTerminal,
    cfg: &Config,
    threats: Vec<tactical_hud::model::Threat>,
    services: &Services,
    mut events: EventReceiver,
    autostart: bool,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width, size.height, threats);
    app.alert_ttl = cfg.alert_ttl();
    app.set_rotation_offset(cfg.rotation);

    // Load all available GeoJSON data at different resolutions
    if cfg.data_dir.exists() {
        if let Err(e) = data::load_all_geojson(&mut app.map_renderer, &cfg.data_dir) {
            warn!("map data: {e:#}");
        }
    }

    // Fall back to the built-in outline if no data loaded
    if !app.map_renderer.has_data() {
        info!("no map data in {}, using built-in outline", cfg.data_dir.display());
        data::generate_theatre_outline(&mut app.map_renderer);
    }

    if autostart {
        if let Some(command) = app.start_system() {
            services.dispatch(&mut app, command);
        }
    }

    // Main loop
    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if term::poll(Duration::from_millis(16))? {
            match term::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(command) = handle_key(&mut app, key) {
                        services.dispatch(&mut app, command);
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        // Sensor and alert results
        let now = Instant::now();
        while let Ok(event) = events.try_recv() {
            app.apply(event, now);
        }
        app.tick(now);

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use tactical_hud::model::{default_threats, HfcAlert};

    fn press(app: &mut App, code: KeyCode) -> Option<Command> {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn active_app() -> App {
        let mut app = App::new(120, 40, default_threats());
        app.start_system();
        app.activate();
        app.alert_history = (0..30)
            .map(|i| HfcAlert {
                id: format!("h{i}"),
                area: "Sderot".to_string(),
                alert_type: "Rockets".to_string(),
                time: "12:00".to_string(),
                date: "01/01/2026".to_string(),
                is_new: false,
                source_url: None,
            })
            .collect();
        app
    }

    #[test]
    fn test_page_keys_need_history_panel() {
        let mut app = active_app();
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.history_scroll, 0);

        press(&mut app, KeyCode::Char('H'));
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.history_scroll, 10);
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.history_scroll, 0);
    }

    #[test]
    fn test_arrows_select_targets_when_history_closed() {
        let mut app = active_app();
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected, 1);
        assert_eq!(app.history_scroll, 0);
    }

    #[test]
    fn test_escape_closes_panel_before_quitting() {
        let mut app = active_app();
        press(&mut app, KeyCode::Char('H'));
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_history);
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }
}
