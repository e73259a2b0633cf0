use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::geo::Coordinate;
use crate::map::{MapLayers, Overlay};
use crate::model::{GpsQuality, HfcAlert, SystemStatus};
use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

const HUD_GREEN: Color = Color::Rgb(0x00, 0xff, 0x00);
const DIM_GREEN: Color = Color::Rgb(0x00, 0x80, 0x00);
const ALERT_RED: Color = Color::Rgb(0xff, 0x33, 0x33);

const IDLE_TICKER: &str = ">>> MONITORING LIVE STREAMS — NO ACTIVE THREATS IN SECTOR <<<";
const MARQUEE_GAP: &str = "     ";
/// Frames per scrolled character, about ten characters a second at 60 fps
const MARQUEE_FRAMES_PER_CHAR: u64 = 6;

const DISCLAIMER: &str =
    "TACTICAL SIMULATION DATA PROVIDED FOR VISUALIZATION ONLY. ALWAYS RELY ON OFFICIAL HFC DEVICES.";

/// Header, ticker, map and status bar
fn layout(area: Rect) -> [Rect; 4] {
    Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area)
}

fn map_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DIM_GREEN))
        .title(Span::styled(
            title,
            Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD),
        ))
}

/// Map cells inside the border for a terminal of the given size
pub fn map_inner(area: Rect) -> Rect {
    map_block(String::new()).inner(layout(area)[2])
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.status == SystemStatus::Standby {
        render_standby(frame, area);
        return;
    }

    let [header, ticker, map, status] = layout(area);
    render_header(frame, app, header);
    render_ticker(frame, app, ticker);
    let inner = render_map(frame, app, map);
    render_targets(frame, app, inner);

    if app.show_history {
        render_history(frame, app, inner);
    }
    if app.intel.is_some() {
        render_intel(frame, app, inner);
    }
    if app.active_alert.is_some() {
        render_realtime_alert(frame, app, inner);
    }
    render_status_bar(frame, app, status);
}

fn render_standby(frame: &mut Frame, area: Rect) {
    let popup = centered(area, 40, 7);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(HUD_GREEN));
    let text = vec![
        Line::from(Span::styled(
            "TACTICAL RADAR HUD",
            Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " SYSTEM INITIALIZATION ",
            Style::default()
                .fg(Color::Black)
                .bg(HUD_GREEN)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[ENTER] start   [q] quit",
            Style::default().fg(DIM_GREEN),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        popup,
    );
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let gps = GpsQuality::from_accuracy(app.accuracy);
    let label = Style::default().fg(DIM_GREEN);
    let value = Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD);

    let left = vec![
        Line::from(vec![
            Span::styled("UTC TIME ", label),
            Span::styled(Utc::now().format("%H:%M:%S").to_string(), value),
            Span::styled("  ", label),
            Span::styled(gps.text, Style::default().fg(gps.color).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("SATS LOCKED: ", label),
            Span::styled(gps.sats, value),
            Span::styled("  QUALITY: ", label),
            Span::styled(gps.quality, value),
            Span::styled("  UNCERTAINTY: ", label),
            Span::styled(format_uncertainty(app.accuracy), value),
        ]),
    ];

    let lock = if app.map_locked {
        Span::styled(
            " LOCK_ON ",
            Style::default().fg(Color::Black).bg(HUD_GREEN).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" FREE_SCAN ", Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD))
    };
    let right = vec![
        Line::from(vec![
            Span::styled("HEADING ", label),
            Span::styled(format_heading(app.heading), value),
            Span::raw(" "),
            lock,
        ]),
        Line::from(vec![
            Span::styled("POS: ", label),
            Span::styled(format_position(app.user_location), value),
        ]),
    ];

    let [l, r] = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);
    frame.render_widget(Paragraph::new(left), l);
    frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), r);
}

fn render_ticker(frame: &mut Frame, app: &App, area: Rect) {
    let text = ticker_text(&app.hfc_alerts);
    let offset = (app.frame / MARQUEE_FRAMES_PER_CHAR) as usize;
    let line = Span::styled(
        marquee(&text, area.width as usize, offset),
        Style::default()
            .fg(ALERT_RED)
            .bg(Color::Rgb(0x30, 0x00, 0x00))
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(Paragraph::new(Line::from(line)), area);
}

/// Returns the inner map area
fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let block = map_block(format!(
        " TACTICAL RADAR │ {} │ {} │ {} ",
        app.status,
        app.zoom_level(),
        app.lod_level()
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let overlay = Overlay {
        user: app.user_location,
        threats: &app.threats,
    };
    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport, &overlay);
    frame.render_widget(MapWidget { layers }, inner);
    inner
}

/// Braille layers with text markers on top
struct MapWidget {
    layers: MapLayers,
}

fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
    let rows = canvas.height().min(area.height as usize);
    let cols = canvas.width().min(area.width as usize);
    for row in 0..rows {
        for col in 0..cols {
            if let Some(ch) = canvas.cell(col, row) {
                buf[(area.x + col as u16, area.y + row as u16)]
                    .set_char(ch)
                    .set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        render_layer(&self.layers.coastlines, Color::Rgb(0x00, 0xaa, 0x44), area, buf);
        render_layer(&self.layers.borders, Color::Rgb(0x00, 0x66, 0x33), area, buf);
        render_layer(&self.layers.rings, DIM_GREEN, area, buf);
        render_layer(&self.layers.symbols, Color::White, area, buf);

        for marker in &self.layers.markers {
            if marker.row >= area.height || marker.col >= area.width {
                continue;
            }
            let y = area.y + marker.row;
            let max_len = (area.width - marker.col) as usize;
            for (i, ch) in marker.text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + marker.col + i as u16, y)]
                    .set_char(ch)
                    .set_fg(marker.color);
            }
        }
    }
}

fn render_targets(frame: &mut Frame, app: &App, map: Rect) {
    let threats = app.sorted_threats();
    let height = (threats.len() as u16 * 2 + 2).min(map.height);
    let width = 34.min(map.width);
    let area = Rect::new(map.x, map.y + map.height - height, width, height);

    let mut lines = Vec::with_capacity(threats.len() * 2);
    for (i, threat) in threats.iter().enumerate() {
        let color = threat.risk_level.color();
        let selected = i == app.selected;
        let marker = if selected { "▶ " } else { "  " };
        let mut name_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        if selected {
            name_style = name_style.add_modifier(Modifier::REVERSED);
        }
        let name = threat.name.to_uppercase();
        let distance = format_distance(threat.distance_km);
        let pad = (width as usize)
            .saturating_sub(2 + marker.chars().count() + name.chars().count() + distance.len());
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(HUD_GREEN)),
            Span::styled(name, name_style),
            Span::raw(" ".repeat(pad)),
            Span::styled(distance, Style::default().fg(HUD_GREEN)),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {}", format_location(threat.location)),
            Style::default().fg(DIM_GREEN),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DIM_GREEN))
        .title(Span::styled(
            " TARGET MONITORING ",
            Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if let Some(err) = &app.error {
        if area.y > map.y {
            let line = Rect::new(map.x, area.y - 1, width, 1);
            frame.render_widget(
                Paragraph::new(err.to_uppercase()).style(
                    Style::default()
                        .fg(ALERT_RED)
                        .bg(Color::Rgb(0x30, 0x00, 0x00))
                        .add_modifier(Modifier::BOLD),
                ),
                line,
            );
        }
    }
}

fn render_realtime_alert(frame: &mut Frame, app: &App, map: Rect) {
    let Some(active) = &app.active_alert else {
        return;
    };
    let alert = &active.alert;
    let width = 50.min(map.width);
    let area = Rect::new(map.x + (map.width - width) / 2, map.y + 1, width, 5.min(map.height));

    let style = Style::default().fg(Color::White).bg(Color::Red);
    let mut detail = vec![Span::styled(
        format!("{} | {}", alert.alert_type.to_uppercase(), alert.time),
        style,
    )];
    if alert.source_url.is_some() {
        detail.push(Span::styled(" [VERIFY]", style.add_modifier(Modifier::UNDERLINED)));
    }
    let text = vec![
        Line::from(Span::styled(
            "DANGER - RED ALERT",
            style.add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        )),
        Line::from(Span::styled(alert.area.clone(), style.add_modifier(Modifier::BOLD))),
        Line::from(detail),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White).bg(Color::Red))
        .style(style);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        area,
    );
}

fn render_intel(frame: &mut Frame, app: &App, map: Rect) {
    let Some(intel) = &app.intel else {
        return;
    };
    let area = centered(map, 60, 14);
    let text_style = Style::default().fg(HUD_GREEN);

    let mut lines = Vec::new();
    if intel.loading {
        lines.push(Line::from(Span::styled(
            "PROCESSING DATA STREAM...",
            text_style.add_modifier(Modifier::SLOW_BLINK),
        )));
    } else {
        let alignment = if intel.show_translated {
            Alignment::Right
        } else {
            Alignment::Left
        };
        for l in intel.display_text().lines() {
            lines.push(Line::from(Span::styled(l.to_string(), text_style)).alignment(alignment));
        }
        lines.push(Line::from(""));
        let translate = if intel.translating {
            "TRANSLATING..."
        } else {
            "[t] TRANSLATE"
        };
        lines.push(Line::from(vec![
            Span::styled(translate, Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD)),
            Span::styled("   [x] CLOSE", Style::default().fg(DIM_GREEN)),
        ]));
        if let Some(source) = intel.sources.first() {
            let link = Style::default().fg(DIM_GREEN).add_modifier(Modifier::UNDERLINED);
            let mut spans = vec![Span::styled("SOURCE: ", Style::default().fg(DIM_GREEN))];
            match source.title.as_deref().filter(|t| !t.is_empty()) {
                Some(title) => {
                    spans.push(Span::styled(title.to_uppercase(), Style::default().fg(HUD_GREEN)));
                    spans.push(Span::styled(" ", Style::default()));
                    spans.push(Span::styled(source.uri.clone(), link));
                }
                None => spans.push(Span::styled(source.uri.clone(), link)),
            }
            lines.push(Line::from(spans));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(HUD_GREEN))
        .style(Style::default().bg(Color::Black))
        .title(Span::styled(
            " >>> SCAN_REPORT ",
            Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

fn render_history(frame: &mut Frame, app: &App, map: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(HUD_GREEN))
        .style(Style::default().bg(Color::Black))
        .title(Span::styled(
            " >>> VERIFIED_HISTORY ",
            Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD),
        ))
        .title(
            Line::from(Span::styled(
                if app.is_scanning {
                    " SYNCING... "
                } else {
                    " [r] FORCE SYNC  [H] CLOSE "
                },
                Style::default().fg(HUD_GREEN),
            ))
            .right_aligned(),
        );
    let inner = block.inner(map);
    frame.render_widget(Clear, map);
    frame.render_widget(block, map);

    let [subtitle, list, footer] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "SOURCED FROM HOME FRONT COMMAND (PIKUD HAOREF)",
            Style::default().fg(DIM_GREEN),
        )),
        subtitle,
    );

    if app.alert_history.is_empty() {
        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(list);
        frame.render_widget(
            Paragraph::new(Span::styled("SCANNING DATABASE...", Style::default().fg(DIM_GREEN)))
                .alignment(Alignment::Center),
            middle,
        );
    } else {
        let lines: Vec<Line> = app
            .alert_history
            .iter()
            .skip(app.history_scroll)
            .flat_map(|alert| history_lines(alert, list.width as usize))
            .collect();
        frame.render_widget(Paragraph::new(lines), list);
    }

    frame.render_widget(
        Paragraph::new(Span::styled(DISCLAIMER, Style::default().fg(DIM_GREEN)))
            .alignment(Alignment::Center),
        footer,
    );
}

fn history_lines(alert: &HfcAlert, width: usize) -> [Line<'static>; 2] {
    let area = if alert.source_url.is_some() {
        format!("▌ {} ↗", alert.area)
    } else {
        format!("▌ {}", alert.area)
    };
    let kind = format!("▌ {}", alert.alert_type.to_uppercase());
    let pad = |left: &str, right: &str| {
        " ".repeat(width.saturating_sub(left.chars().count() + right.chars().count()))
    };
    [
        Line::from(vec![
            Span::styled(area.clone(), Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD)),
            Span::raw(pad(&area, &alert.time)),
            Span::styled(alert.time.clone(), Style::default().fg(HUD_GREEN).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled(kind.clone(), Style::default().fg(DIM_GREEN)),
            Span::raw(pad(&kind, &alert.date)),
            Span::styled(alert.date.clone(), Style::default().fg(DIM_GREEN)),
        ]),
    ]
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let toggle = |on: bool, on_text: &'static str, off_text: &'static str| {
        Span::styled(
            if on { on_text } else { off_text },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let status = Line::from(vec![
        Span::styled(" ", Style::default()),
        toggle(settings.show_borders, "[B]order ", "[b]order "),
        toggle(settings.show_places, "[P]laces ", "[p]laces "),
        toggle(settings.show_rings, "[G]rings ", "[g]rings "),
        toggle(settings.show_labels, "[L]abels ", "[l]abels "),
        Span::styled(
            "| f:lock H:history ↑↓:target i:intel hjkl:pan +/-:zoom [/]:rotate q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

/// Ticker content: alert fragments, or the idle banner
pub fn ticker_text(alerts: &[HfcAlert]) -> String {
    if alerts.is_empty() {
        return IDLE_TICKER.to_string();
    }
    alerts
        .iter()
        .map(HfcAlert::ticker_text)
        .collect::<Vec<_>>()
        .join(" — ")
        .to_uppercase()
}

/// A `width`-character window into `text` scrolling left by `offset`
pub fn marquee(text: &str, width: usize, offset: usize) -> String {
    let looped: Vec<char> = text.chars().chain(MARQUEE_GAP.chars()).collect();
    let n = looped.len();
    (0..width).map(|i| looped[(offset + i) % n]).collect()
}

pub fn format_heading(heading: f64) -> String {
    format!("{:03}° N", heading.round() as u32 % 360)
}

pub fn format_position(location: Option<Coordinate>) -> String {
    match location {
        Some(c) => format!("{:.4}, {:.4}", c.lat, c.lng),
        None => "---".to_string(),
    }
}

pub fn format_uncertainty(accuracy_m: Option<f64>) -> String {
    match accuracy_m {
        Some(acc) if acc > 0.0 => format!("{acc:.1}m"),
        _ => "---".to_string(),
    }
}

pub fn format_distance(distance_km: Option<f64>) -> String {
    match distance_km {
        Some(d) => format!("{d:.0} KM"),
        None => "--- KM".to_string(),
    }
}

pub fn format_location(location: Coordinate) -> String {
    format!("{:.2}N, {:.2}E", location.lat, location.lng)
}
