use crate::braille::BrailleCanvas;
use crate::geo::{geodesic_circle, Coordinate};
use crate::map::geometry::{draw_circle, draw_dashed_line, draw_diamond, draw_line};
use crate::map::projection::Viewport;
use crate::model::Threat;
use ratatui::style::Color;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Range rings around the user, km
pub const RANGE_RINGS_KM: [f64; 3] = [100.0, 250.0, 500.0];

/// Level of detail for map data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - regional
    High,   // 10m - local
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 4.0 {
            Lod::Low
        } else if zoom < 30.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// A named place shown as a map label
#[derive(Clone, Debug)]
pub struct Place {
    pub lon: f64,
    pub lat: f64,
    pub name: String,
    pub population: u64,
}

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_places: bool,
    pub show_rings: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_places: true,
            show_rings: true,
            show_labels: true,
        }
    }
}

/// A glyph placed on a character cell, drawn over the braille layers
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub color: Color,
}

/// What the HUD wants drawn on top of the base map
pub struct Overlay<'a> {
    pub user: Option<Coordinate>,
    pub threats: &'a [Threat],
}

/// Rendered layers, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub rings: BrailleCanvas,
    pub symbols: BrailleCanvas,
    pub markers: Vec<Marker>,
}

/// Map renderer with multi-resolution coastline data
#[derive(Default)]
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    places: Vec<Place>,
    pub settings: DisplaySettings,
}

/// Braille pixel to character cell, None when off-canvas
#[inline(always)]
fn cell_of(px: i32, py: i32, cols: usize, rows: usize) -> Option<(u16, u16)> {
    if px < 0 || py < 0 {
        return None;
    }
    let (col, row) = ((px / 2) as usize, (py / 4) as usize);
    (col < cols && row < rows).then_some((col as u16, row as u16))
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coastlines for the given LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let by_detail = [
            &self.coastlines_high,
            &self.coastlines_medium,
            &self.coastlines_low,
        ];
        let start = match lod {
            Lod::High => 0,
            Lod::Medium => 1,
            Lod::Low => 2,
        };
        by_detail[start..]
            .iter()
            .copied()
            .find(|c| !c.is_empty())
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    /// Places worth labelling at this zoom (filter by population)
    fn visible_places(&self, zoom: f64) -> impl Iterator<Item = &Place> {
        let min_pop = if zoom > 60.0 {
            0
        } else if zoom > 30.0 {
            100_000
        } else if zoom > 12.0 {
            500_000
        } else if zoom > 6.0 {
            2_000_000
        } else {
            8_000_000
        };
        self.places.iter().filter(move |p| p.population >= min_pop)
    }

    /// Render base map and overlay into `cols` x `rows` character cells
    pub fn render(&self, cols: usize, rows: usize, viewport: &Viewport, overlay: &Overlay) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);
        let mut layers = MapLayers {
            coastlines: BrailleCanvas::new(cols, rows),
            borders: BrailleCanvas::new(cols, rows),
            rings: BrailleCanvas::new(cols, rows),
            symbols: BrailleCanvas::new(cols, rows),
            markers: Vec::new(),
        };

        for line in self.coastlines(lod) {
            draw_linestring(&mut layers.coastlines, line, viewport);
        }

        if self.settings.show_borders {
            for line in self.borders(lod) {
                draw_linestring(&mut layers.borders, line, viewport);
            }
        }

        if self.settings.show_places {
            for place in self.visible_places(viewport.zoom) {
                let (px, py) = viewport.project(place.lon, place.lat);
                if !viewport.is_visible(px, py) {
                    continue;
                }
                draw_circle(&mut layers.symbols, px, py, 1);
                if self.settings.show_labels {
                    if let Some((col, row)) = cell_of(px, py, cols, rows) {
                        layers.markers.push(Marker {
                            col: col.saturating_add(1),
                            row,
                            text: place.name.clone(),
                            color: Color::DarkGray,
                        });
                    }
                }
            }
        }

        if let Some(user) = overlay.user {
            if self.settings.show_rings {
                for radius in RANGE_RINGS_KM {
                    let ring = geodesic_circle(user, radius, 96);
                    draw_dashed_linestring(&mut layers.rings, &ring, viewport);

                    // Label on the ring's screen-top point
                    if let Some(&(lon, lat)) = ring
                        .iter()
                        .min_by_key(|(lon, lat)| viewport.project(*lon, *lat).1)
                    {
                        let (px, py) = viewport.project(lon, lat);
                        if let Some((col, row)) = cell_of(px, py, cols, rows) {
                            layers.markers.push(Marker {
                                col,
                                row,
                                text: format!("{radius:.0}"),
                                color: Color::Rgb(0x00, 0x80, 0x00),
                            });
                        }
                    }
                }
            }

            let (ux, uy) = viewport.project(user.lng, user.lat);
            draw_circle(&mut layers.symbols, ux, uy, 2);
            if let Some((col, row)) = cell_of(ux, uy, cols, rows) {
                layers.markers.push(Marker {
                    col,
                    row,
                    text: "◉".to_string(),
                    color: Color::Rgb(0x00, 0xff, 0x00),
                });
            }
        }

        for threat in overlay.threats {
            let (px, py) = viewport.project(threat.location.lng, threat.location.lat);
            if !viewport.is_visible(px, py) {
                continue;
            }
            draw_diamond(&mut layers.symbols, px, py, 3);
            if let Some((col, row)) = cell_of(px, py, cols, rows) {
                let color = threat.risk_level.color();
                layers.markers.push(Marker {
                    col,
                    row,
                    text: "◆".to_string(),
                    color,
                });
                if self.settings.show_labels {
                    layers.markers.push(Marker {
                        col: col.saturating_add(2),
                        row,
                        text: threat.name.to_uppercase(),
                        color,
                    });
                }
            }
        }

        layers
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            // Low uses medium
            Lod::Medium | Lod::Low => self.borders_medium.push(line),
        }
    }

    pub fn add_place(&mut self, lon: f64, lat: f64, name: &str, population: u64) {
        self.places.push(Place {
            lon,
            lat,
            name: name.to_string(),
            population,
        });
    }

    /// Check if any coastline data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_places(&mut self) {
        self.settings.show_places = !self.settings.show_places;
    }

    pub fn toggle_rings(&mut self) {
        self.settings.show_rings = !self.settings.show_rings;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

/// Project consecutive points, skipping off-screen and wrapped segments
fn projected_segments<'a>(
    line: &'a [(f64, f64)],
    viewport: &'a Viewport,
) -> impl Iterator<Item = ((i32, i32), (i32, i32))> + 'a {
    line.windows(2).filter_map(move |w| {
        let a = viewport.project(w[0].0, w[0].1);
        let b = viewport.project(w[1].0, w[1].1);
        let dist = ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as usize;
        // A jump wider than the screen is an antimeridian wrap
        (dist < viewport.width.max(viewport.height) && viewport.line_might_be_visible(a, b))
            .then_some((a, b))
    })
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &[(f64, f64)], viewport: &Viewport) {
    for (a, b) in projected_segments(line, viewport) {
        draw_line(canvas, a.0, a.1, b.0, b.1);
    }
}

fn draw_dashed_linestring(canvas: &mut BrailleCanvas, line: &[(f64, f64)], viewport: &Viewport) {
    for (a, b) in projected_segments(line, viewport) {
        draw_dashed_line(canvas, a, b, 3, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskLevel;

    fn viewport() -> Viewport {
        // About 2 km per pixel around Israel
        Viewport::new(35.0, 32.0, 45.0, 400, 400)
    }

    #[test]
    fn test_lod_from_zoom() {
        assert_eq!(Lod::from_zoom(1.0), Lod::Low);
        assert_eq!(Lod::from_zoom(12.0), Lod::Medium);
        assert_eq!(Lod::from_zoom(100.0), Lod::High);
    }

    #[test]
    fn test_coastline_lod_fallback() {
        let mut r = MapRenderer::new();
        r.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::Low);
        assert_eq!(r.coastlines(Lod::High).len(), 1);
        r.add_coastline(vec![(0.0, 0.0), (2.0, 2.0)], Lod::High);
        assert_eq!(r.coastlines(Lod::High)[0][1], (2.0, 2.0));
        assert_eq!(r.coastlines(Lod::Low)[0][1], (1.0, 1.0));
        assert!(r.has_data());
    }

    #[test]
    fn test_threat_markers_colored_by_risk() {
        let r = MapRenderer::new();
        let threats = vec![
            Threat::new("a", "Alpha", 32.0, 35.0, RiskLevel::High),
            Threat::new("b", "Bravo", 32.1, 35.1, RiskLevel::Low),
            // Far off screen
            Threat::new("c", "Charlie", -40.0, 170.0, RiskLevel::Med),
        ];
        let overlay = Overlay {
            user: None,
            threats: &threats,
        };
        let layers = r.render(200, 100, &viewport(), &overlay);
        let diamonds: Vec<_> = layers.markers.iter().filter(|m| m.text == "◆").collect();
        assert_eq!(diamonds.len(), 2);
        assert_eq!(diamonds[0].color, RiskLevel::High.color());
        assert_eq!(diamonds[1].color, RiskLevel::Low.color());
        assert!(layers.markers.iter().any(|m| m.text == "ALPHA"));
    }

    #[test]
    fn test_user_marker_and_rings() {
        let r = MapRenderer::new();
        let overlay = Overlay {
            user: Some(Coordinate::new(32.0, 35.0)),
            threats: &[],
        };
        let layers = r.render(200, 100, &viewport(), &overlay);
        let user = layers.markers.iter().find(|m| m.text == "◉").unwrap();
        assert_eq!((user.col, user.row), (100, 50));
        // The 100 km ring fits on screen, its label is drawn
        assert!(layers.markers.iter().any(|m| m.text == "100"));
        assert!((0..200).any(|c| (0..100).any(|r| layers.rings.cell(c, r).is_some())));
    }

    #[test]
    fn test_rings_toggle() {
        let mut r = MapRenderer::new();
        r.toggle_rings();
        let overlay = Overlay {
            user: Some(Coordinate::new(32.0, 35.0)),
            threats: &[],
        };
        let layers = r.render(200, 100, &viewport(), &overlay);
        assert!((0..200).all(|c| (0..100).all(|r| layers.rings.cell(c, r).is_none())));
    }

    #[test]
    fn test_place_labels_follow_population() {
        let mut r = MapRenderer::new();
        r.add_place(34.78, 32.08, "Tel Aviv", 4_000_000);
        r.add_place(35.0, 31.9, "Hamlet", 200);
        let overlay = Overlay {
            user: None,
            threats: &[],
        };
        let layers = r.render(200, 100, &viewport(), &overlay);
        assert!(layers.markers.iter().any(|m| m.text == "Tel Aviv"));
        assert!(!layers.markers.iter().any(|m| m.text == "Hamlet"));
    }
}
