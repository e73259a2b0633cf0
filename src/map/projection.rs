use glam::DVec2;
use std::f64::consts::PI;

const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 400.0;

/// Visible map area: Web Mercator around a center, scaled by zoom, then
/// rotated about the canvas center so the current heading points up.
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
    /// Clockwise map rotation applied on screen, degrees
    pub rotation_deg: f64,
}

/// Web Mercator normalized coordinates, both in [0, 1]
#[inline(always)]
fn mercator(lon: f64, lat: f64) -> DVec2 {
    let lat_rad = lat.clamp(-85.0511, 85.0511) * PI / 180.0;
    DVec2::new(
        (lon + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
            rotation_deg: 0.0,
        }
    }

    /// Initial theatre view over the eastern Mediterranean
    pub fn theatre(width: usize, height: usize) -> Self {
        Self::new(35.0, 33.0, 12.0, width, height)
    }

    /// Rotate the map so `heading` points up
    pub fn set_heading(&mut self, heading: f64) {
        self.rotation_deg = -heading;
    }

    pub fn center_on(&mut self, lon: f64, lat: f64) {
        self.center_lon = lon;
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    #[inline(always)]
    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64
    }

    #[inline(always)]
    fn half(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    #[inline(always)]
    fn rotation(&self) -> DVec2 {
        DVec2::from_angle(self.rotation_deg.to_radians())
    }

    /// Pan the viewport by a screen pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        // Screen deltas are rotated; undo that to move along map axes
        let d = DVec2::from_angle(-self.rotation_deg.to_radians())
            .rotate(DVec2::new(dx as f64, dy as f64));
        let scale = 360.0 / self.scale();
        self.center_lon += d.x * scale;
        self.center_lat -= d.y * scale * 0.5; // Mercator distortion

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let offset = (mercator(lon, lat) - mercator(self.center_lon, self.center_lat)) * self.scale();
        let p = self.rotation().rotate(offset) + self.half();
        (p.x as i32, p.y as i32)
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let screen = DVec2::new(px as f64, py as f64) - self.half();
        let inverse = DVec2::from_angle(-self.rotation_deg.to_radians());
        let m = inverse.rotate(screen) / self.scale() + mercator(self.center_lon, self.center_lat);

        let lon = m.x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * m.y)).sinh().atan() * 180.0 / PI;
        (lon, lat)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
