use std::f64::consts::PI;

/// Latitude limit of the Web Mercator square
const MAX_LAT: f64 = 85.051_128_78;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 100.0;
const ZOOM_STEP: f64 = 1.5;

/// Normalized Web Mercator coordinates in [0, 1] for a lon/lat pair
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let x = (lon + 180.0) / 360.0;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

/// Inverse of [`mercator`]
fn inverse_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lon, lat)
}

/// Visible map area: a Web Mercator window measured in braille dots
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude
    pub center_lat: f64,
    /// Zoom level (1.0 fits the world width)
    pub zoom: f64,
    /// Canvas width in dots
    pub width: usize,
    /// Canvas height in dots
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Dots per unit of normalized Mercator space
    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    /// Pan the viewport by a dot delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.scale().max(1.0);
        let (lon, lat) = inverse_mercator(cx + dx as f64 / scale, cy + dy as f64 / scale);

        self.center_lon = if lon > 180.0 {
            lon - 360.0
        } else if lon < -180.0 {
            lon + 360.0
        } else {
            lon
        };
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Zoom in keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out keeping the point under (px, py) fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Project a lon/lat to fractional dot coordinates
    pub fn project_f(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = mercator(lon, lat);
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.scale();
        (
            (x - cx) * scale + self.width as f64 / 2.0,
            (y - cy) * scale + self.height as f64 / 2.0,
        )
    }

    /// Project a lon/lat to integer dot coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = self.project_f(lon, lat);
        (x as i32, y as i32)
    }

    /// Dot coordinates back to lon/lat
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.scale().max(1.0);
        let x = (px as f64 - self.width as f64 / 2.0) / scale + cx;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + cy;
        inverse_mercator(x, y)
    }

    /// Whether a circle of `radius` dots around (px, py) touches the canvas
    pub fn circle_visible(&self, px: f64, py: f64, radius: f64) -> bool {
        let r = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        px + r >= 0.0
            && px - r < self.width as f64
            && py + r >= 0.0
            && py - r < self.height as f64
    }

    /// Rough bounding box test for a segment
    pub fn segment_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        p1.0.max(p2.0) >= 0
            && p1.0.min(p2.0) < self.width as i32
            && p1.1.max(p2.1) >= 0
            && p1.1.min(p2.1) < self.height as i32
    }
}
