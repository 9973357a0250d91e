use crate::braille::BrailleCanvas;
use crate::map::geometry::draw_line;
use crate::map::projection::Viewport;
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Spacing of graticule lines in degrees
const GRATICULE_STEP: i32 = 30;
/// Sampling step along a graticule line, so meridians bend with the projection
const GRATICULE_SAMPLE: i32 = 5;

/// Reference layers drawn underneath the symbols
pub struct BaseMap {
    coastlines: Vec<LineString>,
    graticule: Vec<LineString>,
    pub show_coastlines: bool,
    pub show_graticule: bool,
}

impl BaseMap {
    pub fn new() -> Self {
        Self {
            coastlines: Vec::new(),
            graticule: build_graticule(),
            show_coastlines: true,
            show_graticule: true,
        }
    }

    /// Read every line and polygon outline from a GeoJSON file
    pub fn load_coastlines(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read coastlines from {}", path.display()))?;
        let geojson: GeoJson = content
            .parse()
            .with_context(|| format!("Failed to parse coastlines in {}", path.display()))?;

        let lines = collect_lines(&geojson);
        let count = lines.len();
        self.coastlines.extend(lines);
        info!(path = %path.display(), lines = count, "loaded coastlines");
        Ok(count)
    }

    /// Draw coastlines and graticule into their own canvases
    pub fn render(&self, viewport: &Viewport, coast: &mut BrailleCanvas, grid: &mut BrailleCanvas) {
        if self.show_graticule {
            for line in &self.graticule {
                draw_linestring(grid, line, viewport);
            }
        }
        if self.show_coastlines {
            for line in &self.coastlines {
                draw_linestring(coast, line, viewport);
            }
        }
    }

    pub fn toggle_coastlines(&mut self) {
        self.show_coastlines = !self.show_coastlines;
    }

    pub fn toggle_graticule(&mut self) {
        self.show_graticule = !self.show_graticule;
    }
}

impl Default for BaseMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Meridians and parallels every [`GRATICULE_STEP`] degrees
fn build_graticule() -> Vec<LineString> {
    let meridians = (-180..=180).step_by(GRATICULE_STEP as usize).map(|lon| {
        (-80..=80)
            .step_by(GRATICULE_SAMPLE as usize)
            .map(|lat| (lon as f64, lat as f64))
            .collect::<LineString>()
    });
    let parallels = (-60..=60).step_by(GRATICULE_STEP as usize).map(|lat| {
        (-180..=180)
            .step_by(GRATICULE_SAMPLE as usize)
            .map(|lon| (lon as f64, lat as f64))
            .collect::<LineString>()
    });
    meridians.chain(parallels).collect()
}

/// Draw a linestring, skipping segments that are off screen or wrap the antimeridian
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let point = viewport.project(lon, lat);
        if let Some(last) = prev {
            let span = ((point.0 - last.0).abs() + (point.1 - last.1).abs()) as usize;
            if span < viewport.width && viewport.segment_might_be_visible(last, point) {
                draw_line(canvas, last, point);
            }
        }
        prev = Some(point);
    }
}

/// Flatten a GeoJSON document into outlines
fn collect_lines(geojson: &GeoJson) -> Vec<LineString> {
    let mut lines = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                geometry_lines(geometry, &mut lines);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                geometry_lines(geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => geometry_lines(geometry, &mut lines),
    }
    lines
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

fn geometry_lines(geometry: &Geometry, out: &mut Vec<LineString>) {
    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(parts) => out.extend(parts.iter().map(|c| to_line(c))),
        Value::Polygon(rings) => out.extend(rings.first().map(|c| to_line(c))),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().filter_map(|rings| rings.first()).map(|c| to_line(c)))
        }
        Value::GeometryCollection(members) => {
            for member in members {
                geometry_lines(member, out);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

#[cfg(test)]
impl BaseMap {
    fn add_coastline(&mut self, line: LineString) {
        self.coastlines.push(line);
    }

    fn has_coastlines(&self) -> bool {
        !self.coastlines.is_empty()
    }
}
