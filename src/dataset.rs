//! Features of one loaded GeoJSON document.
//!
//! Property maps keep their document order (`serde_json` is built with
//! `preserve_order`); attribute discovery depends on it.

use geojson::{Geometry, JsonObject, JsonValue, Value};

/// Index of a feature in document order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub usize);

/// One mapped entity: an anchor position plus its property bag
#[derive(Clone, Debug)]
pub struct Feature {
    pub id: FeatureId,
    /// Symbol anchor as (lon, lat); `None` for features without geometry
    pub position: Option<(f64, f64)>,
    pub properties: JsonObject,
}

impl Feature {
    pub fn property(&self, key: &str) -> Option<&JsonValue> {
        self.properties.get(key)
    }

    /// Display name taken from `name_property`, falling back to the id
    pub fn name(&self, name_property: &str) -> String {
        match self.property(name_property) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Null) | None => format!("Feature {}", self.id.0),
            Some(other) => other.to_string(),
        }
    }
}

/// Immutable set of features in document order
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    features: Vec<Feature>,
}

impl Dataset {
    pub fn from_features(features: Vec<geojson::Feature>) -> Self {
        let features = features
            .into_iter()
            .enumerate()
            .map(|(idx, f)| Feature {
                id: FeatureId(idx),
                position: f.geometry.as_ref().and_then(anchor),
                properties: f.properties.unwrap_or_default(),
            })
            .collect();
        Self { features }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.0)
    }

    /// Representative feature used for attribute discovery
    pub fn first(&self) -> Option<&Feature> {
        self.features.first()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Where a symbol for this geometry is placed: the point itself, or the
/// vertex mean of a line or outer ring.
fn anchor(geometry: &Geometry) -> Option<(f64, f64)> {
    match &geometry.value {
        Value::Point(c) => lon_lat(c),
        Value::MultiPoint(points) => points.first().and_then(|c| lon_lat(c)),
        Value::LineString(line) => vertex_mean(line),
        Value::MultiLineString(lines) => lines.first().and_then(|l| vertex_mean(l)),
        Value::Polygon(rings) => rings.first().and_then(|r| vertex_mean(open_ring(r))),
        Value::MultiPolygon(polygons) => polygons
            .first()
            .and_then(|rings| rings.first())
            .and_then(|r| vertex_mean(open_ring(r))),
        Value::GeometryCollection(members) => members.iter().find_map(anchor),
    }
}

fn lon_lat(coord: &[f64]) -> Option<(f64, f64)> {
    match coord {
        [lon, lat, ..] => Some((*lon, *lat)),
        _ => None,
    }
}

/// Drop the closing vertex so it is not counted twice
fn open_ring(ring: &[Vec<f64>]) -> &[Vec<f64>] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn vertex_mean(coords: &[Vec<f64>]) -> Option<(f64, f64)> {
    let points: Vec<(f64, f64)> = coords.iter().filter_map(|c| lon_lat(c)).collect();
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sum_lon, sum_lat) = points
        .iter()
        .fold((0.0, 0.0), |(a, b), (lon, lat)| (a + lon, b + lat));
    Some((sum_lon / n, sum_lat / n))
}
