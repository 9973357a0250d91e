use crate::braille::BrailleCanvas;
use crate::dataset::{Dataset, Feature, FeatureId};
use crate::map::geometry::{fill_disc, stroke_ring};
use crate::map::Viewport;
use crate::symbols::attributes::AttributeKey;
use crate::symbols::formatter::{radius_with_scale, SCALE_FACTOR};
use geojson::JsonValue;
use std::collections::BTreeMap;

/// Sizing and labelling rules shared by every marker
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub scale_factor: f64,
    /// Radius used when the dataset has no attributes to size by
    pub default_radius: f64,
    /// Property holding the display name
    pub name_property: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            scale_factor: SCALE_FACTOR,
            default_radius: 8.0,
            name_property: "City".to_string(),
        }
    }
}

/// One labelled line of popup text
#[derive(Clone, Debug, PartialEq)]
pub struct PopupLine {
    pub label: String,
    pub value: String,
}

/// Text shown while the pointer is over a marker
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Popup {
    lines: Vec<PopupLine>,
    /// Distance in dots from the symbol center to the popup edge
    offset: f64,
}

impl Popup {
    fn name_only(name: String, radius: f64) -> Self {
        Self {
            lines: vec![PopupLine {
                label: "City".to_string(),
                value: name,
            }],
            // NaN radii have no extent
            offset: radius.max(0.0),
        }
    }

    fn for_attribute(
        name: String,
        key: &AttributeKey,
        value: Option<&JsonValue>,
        radius: f64,
    ) -> Self {
        let mut popup = Self::name_only(name, radius);
        popup.lines.push(PopupLine {
            label: format!("Population in {}", key.year()),
            value: format!("{} million", display_value(value)),
        });
        popup
    }

    pub fn lines(&self) -> &[PopupLine] {
        &self.lines
    }

    /// Popup sits this many dots above the symbol center, clearing its radius
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// `label: value` strings, one per line
    pub fn text_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| format!("{}: {}", line.label, line.value))
            .collect()
    }
}

/// Rendered symbol for one feature
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerView {
    pub feature: FeatureId,
    /// Anchor as (lon, lat)
    pub position: (f64, f64),
    /// Radius in braille dots; NaN when the value is not numeric
    pub radius: f64,
    pub popup: Popup,
}

/// Proportional symbols for a dataset, keyed by feature
pub struct SymbolLayer {
    dataset: Dataset,
    markers: BTreeMap<FeatureId, MarkerView>,
    style: MarkerStyle,
}

impl SymbolLayer {
    /// Create one marker per positioned feature, sized by `keys[index]`.
    ///
    /// With no keys every marker gets `style.default_radius` and a popup
    /// carrying only the name.
    pub fn render_all(
        dataset: Dataset,
        keys: &[AttributeKey],
        index: usize,
        style: MarkerStyle,
    ) -> Self {
        let key = keys.get(index);
        let markers = dataset
            .features()
            .iter()
            .filter_map(|feature| {
                let position = feature.position?;
                let (radius, popup) = match key {
                    Some(key) => symbolize(feature, key, &style),
                    None => (
                        style.default_radius,
                        Popup::name_only(feature.name(&style.name_property), style.default_radius),
                    ),
                };
                Some((
                    feature.id,
                    MarkerView {
                        feature: feature.id,
                        position,
                        radius,
                        popup,
                    },
                ))
            })
            .collect();

        Self {
            dataset,
            markers,
            style,
        }
    }

    /// Resize and relabel markers for `key` in place.
    ///
    /// Markers whose feature has no value (or `null`) for `key` keep their
    /// previous radius and popup. Returns how many markers changed.
    pub fn update_all(&mut self, key: &AttributeKey) -> usize {
        let mut updated = 0;
        for marker in self.markers.values_mut() {
            let Some(feature) = self.dataset.get(marker.feature) else {
                continue;
            };
            match feature.property(key.as_str()) {
                None | Some(JsonValue::Null) => continue,
                Some(_) => {
                    let (radius, popup) = symbolize(feature, key, &self.style);
                    marker.radius = radius;
                    marker.popup = popup;
                    updated += 1;
                }
            }
        }
        updated
    }

    pub fn get(&self, id: FeatureId) -> Option<&MarkerView> {
        self.markers.get(&id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerView> {
        self.markers.values()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn style(&self) -> &MarkerStyle {
        &self.style
    }

    /// Markers largest first, so small symbols are painted over big ones
    pub fn draw_order(&self) -> Vec<&MarkerView> {
        let mut order: Vec<&MarkerView> = self.markers.values().collect();
        order.sort_by(|a, b| b.radius.total_cmp(&a.radius));
        order
    }

    /// The smallest marker whose circle contains the dot (px, py)
    pub fn hit_test(&self, viewport: &Viewport, px: f64, py: f64) -> Option<FeatureId> {
        self.markers
            .values()
            .filter(|m| m.radius.is_finite())
            .filter(|m| {
                let (mx, my) = viewport.project_f(m.position.0, m.position.1);
                let reach = m.radius.max(1.0);
                (mx - px).powi(2) + (my - py).powi(2) <= reach * reach
            })
            .min_by(|a, b| a.radius.total_cmp(&b.radius))
            .map(|m| m.feature)
    }

    /// Rasterize filled symbols and their outlines
    pub fn draw(&self, viewport: &Viewport, fill: &mut BrailleCanvas, stroke: &mut BrailleCanvas) {
        for marker in self.draw_order() {
            let (px, py) = viewport.project_f(marker.position.0, marker.position.1);
            if !viewport.circle_visible(px, py, marker.radius) {
                continue;
            }
            fill_disc(fill, px, py, marker.radius);
            stroke_ring(stroke, px, py, marker.radius);
        }
    }
}

/// Radius and popup of `feature` for attribute `key`
fn symbolize(feature: &Feature, key: &AttributeKey, style: &MarkerStyle) -> (f64, Popup) {
    let value = feature.property(key.as_str());
    let radius = radius_with_scale(coerce_number(value), style.scale_factor);
    let popup = Popup::for_attribute(feature.name(&style.name_property), key, value, radius);
    (radius, popup)
}

/// Numeric reading of a property: numbers as-is, numeric strings parsed,
/// booleans as 1/0, null as 0; anything else is NaN.
pub fn coerce_number(value: Option<&JsonValue>) -> f64 {
    match value {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        Some(JsonValue::Bool(b)) => f64::from(u8::from(*b)),
        Some(JsonValue::Null) => 0.0,
        Some(JsonValue::Array(_)) | Some(JsonValue::Object(_)) | None => f64::NAN,
    }
}

/// Text of a value as it reads in the popup; whole floats drop their `.0`
fn display_value(value: Option<&JsonValue>) -> String {
    match value {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) if n.is_f64() => match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::formatter::radius_for;
    use geojson::GeoJson;

    fn dataset(text: &str) -> Dataset {
        match text.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => Dataset::from_features(fc.features),
            _ => panic!("expected a feature collection"),
        }
    }

    fn cities() -> Dataset {
        dataset(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"City": "Tokyo", "Pop_1950": 11.3, "Pop_2000": 34.4},
                 "geometry": {"type": "Point", "coordinates": [139.7, 35.7]}},
                {"type": "Feature", "properties": {"City": "Lagos", "Pop_1950": "0.3", "Pop_2000": 7.2},
                 "geometry": {"type": "Point", "coordinates": [3.4, 6.5]}},
                {"type": "Feature", "properties": {"City": "Nowhere", "Pop_1950": 1.0},
                 "geometry": null}
            ]}"#,
        )
    }

    fn keys() -> Vec<AttributeKey> {
        vec![AttributeKey::new("Pop_1950"), AttributeKey::new("Pop_2000")]
    }

    #[test]
    fn test_render_all_sizes_by_first_key() {
        let layer = SymbolLayer::render_all(cities(), &keys(), 0, MarkerStyle::default());

        // The feature without geometry gets no marker
        assert_eq!(layer.len(), 2);
        let tokyo = layer.get(FeatureId(0)).unwrap();
        assert!((tokyo.radius - radius_for(11.3)).abs() < 1e-12);
        assert_eq!(
            tokyo.popup.text_lines(),
            ["City: Tokyo", "Population in 1950: 11.3 million"]
        );

        // Numeric strings are coerced for sizing but shown verbatim
        let lagos = layer.get(FeatureId(1)).unwrap();
        assert!((lagos.radius - radius_for(0.3)).abs() < 1e-12);
        assert_eq!(lagos.popup.lines()[1].value, "0.3 million");
    }

    #[test]
    fn test_render_all_without_keys_uses_default_radius() {
        let layer = SymbolLayer::render_all(cities(), &[], 0, MarkerStyle::default());
        for marker in layer.markers() {
            assert_eq!(marker.radius, 8.0);
            assert_eq!(marker.popup.lines().len(), 1);
        }
    }

    #[test]
    fn test_update_all_is_idempotent() {
        let mut layer = SymbolLayer::render_all(cities(), &keys(), 0, MarkerStyle::default());
        let key = AttributeKey::new("Pop_2000");

        assert_eq!(layer.update_all(&key), 2);
        let first: Vec<MarkerView> = layer.markers().cloned().collect();
        assert_eq!(layer.update_all(&key), 2);
        let second: Vec<MarkerView> = layer.markers().cloned().collect();
        assert_eq!(first, second);
        assert!((first[0].radius - radius_for(34.4)).abs() < 1e-12);
    }

    #[test]
    fn test_update_all_skips_missing_values() {
        let data = dataset(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"City": "A", "Pop_1950": 1, "Pop_2000": 4},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}},
                {"type": "Feature", "properties": {"City": "B", "Pop_1950": 2},
                 "geometry": {"type": "Point", "coordinates": [10, 10]}},
                {"type": "Feature", "properties": {"City": "C", "Pop_1950": 3, "Pop_2000": null},
                 "geometry": {"type": "Point", "coordinates": [20, 20]}}
            ]}"#,
        );
        let mut layer = SymbolLayer::render_all(data, &keys(), 0, MarkerStyle::default());
        let before_b = layer.get(FeatureId(1)).unwrap().clone();
        let before_c = layer.get(FeatureId(2)).unwrap().clone();

        assert_eq!(layer.update_all(&AttributeKey::new("Pop_2000")), 1);

        assert!((layer.get(FeatureId(0)).unwrap().radius - radius_for(4.0)).abs() < 1e-12);
        assert_eq!(layer.get(FeatureId(1)).unwrap(), &before_b);
        assert_eq!(layer.get(FeatureId(2)).unwrap(), &before_c);
    }

    #[test]
    fn test_zero_value_still_updates() {
        let data = dataset(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"City": "A", "Pop_1950": 5, "Pop_2000": 0},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}}
            ]}"#,
        );
        let mut layer = SymbolLayer::render_all(data, &keys(), 0, MarkerStyle::default());
        layer.update_all(&AttributeKey::new("Pop_2000"));
        assert_eq!(layer.get(FeatureId(0)).unwrap().radius, 0.0);
    }

    #[test]
    fn test_non_numeric_value_has_nan_radius() {
        let data = dataset(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"City": "A", "Pop_1950": "n/a"},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}}
            ]}"#,
        );
        let layer = SymbolLayer::render_all(data, &keys(), 0, MarkerStyle::default());
        assert!(layer.get(FeatureId(0)).unwrap().radius.is_nan());
    }

    #[test]
    fn test_draw_order_and_hit_test_prefer_small_symbols() {
        let data = dataset(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"City": "Big", "Pop_1950": 40},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}},
                {"type": "Feature", "properties": {"City": "Small", "Pop_1950": 2},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}}
            ]}"#,
        );
        let layer = SymbolLayer::render_all(data, &keys(), 0, MarkerStyle::default());
        let order: Vec<FeatureId> = layer.draw_order().iter().map(|m| m.feature).collect();
        assert_eq!(order, [FeatureId(0), FeatureId(1)]);

        let viewport = Viewport::new(0.0, 0.0, 1.0, 200, 100);
        let (cx, cy) = viewport.project_f(0.0, 0.0);
        assert_eq!(layer.hit_test(&viewport, cx, cy), Some(FeatureId(1)));
        // Inside the big circle only
        assert_eq!(layer.hit_test(&viewport, cx + 12.0, cy), Some(FeatureId(0)));
        assert_eq!(layer.hit_test(&viewport, cx + 40.0, cy), None);
    }

    #[test]
    fn test_draw_rasterizes_fill_and_outline() {
        let layer = SymbolLayer::render_all(cities(), &keys(), 0, MarkerStyle::default());
        let viewport = Viewport::new(0.0, 0.0, 1.0, 400, 200);
        let mut fill = BrailleCanvas::new(200, 50);
        let mut stroke = BrailleCanvas::new(200, 50);
        layer.draw(&viewport, &mut fill, &mut stroke);
        assert!(fill.occupied().count() > 0);
        assert!(stroke.occupied().count() > 0);
    }

    #[test]
    fn test_whole_float_shows_without_fraction() {
        let data = dataset(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"City": "Tokyo", "Pop_1950": 38.0, "Pop_2000": 0.33},
                 "geometry": {"type": "Point", "coordinates": [139.7, 35.7]}}
            ]}"#,
        );
        let mut layer = SymbolLayer::render_all(data, &keys(), 0, MarkerStyle::default());
        assert_eq!(
            layer.get(FeatureId(0)).unwrap().popup.lines()[1].value,
            "38 million"
        );
        layer.update_all(&AttributeKey::new("Pop_2000"));
        assert_eq!(
            layer.get(FeatureId(0)).unwrap().popup.lines()[1].value,
            "0.33 million"
        );
    }

    #[test]
    fn test_popup_offset_follows_radius() {
        let mut layer = SymbolLayer::render_all(cities(), &keys(), 0, MarkerStyle::default());
        let tokyo = layer.get(FeatureId(0)).unwrap();
        assert_eq!(tokyo.popup.offset(), tokyo.radius);

        layer.update_all(&AttributeKey::new("Pop_2000"));
        let tokyo = layer.get(FeatureId(0)).unwrap();
        assert_eq!(tokyo.popup.offset(), radius_for(34.4));

        let plain = SymbolLayer::render_all(cities(), &[], 0, MarkerStyle::default());
        assert_eq!(plain.get(FeatureId(0)).unwrap().popup.offset(), 8.0);
    }

    #[test]
    fn test_raw_population_counts_draw_within_canvas() {
        let data = dataset(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"City": "Tokyo", "Pop_2015": 38000000},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}}
            ]}"#,
        );
        let keys = [AttributeKey::new("Pop_2015")];
        let layer = SymbolLayer::render_all(data, &keys, 0, MarkerStyle::default());
        assert!(layer.get(FeatureId(0)).unwrap().radius > 24_000.0);

        let viewport = Viewport::new(0.0, 0.0, 1.0, 196, 136);
        let mut fill = BrailleCanvas::new(98, 34);
        let mut stroke = BrailleCanvas::new(98, 34);
        let start = std::time::Instant::now();
        layer.draw(&viewport, &mut fill, &mut stroke);
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(fill.occupied().count(), 98 * 34);
        assert_eq!(stroke.occupied().count(), 0);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(Some(&JsonValue::from(2.5))), 2.5);
        assert_eq!(coerce_number(Some(&JsonValue::from(" 7 "))), 7.0);
        assert_eq!(coerce_number(Some(&JsonValue::Bool(true))), 1.0);
        assert_eq!(coerce_number(Some(&JsonValue::Null)), 0.0);
        assert!(coerce_number(None).is_nan());
    }
}
