use crate::symbols::attributes::AttributeKey;
use crate::symbols::layer::SymbolLayer;
use tracing::debug;

/// Range of the sequence slider, derived from the attribute count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliderBounds {
    pub min: usize,
    pub max: usize,
    pub step: usize,
}

impl SliderBounds {
    pub fn for_len(len: usize) -> Self {
        Self {
            min: 0,
            max: len.saturating_sub(1),
            step: 1,
        }
    }

    pub fn clamp(&self, index: usize) -> usize {
        index.clamp(self.min, self.max)
    }
}

/// Steps through the attribute sequence and keeps the symbols in sync.
///
/// Owns the current index and the marker layer; every transition re-applies
/// the selected attribute to all markers.
pub struct SequenceController {
    keys: Vec<AttributeKey>,
    index: usize,
    bounds: SliderBounds,
    layer: SymbolLayer,
}

impl SequenceController {
    /// Wrap a layer that was rendered at index 0
    pub fn new(keys: Vec<AttributeKey>, layer: SymbolLayer) -> Self {
        let bounds = SliderBounds::for_len(keys.len());
        Self {
            keys,
            index: 0,
            bounds,
            layer,
        }
    }

    /// Next attribute, wrapping to the first after the last
    pub fn forward(&mut self) -> usize {
        if !self.keys.is_empty() {
            self.index = (self.index + 1) % self.keys.len();
        }
        self.apply();
        self.index
    }

    /// Previous attribute, wrapping to the last before the first
    pub fn reverse(&mut self) -> usize {
        let n = self.keys.len();
        if n > 0 {
            self.index = (self.index + n - 1) % n;
        }
        self.apply();
        self.index
    }

    /// Jump to a slider position, clamped to the slider bounds
    pub fn set_index(&mut self, index: usize) -> usize {
        self.index = self.bounds.clamp(index);
        self.apply();
        self.index
    }

    fn apply(&mut self) {
        if let Some(key) = self.keys.get(self.index) {
            let updated = self.layer.update_all(key);
            debug!(attribute = %key, index = self.index, updated, "applied attribute");
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[AttributeKey] {
        &self.keys
    }

    pub fn current_key(&self) -> Option<&AttributeKey> {
        self.keys.get(self.index)
    }

    pub fn bounds(&self) -> SliderBounds {
        self.bounds
    }

    pub fn layer(&self) -> &SymbolLayer {
        &self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, FeatureId};
    use crate::symbols::formatter::radius_for;
    use crate::symbols::layer::MarkerStyle;
    use geojson::GeoJson;

    const SEVEN_YEARS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature",
         "properties": {"City": "Tokyo", "Pop_1985": 30.3, "Pop_1990": 32.5, "Pop_1995": 33.6,
                        "Pop_2000": 34.4, "Pop_2005": 35.6, "Pop_2010": 36.8, "Pop_2015": 38.0},
         "geometry": {"type": "Point", "coordinates": [139.7, 35.7]}}
    ]}"#;

    fn controller(text: &str) -> SequenceController {
        let dataset = match text.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => Dataset::from_features(fc.features),
            _ => panic!("expected a feature collection"),
        };
        crate::symbols::build(dataset, "Pop", MarkerStyle::default())
    }

    fn tokyo_radius(c: &SequenceController) -> f64 {
        c.layer().get(FeatureId(0)).unwrap().radius
    }

    #[test]
    fn test_bounds_follow_key_count() {
        let c = controller(SEVEN_YEARS);
        assert_eq!(c.len(), 7);
        assert_eq!(c.bounds(), SliderBounds { min: 0, max: 6, step: 1 });
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn test_forward_reverse_are_inverse() {
        let mut c = controller(SEVEN_YEARS);
        for start in 0..c.len() {
            c.set_index(start);
            c.forward();
            c.reverse();
            assert_eq!(c.index(), start);
            c.reverse();
            c.forward();
            assert_eq!(c.index(), start);
        }
    }

    #[test]
    fn test_wraparound() {
        let mut c = controller(SEVEN_YEARS);
        assert_eq!(c.reverse(), 6);
        assert_eq!(c.current_key().unwrap().as_str(), "Pop_2015");
        assert!((tokyo_radius(&c) - radius_for(38.0)).abs() < 1e-12);
        assert_eq!(c.forward(), 0);
        assert!((tokyo_radius(&c) - radius_for(30.3)).abs() < 1e-12);
    }

    #[test]
    fn test_set_index_clamps_and_updates() {
        let mut c = controller(SEVEN_YEARS);
        assert_eq!(c.set_index(42), 6);
        assert!((tokyo_radius(&c) - radius_for(38.0)).abs() < 1e-12);
        assert_eq!(c.set_index(3), 3);
        assert!((tokyo_radius(&c) - radius_for(34.4)).abs() < 1e-12);
        let popup = c.layer().get(FeatureId(0)).unwrap().popup.text_lines();
        assert_eq!(popup[1], "Population in 2000: 34.4 million");
    }

    #[test]
    fn test_empty_sequence_is_inert() {
        let mut c = controller(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}}
            ]}"#,
        );
        assert!(c.is_empty());
        assert_eq!(c.forward(), 0);
        assert_eq!(c.reverse(), 0);
        assert_eq!(c.set_index(5), 0);
        assert_eq!(c.current_key(), None);
        assert_eq!(tokyo_radius(&c), 8.0);
    }
}
