use crate::dataset::Dataset;
use geojson::JsonObject;
use std::fmt;

/// Substring that marks a property as a population attribute
pub const POPULATION_MARKER: &str = "Pop";

/// Name of one sequenced attribute, e.g. `Pop_1985`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeKey(String);

impl AttributeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Second underscore-separated token (`Pop_1985` -> `1985`), or the
    /// whole key when there is none.
    pub fn year(&self) -> &str {
        self.0.split('_').nth(1).unwrap_or(self.0.as_str())
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keys of `properties` containing `marker`, in property order.
pub fn extract_attribute_keys(properties: &JsonObject, marker: &str) -> Vec<AttributeKey> {
    properties
        .keys()
        .filter(|key| key.contains(marker))
        .map(|key| AttributeKey::new(key.as_str()))
        .collect()
}

/// Attribute keys of the dataset, read from its first feature.
/// Every other feature is assumed to carry the same keys.
pub fn extract_from_dataset(dataset: &Dataset, marker: &str) -> Vec<AttributeKey> {
    dataset
        .first()
        .map(|feature| extract_attribute_keys(&feature.properties, marker))
        .unwrap_or_default()
}
