//! Proportional symbols: sizing, attribute discovery, rendering and the
//! attribute sequence.

pub mod attributes;
pub mod controller;
pub mod formatter;
pub mod layer;

pub use attributes::{extract_attribute_keys, extract_from_dataset, AttributeKey, POPULATION_MARKER};
pub use controller::{SequenceController, SliderBounds};
pub use formatter::{radius_for, radius_with_scale, SCALE_FACTOR};
pub use layer::{MarkerStyle, MarkerView, Popup, SymbolLayer};

use crate::dataset::Dataset;

/// Discover attributes, render the markers at the first attribute and hand
/// both to a fresh controller.
pub fn build(dataset: Dataset, marker: &str, style: MarkerStyle) -> SequenceController {
    let keys = extract_from_dataset(&dataset, marker);
    let layer = SymbolLayer::render_all(dataset, &keys, 0, style);
    SequenceController::new(keys, layer)
}
