//! Proportional symbol maps rendered with Braille characters.
//!
//! A GeoJSON point layer is loaded once, its population attributes are
//! discovered from the first feature, and each feature is drawn as a circle
//! whose area tracks the selected attribute. A slider steps through the
//! attributes in document order.

pub mod app;
pub mod braille;
pub mod config;
pub mod dataset;
pub mod layout;
pub mod loader;
pub mod map;
pub mod symbols;
pub mod ui;
