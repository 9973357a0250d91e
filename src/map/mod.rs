mod basemap;
pub mod geometry;
mod projection;

pub use basemap::{BaseMap, LineString};
pub use projection::Viewport;
