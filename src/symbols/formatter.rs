use std::f64::consts::PI;

/// Area units per attribute unit; evens out symbol sizes across the map
pub const SCALE_FACTOR: f64 = 50.0;

/// Radius of a circle whose area is proportional to `value`.
///
/// Negative or NaN values yield NaN; callers draw nothing for such radii.
pub fn radius_for(value: f64) -> f64 {
    radius_with_scale(value, SCALE_FACTOR)
}

/// [`radius_for`] with an explicit scale factor
pub fn radius_with_scale(value: f64, scale: f64) -> f64 {
    let area = value * scale;
    (area / PI).sqrt()
}
