//! Density to color mapping

use image::Rgb;

/// Plasma-like anchors, evenly spaced over `0.0..=1.0`
const PLASMA: [[u8; 3]; 9] = [
    [13, 8, 135],
    [75, 3, 161],
    [125, 3, 168],
    [168, 34, 150],
    [203, 70, 121],
    [229, 107, 93],
    [248, 148, 65],
    [253, 195, 40],
    [240, 249, 33],
];

/// Convert a normalized value (0-1) to RGB.
/// Low = deep blue (threats), middle = magenta (empty), high = yellow (food)
pub fn plasma(t: f64) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let pos = t * (PLASMA.len() - 1) as f64;
    let lo = (pos.floor() as usize).min(PLASMA.len() - 2);
    let frac = pos - lo as f64;

    let a = PLASMA[lo];
    let b = PLASMA[lo + 1];
    let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_anchors() {
        assert_eq!(plasma(0.0), Rgb([13, 8, 135]));
        assert_eq!(plasma(1.0), Rgb([240, 249, 33]));
        assert_eq!(plasma(0.5), Rgb([203, 70, 121]));
    }

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(plasma(-3.0), plasma(0.0));
        assert_eq!(plasma(7.0), plasma(1.0));
        assert_eq!(plasma(f64::NAN), plasma(0.5));
    }
}
