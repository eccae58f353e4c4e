//! Layout rounding: snapping geometry to device-pixel boundaries.
//!
//! All functions take the device scale factor (device pixels per layout
//! unit). Sizes are rounded *up* so content is never clipped by
//! under-rounding; margins and origins round to the nearest pixel.

use trellis_core::{Point, Size, Thickness};

// Floating point error tolerance for the round-up path. Without it,
// re-rounding an already rounded value can step up a full pixel, because
// (ceil(v * s) / s) * s is not always exactly ceil(v * s).
const LAYOUT_EPSILON: f64 = 0.000_001_53;

/// Round a layout value to the nearest device pixel.
pub fn round_layout_value(value: f64, scale: f64) -> f64 {
    if scale == 1.0 {
        value.round()
    } else {
        (value * scale).round() / scale
    }
}

/// Round a layout value up to the next device pixel boundary.
pub fn round_layout_value_up(value: f64, scale: f64) -> f64 {
    if scale == 1.0 {
        value.ceil()
    } else {
        (value * scale - LAYOUT_EPSILON).ceil() / scale
    }
}

/// Round both components of a size up to device pixel boundaries.
pub fn round_layout_size_up(size: Size, scale: f64) -> Size {
    Size::new(
        round_layout_value_up(size.width, scale),
        round_layout_value_up(size.height, scale),
    )
}

/// Round each side of a thickness to the nearest device pixel.
///
/// Margins are rounded on their own rather than folded into the sizes they
/// surround: rounding is not linear, and an un-rounded margin shifts the
/// content by a pixel at certain scales.
pub fn round_layout_thickness(thickness: Thickness, scale: f64) -> Thickness {
    Thickness::new(
        round_layout_value(thickness.left, scale),
        round_layout_value(thickness.top, scale),
        round_layout_value(thickness.right, scale),
        round_layout_value(thickness.bottom, scale),
    )
}

/// Round a point to the nearest device pixel.
pub fn round_layout_point(point: Point, scale: f64) -> Point {
    Point::new(
        round_layout_value(point.x, scale),
        round_layout_value(point.y, scale),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_value_identity_scale() {
        assert_eq!(round_layout_value(10.4, 1.0), 10.0);
        assert_eq!(round_layout_value(10.5, 1.0), 11.0);
        assert_eq!(round_layout_value_up(10.01, 1.0), 11.0);
        assert_eq!(round_layout_value_up(10.0, 1.0), 10.0);
    }

    #[test]
    fn test_round_up_fractional_scale() {
        // 10.1 * 1.5 = 15.15 -> 16 device pixels -> 16 / 1.5 layout units
        let rounded = round_layout_value_up(10.1, 1.5);
        assert!((rounded - 16.0 / 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_round_size_up_idempotent_at_fractional_scale() {
        for scale in [1.0, 1.25, 1.5, 1.75, 2.0, 3.0] {
            let once = round_layout_size_up(Size::new(10.1, 7.3), scale);
            let twice = round_layout_size_up(once, scale);
            assert_eq!(once, twice, "scale {scale}");
        }
    }

    #[test]
    fn test_round_thickness() {
        let t = round_layout_thickness(Thickness::new(1.4, 1.5, 2.6, 0.2), 1.0);
        assert_eq!(t, Thickness::new(1.0, 2.0, 3.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_round_up_idempotent(value in 0.0f64..10000.0, scale in 1.0f64..4.0) {
            let once = round_layout_value_up(value, scale);
            let twice = round_layout_value_up(once, scale);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_round_up_never_shrinks(value in 0.0f64..10000.0, scale in 1.0f64..4.0) {
            let rounded = round_layout_value_up(value, scale);
            // Allow for the epsilon the rounding itself tolerates.
            prop_assert!(rounded >= value - 1e-5);
        }
    }
}
