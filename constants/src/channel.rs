/// Rec. 601 luma weights for red, green and blue
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Alpha used when a colour is given with only three components
pub const OPAQUE_ALPHA: f64 = 255.0;

/// Largest value an unsigned 8-bit channel can hold
pub const CHANNEL_MAX: f64 = 255.0;

pub const POSITION_PROPERTIES: [&str; 3] = ["x", "y", "z"];
pub const MATERIAL_RGBA_PROPERTIES: [&str; 4] = ["red", "green", "blue", "alpha"];
pub const MATERIAL_GREY_PROPERTY: &str = "intensity";
pub const LIGHT_RGBA_PROPERTIES: [&str; 4] = ["light_red", "light_green", "light_blue", "light_alpha"];
pub const LIGHT_GREY_PROPERTY: &str = "light_grey";
pub const LIGHT_INTENSITY_PROPERTY: &str = "light_intensity";
pub const RENDERED_PROPERTY: &str = "rendered";

/// Greyscale value of an RGB triple.
pub fn luma(rgb: [f64; 3]) -> f64 {
    LUMA_WEIGHTS[0] * rgb[0] + LUMA_WEIGHTS[1] * rgb[1] + LUMA_WEIGHTS[2] * rgb[2]
}

/// Quantize a channel value to u8 by clamping and truncating toward zero.
pub fn quantize(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, CHANNEL_MAX) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clamps_and_truncates() {
        assert_eq!(quantize(-3.0), 0);
        assert_eq!(quantize(12.99), 12);
        assert_eq!(quantize(255.0), 255);
        assert_eq!(quantize(400.0), 255);
        assert_eq!(quantize(f64::NAN), 0);
    }

    #[test]
    fn luma_of_white_is_full_scale() {
        assert!((luma([255.0, 255.0, 255.0]) - 255.0).abs() < 1e-9);
    }
}
