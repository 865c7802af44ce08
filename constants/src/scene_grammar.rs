//! Line grammar of the per-frame scene descriptions written by the capture tool.

/// Header suffix of a rectangular prism actor
pub const PRISM_HEADER_SUFFIX: &str = "(Rectangular Prism):";

/// Header suffix of a point cloud actor
pub const POINT_CLOUD_HEADER_SUFFIX: &str = "(Point Cloud):";

/// Header suffix of a sphere actor
pub const SPHERE_HEADER_SUFFIX: &str = "(Sphere):";

pub const MATERIAL_COLOR_KEY: &str = "Material Color:";
pub const LIGHT_COLOR_KEY: &str = "Light Color:";
pub const LIGHT_INTENSITY_KEY: &str = "Light Intensity:";
pub const CENTER_KEY: &str = "Center:";
pub const RADIUS_KEY: &str = "Radius:";
pub const SCALE_KEY: &str = "Scale:";
pub const ROTATION_KEY: &str = "Rotation:";
pub const CLOSEST_LIGHT_KEY: &str = "Closest Light:";
pub const RENDERED_KEY: &str = "Rendered:";

/// Frame description files are named `frame_<N>.txt`
pub const FRAME_FILE_PREFIX: &str = "frame_";
pub const FRAME_FILE_EXTENSION: &str = "txt";

/// External point clouds live at `<directory>/<actor>.txt`
pub const POINT_CLOUD_FILE_EXTENSION: &str = "txt";

/// Map a `Rendered:` value to its literal flag.
/// Whitespace is ignored and matching is case-insensitive.
pub fn rendered_flag(value: &str) -> Option<u32> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.to_ascii_lowercase().as_str() {
        "yes" => Some(1),
        "no" => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_flag_literals() {
        assert_eq!(rendered_flag(" Yes"), Some(1));
        assert_eq!(rendered_flag("NO "), Some(0));
        assert_eq!(rendered_flag("1"), None);
    }
}
