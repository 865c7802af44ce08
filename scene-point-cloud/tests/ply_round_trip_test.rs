//! PLY serialization tests
//!
//! Writes composed point buffers in both payload formats and reads them back.

use approx::assert_abs_diff_eq;
use glam::DVec3;
use scene_point_cloud::compositor::{Attribute, ChannelLayout, PointAttributes, PointBuffer};
use scene_point_cloud::config::{FloatPrecision, LightColorMode, MaterialColorMode, PlyFormat};
use scene_point_cloud::scene::Color;
use scene_point_cloud::{read_ply, write_ply};
use std::fs;

fn sample_buffer(material: MaterialColorMode, light: LightColorMode) -> PointBuffer {
    let mut buffer = PointBuffer::new(ChannelLayout::new(material, light));
    let points = [
        DVec3::new(1.25, -3.5, 0.1),
        DVec3::new(-7.0, 2.0, 100.75),
        DVec3::new(0.0, 0.0, 0.0),
    ];
    buffer
        .compose(
            "Cube_1",
            &points,
            &PointAttributes {
                material: Attribute::PerPoint(vec![
                    Color([255.0, 0.0, 0.0, 255.0]),
                    Color([0.0, 255.0, 0.0, 128.0]),
                    Color([12.9, 34.2, 56.7, 255.0]),
                ]),
                light: Attribute::Broadcast(Color([200.0, 100.0, 50.0, 255.0])),
                intensity: Attribute::Broadcast(4.0),
                rendered: 2,
            },
        )
        .expect("Failed to compose points");
    buffer
}

#[test]
fn test_rgb_binary_header_declares_seven_channels() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("rgb.ply");

    let buffer = sample_buffer(MaterialColorMode::Rgb, LightColorMode::Rgb);
    write_ply(&path, &buffer, FloatPrecision::F32, PlyFormat::Binary).expect("Failed to save PLY");

    let data = read_ply(&path).expect("Failed to read PLY");
    assert_eq!(data.vertex_count(), 3);
    assert_eq!(data.format, PlyFormat::Binary);
    assert_eq!(data.precision, FloatPrecision::F32);
    assert_eq!(data.channel_count(), 7);
    assert_eq!(
        data.property_names(),
        vec![
            "x",
            "y",
            "z",
            "red",
            "green",
            "blue",
            "light_red",
            "light_green",
            "light_blue",
            "rendered"
        ]
    );

    let bytes = fs::read(&path).expect("Failed to read PLY bytes");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.starts_with("ply\nformat binary_little_endian 1.0\nelement vertex 3\n"));
    assert!(text.contains("property float32 x\n"));
    assert!(text.contains("property uchar light_blue\nproperty uchar rendered\nend_header\n"));
}

#[test]
fn test_ascii_and_binary_decode_to_the_same_records() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let buffer = sample_buffer(MaterialColorMode::Rgba, LightColorMode::Rgbai);

    for precision in [FloatPrecision::F16, FloatPrecision::F32, FloatPrecision::F64] {
        let binary_path = temp_dir.path().join(format!("binary{}.ply", precision.bits()));
        let ascii_path = temp_dir.path().join(format!("ascii{}.ply", precision.bits()));
        write_ply(&binary_path, &buffer, precision, PlyFormat::Binary).unwrap();
        write_ply(&ascii_path, &buffer, precision, PlyFormat::Ascii).unwrap();

        let binary = read_ply(&binary_path).unwrap();
        let ascii = read_ply(&ascii_path).unwrap();

        assert_eq!(binary.precision, precision);
        assert_eq!(ascii.precision, precision);
        assert_eq!(binary.channel_names, ascii.channel_names);
        assert_eq!(binary.vertex_count(), ascii.vertex_count());
        for index in 0..binary.vertex_count() {
            let a = binary.positions[index];
            let b = ascii.positions[index];
            assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-5);
            assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-5);
            assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-5);
            assert_eq!(binary.channels(index), ascii.channels(index));
        }

        // Fractional colours truncate, the rendered weight is last.
        assert_eq!(
            binary.channels(2),
            &[12, 34, 56, 255, 200, 100, 50, 255, 4, 2]
        );
    }
}

#[test]
fn test_ascii_payload_is_readable_text() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("out").join("grey.ply");

    let buffer = sample_buffer(MaterialColorMode::GreyScale, LightColorMode::GreyScale);
    write_ply(&path, &buffer, FloatPrecision::F64, PlyFormat::Ascii).expect("Failed to save PLY");

    let contents = fs::read_to_string(&path).expect("Failed to read PLY file");
    assert!(contents.contains("format ascii 1.0"));
    assert!(contents.contains("property float64 x"));
    assert!(contents.contains("property uchar intensity"));
    assert!(contents.contains("property uchar light_grey"));
    // luma(255, 0, 0) = 76.245, luma(200, 100, 50) = 124.2
    assert!(contents.contains("1.250000 -3.500000 0.100000 76 124 2\n"));
}

#[test]
fn test_precision_widths() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let buffer = sample_buffer(MaterialColorMode::Rgb, LightColorMode::Intensity);

    for precision in [FloatPrecision::F16, FloatPrecision::F32, FloatPrecision::F64] {
        let path = temp_dir.path().join(format!("p{}.ply", precision.bits()));
        write_ply(&path, &buffer, precision, PlyFormat::Binary).unwrap();

        let data = read_ply(&path).unwrap();
        assert_eq!(data.precision, precision);
        // 100.75 is exactly representable at every width.
        assert_eq!(data.positions[1].z, 100.75);
        assert_eq!(data.channels(0), &[255, 0, 0, 4, 2]);
    }
}
