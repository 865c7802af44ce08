//! Loading, subsampling and placement of externally captured point clouds.

use crate::error::ConvertError;
use constants::coordinate_system::{Z_ROTATION_OFFSET_DEGREES, transform_coordinates};
use constants::sampling::SUBSAMPLE_SEED;
use glam::{DQuat, DVec3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One captured point: position plus the remaining per-point columns
/// (material RGBA in columns 3..7 for capture-tool exports).
#[derive(Debug, Clone, PartialEq)]
pub struct CloudPoint {
    pub position: DVec3,
    pub attributes: Vec<f64>,
}

/// Reads a point cloud file: a point count line, then one comma-separated
/// row of floats per point.
pub fn load_point_cloud(path: &Path) -> Result<Vec<CloudPoint>, ConvertError> {
    let malformed = |reason: String| ConvertError::PointCloudFile {
        path: path.to_path_buf(),
        reason,
    };

    let mut lines = BufReader::new(File::open(path)?).lines();

    let header = lines
        .next()
        .transpose()?
        .ok_or_else(|| malformed("missing point count line".to_string()))?;
    let declared: usize = header
        .trim()
        .parse()
        .map_err(|_| malformed(format!("invalid point count '{}'", header.trim())))?;

    let mut points = Vec::new();
    for (row, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let values = line
            .split(',')
            .map(|value| value.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| malformed(format!("row {}: {}", row + 1, e)))?;

        if values.len() < 3 {
            return Err(malformed(format!(
                "row {} has {} values, expected at least 3",
                row + 1,
                values.len()
            )));
        }

        points.push(CloudPoint {
            position: DVec3::new(values[0], values[1], values[2]),
            attributes: values[3..].to_vec(),
        });
    }

    if points.len() != declared {
        log::warn!(
            "{} declares {} points but contains {}",
            path.display(),
            declared,
            points.len()
        );
    }

    Ok(points)
}

/// Per-cloud share of the frame's point budget.
pub fn points_per_cloud(total_cap: usize, cloud_count: usize) -> usize {
    if cloud_count == 0 {
        0
    } else {
        total_cap / cloud_count
    }
}

/// Keeps at most `cap` points using a shuffle seeded with a fixed value,
/// so the same input always yields the same subset in the same order.
pub fn subsample<T>(points: &mut Vec<T>, cap: usize) {
    if points.len() <= cap {
        return;
    }

    let mut rng = StdRng::seed_from_u64(SUBSAMPLE_SEED);
    points.shuffle(&mut rng);
    points.truncate(cap);
}

/// Rotation for captured Euler angles in degrees.
/// Rotations are about the fixed X, then Y, then Z axes, with the capture
/// system's offset added to Z.
pub fn cloud_rotation(rotation_degrees: DVec3) -> DQuat {
    let rx = rotation_degrees.x.to_radians();
    let ry = rotation_degrees.y.to_radians();
    let rz = (rotation_degrees.z + Z_ROTATION_OFFSET_DEGREES).to_radians();

    DQuat::from_rotation_z(rz) * DQuat::from_rotation_y(ry) * DQuat::from_rotation_x(rx)
}

/// Places captured points in the scene: mirror X, rotate, scale per axis, then translate.
pub fn transform_cloud(
    points: &mut [CloudPoint],
    center: DVec3,
    scale: DVec3,
    rotation_degrees: DVec3,
) {
    let rotation = cloud_rotation(rotation_degrees);

    for point in points {
        let (x, y, z) = transform_coordinates(point.position.x, point.position.y, point.position.z);
        point.position = rotation * DVec3::new(x, y, z) * scale + center;
    }
}
