/// Centroid and unit-sphere normalisation of point positions
use glam::DVec3;

/// Mean of a non-empty point set
pub fn centroid(points: &[DVec3]) -> Option<DVec3> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().copied().sum::<DVec3>() / points.len() as f64)
}

/// Centre the points on their centroid and scale uniformly so the farthest
/// point lies at distance 1 from the origin.
pub fn normalize_positions(points: &mut [DVec3]) {
    let Some(center) = centroid(points) else {
        log::warn!("Normalization skipped: point set is empty");
        return;
    };

    for point in points.iter_mut() {
        *point -= center;
    }

    let farthest = points
        .iter()
        .map(|point| point.length())
        .fold(0.0_f64, f64::max);

    // All points coincide with the centroid.
    if farthest == 0.0 {
        return;
    }

    for point in points.iter_mut() {
        *point /= farthest;
    }
}
