//! Rectangular prism surface sampling by bilinear interpolation of its faces.

use glam::DVec3;

/// Orders eight corners into a bottom quad and a top quad.
/// Corners are sorted by z, then each group of four by (x, y).
pub fn order_prism_corners(corners: [DVec3; 8]) -> [DVec3; 8] {
    let mut ordered = corners;
    ordered.sort_by(|a, b| a.z.total_cmp(&b.z));

    let by_xy = |a: &DVec3, b: &DVec3| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y));
    ordered[..4].sort_by(by_xy);
    ordered[4..].sort_by(by_xy);

    ordered
}

/// The six faces of a prism whose corners went through [`order_prism_corners`]:
/// bottom, top, then the four sides.
pub fn prism_faces(ordered: &[DVec3; 8]) -> [[DVec3; 4]; 6] {
    let p = ordered;
    [
        [p[0], p[1], p[3], p[2]],
        [p[4], p[5], p[7], p[6]],
        [p[0], p[1], p[5], p[4]],
        [p[2], p[3], p[7], p[6]],
        [p[3], p[1], p[5], p[7]],
        [p[0], p[4], p[6], p[2]],
    ]
}

/// Re-orders a quad counter-clockwise around its centroid.
/// The points are projected onto the plane through the centroid whose normal
/// comes from the first three points, then sorted by polar angle.
pub fn order_quad(face: [DVec3; 4]) -> [DVec3; 4] {
    let centroid = face.iter().copied().sum::<DVec3>() / 4.0;
    let normal = (face[1] - face[0]).cross(face[2] - face[0]);
    if normal.length_squared() == 0.0 || !normal.is_finite() {
        return face;
    }
    let normal = normal.normalize();

    let mut x_axis = DVec3::Z.cross(normal);
    if x_axis.length_squared() == 0.0 {
        x_axis = DVec3::Y.cross(normal);
    }
    let x_axis = x_axis.normalize();
    let y_axis = normal.cross(x_axis);

    let angle = |p: &DVec3| {
        let local = *p - centroid;
        local.dot(y_axis).atan2(local.dot(x_axis))
    };

    let mut ordered = face;
    ordered.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
    ordered
}

/// `n` evenly spaced values from 0 to 1 inclusive.
fn linspace(n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |i| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 })
}

/// Samples a regular (u, v) grid over a quad by bilinear blending of its corners.
/// Each edge gets `floor(points_per_unit_length * edge_length) + 1` samples.
pub fn interpolate_face(face: [DVec3; 4], points_per_unit_length: f64) -> Vec<DVec3> {
    let [p1, p2, p3, p4] = order_quad(face);

    let edge_u = (p2 - p1).length();
    let edge_v = (p3 - p2).length();
    let count_u = (points_per_unit_length * edge_u).floor() as usize + 1;
    let count_v = (points_per_unit_length * edge_v).floor() as usize + 1;

    let mut points = Vec::with_capacity(count_u * count_v);
    for v in linspace(count_v) {
        for u in linspace(count_u) {
            points.push(
                (1.0 - u) * (1.0 - v) * p1 + u * (1.0 - v) * p2 + u * v * p3 + (1.0 - u) * v * p4,
            );
        }
    }

    points
}

/// Surface points of all six faces of a prism.
pub fn sample_prism(corners: [DVec3; 8], points_per_unit_length: f64) -> Vec<DVec3> {
    let ordered = order_prism_corners(corners);

    prism_faces(&ordered)
        .into_iter()
        .flat_map(|face| interpolate_face(face, points_per_unit_length))
        .collect()
}
