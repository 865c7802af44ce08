/// Coordinate transformation matrix applied to externally captured point clouds
/// (row-major: [x_new, y_new, z_new]).
/// The capture system writes a left-handed X axis, so X is mirrored.
pub const COORDINATE_TRANSFORM: [[f64; 3]; 3] = [
    [-1.0, 0.0, 0.0], // X = -X
    [0.0, 1.0, 0.0],  // Y = Y
    [0.0, 0.0, 1.0],  // Z = Z
];

/// Offset added to the captured Z Euler angle before rotating a point cloud.
pub const Z_ROTATION_OFFSET_DEGREES: f64 = 180.0;

/// Apply coordinate transformation matrix to ensure consistency.
/// Transforms input coordinates using predefined transformation matrix.
pub fn transform_coordinates(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let input = [x, y, z];
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            output[i] += COORDINATE_TRANSFORM[i][j] * input[j];
        }
    }

    (output[0], output[1], output[2])
}
