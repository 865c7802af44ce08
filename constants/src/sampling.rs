/// Seed for the shuffle-then-truncate subsampling of external point clouds
pub const SUBSAMPLE_SEED: u64 = 42;

/// Frame rate of the capture session
pub const CAPTURE_FPS: u32 = 60;

/// Output frame rates that evenly divide the capture rate
pub const SUPPORTED_FPS: &[u32] = &[1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30, 60];

/// Sphere samples per unit of sqrt(surface area)
pub const DEFAULT_SPHERE_DENSITY: f64 = 0.1;

/// Prism samples per unit of edge length
pub const DEFAULT_PRISM_DENSITY: f64 = 0.02;

/// Total point budget shared by every point cloud of a frame
pub const DEFAULT_POINT_CLOUD_CAP: usize = 100_000;

/// Frame stride for a requested output rate, or None when every frame is kept.
pub fn frame_stride(fps: u32) -> Option<u32> {
    SUPPORTED_FPS
        .contains(&fps)
        .then(|| CAPTURE_FPS / fps)
}
