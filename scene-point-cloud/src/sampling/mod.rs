//! Surface samplers for primitive actors and the transform applied to
//! externally captured point clouds.

pub mod point_cloud;
pub mod prism;
pub mod sphere;

pub use point_cloud::{CloudPoint, load_point_cloud, points_per_cloud, subsample, transform_cloud};
pub use prism::{interpolate_face, order_prism_corners, order_quad, prism_faces, sample_prism};
pub use sphere::{fibonacci_sphere, sample_sphere, sphere_sample_count};
