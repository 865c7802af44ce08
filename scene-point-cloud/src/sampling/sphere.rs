//! Fibonacci-lattice sphere sampling.

use glam::DVec3;
use std::f64::consts::PI;

/// Number of samples for a sphere: `floor(density * sqrt(4 * pi * r^2))`.
pub fn sphere_sample_count(radius: f64, density: f64) -> usize {
    let surface_area = 4.0 * PI * radius * radius;
    // Float to int casts saturate, so negative or NaN densities give zero samples.
    (density * surface_area.sqrt()).floor() as usize
}

/// Near-uniform unit-sphere points on a Fibonacci lattice.
pub fn fibonacci_sphere(samples: usize) -> Vec<DVec3> {
    if samples == 0 {
        return Vec::new();
    }

    let n = samples as f64;
    let offset = 2.0 / n;
    let increment = PI * (3.0 - 5.0_f64.sqrt());

    (0..samples)
        .map(|i| {
            let y = (i as f64 * offset - 1.0) + offset / 2.0;
            let r = (1.0 - y * y).sqrt();
            let phi = ((i + 1) % samples) as f64 * increment;
            DVec3::new(phi.cos() * r, y, phi.sin() * r)
        })
        .collect()
}

/// Surface points of a sphere, scaled by its radius and moved to its centre.
pub fn sample_sphere(center: DVec3, radius: f64, density: f64) -> Vec<DVec3> {
    fibonacci_sphere(sphere_sample_count(radius, density))
        .into_iter()
        .map(|unit| center + unit * radius)
        .collect()
}
