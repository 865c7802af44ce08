//! Constants shared by the scene point-cloud converter crates.
pub mod channel;
pub mod coordinate_system;
pub mod sampling;
pub mod scene_grammar;
