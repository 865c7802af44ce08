//! Conversion of recorded VR scene frames into PLY point clouds.
//!
//! Each frame description lists spheres, rectangular prisms and references to
//! externally captured point clouds. Actors are sampled into surface points,
//! tagged with their material, light and rendering channels, and written as PLY.

pub mod compositor;
pub mod config;
pub mod converter;
pub mod error;
pub mod frames;
pub mod normalize;
pub mod parser;
pub mod ply;
pub mod rendering;
pub mod sampling;
pub mod scene;

pub use compositor::{ChannelLayout, PointBuffer};
pub use config::ConversionConfig;
pub use converter::{ConversionContext, ConversionSummary, SceneConverter};
pub use error::{ConfigError, ConvertError, ParseError, PlyError};
pub use ply::{PlyData, read_ply, write_ply};
pub use rendering::RenderingTimeSeries;
