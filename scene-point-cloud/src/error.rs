/// Error types for scene parsing, configuration, serialization and conversion.
use std::path::PathBuf;

/// Failures while reading a frame description.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No rendering weight for actor '{actor}' at frame index {frame_index}")]
    MissingRenderingWeight { actor: String, frame_index: usize },
}

/// Invalid caller-supplied configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid material color mode '{0}' (expected RGBA, Grey scale or RGB)")]
    MaterialColor(String),

    #[error(
        "Invalid light color mode '{0}' (expected RGBAI, RGBA, RGBI, RGB, Grey scale or Intensity)"
    )]
    LightColor(String),

    #[error("Invalid float precision {0} (expected 16, 32 or 64)")]
    FloatPrecision(u32),

    #[error("Invalid PLY format '{0}' (expected Binary or ASCII)")]
    PlyFormat(String),

    #[error("Invalid missing actor policy '{0}' (expected Strict or LiteralFlag)")]
    MissingActorPolicy(String),

    #[error("Expected Yes or No, found '{0}'")]
    YesNo(String),

    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while writing or reading PLY files.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed PLY header: {0}")]
    Header(String),

    #[error("Unsupported PLY property type '{0}'")]
    PropertyType(String),

    #[error("PLY payload ended after {read} of {expected} vertices")]
    Truncated { read: usize, expected: usize },

    #[error("Record has {found} channels but the schema declares {expected}")]
    ChannelCount { found: usize, expected: usize },

    #[error("Invalid value '{0}' in ASCII payload")]
    AsciiValue(String),
}

/// Pipeline-level error wrapping every failure a frame conversion can hit.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ply(#[from] PlyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Summary serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed point cloud file {path}: {reason}")]
    PointCloudFile { path: PathBuf, reason: String },

    #[error("Actor '{actor}' has {found} per-point {attribute} values for {expected} points")]
    AttributeLengthMismatch {
        actor: String,
        attribute: &'static str,
        found: usize,
        expected: usize,
    },
}
