/// Caller-supplied conversion configuration.
use crate::error::ConfigError;
use constants::sampling::{
    DEFAULT_POINT_CLOUD_CAP, DEFAULT_PRISM_DENSITY, DEFAULT_SPHERE_DENSITY, frame_stride,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Lowercase a mode name and collapse inner whitespace so that
/// `Grey scale`, `Grey Scale` and `grey  scale` compare equal.
fn canonical(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Material colour channels appended after the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum MaterialColorMode {
    Rgba,
    GreyScale,
    Rgb,
}

impl FromStr for MaterialColorMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match canonical(value).as_str() {
            "rgba" => Ok(Self::Rgba),
            "grey scale" => Ok(Self::GreyScale),
            "rgb" => Ok(Self::Rgb),
            _ => Err(ConfigError::MaterialColor(value.to_string())),
        }
    }
}

impl TryFrom<String> for MaterialColorMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Light colour and intensity channels appended after the material channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum LightColorMode {
    Rgbai,
    Rgba,
    Rgbi,
    Rgb,
    GreyScale,
    Intensity,
}

impl FromStr for LightColorMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match canonical(value).as_str() {
            "rgbai" => Ok(Self::Rgbai),
            "rgba" => Ok(Self::Rgba),
            "rgbi" => Ok(Self::Rgbi),
            "rgb" => Ok(Self::Rgb),
            "grey scale" => Ok(Self::GreyScale),
            "intensity" => Ok(Self::Intensity),
            _ => Err(ConfigError::LightColor(value.to_string())),
        }
    }
}

impl TryFrom<String> for LightColorMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Width of the x/y/z position properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FloatPrecision {
    F16,
    F32,
    F64,
}

impl FloatPrecision {
    pub fn bits(self) -> u32 {
        match self {
            Self::F16 => 16,
            Self::F32 => 32,
            Self::F64 => 64,
        }
    }

    pub fn byte_width(self) -> usize {
        self.bits() as usize / 8
    }

    /// PLY type name used in `property <type> x` lines.
    pub fn property_type(self) -> &'static str {
        match self {
            Self::F16 => "float16",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }
}

impl TryFrom<u32> for FloatPrecision {
    type Error = ConfigError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            16 => Ok(Self::F16),
            32 => Ok(Self::F32),
            64 => Ok(Self::F64),
            other => Err(ConfigError::FloatPrecision(other)),
        }
    }
}

impl From<FloatPrecision> for u32 {
    fn from(precision: FloatPrecision) -> Self {
        precision.bits()
    }
}

/// PLY payload encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PlyFormat {
    Binary,
    Ascii,
}

impl PlyFormat {
    /// Value of the `format` header line.
    pub fn header_name(self) -> &'static str {
        match self {
            Self::Binary => "binary_little_endian",
            Self::Ascii => "ascii",
        }
    }
}

impl FromStr for PlyFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match canonical(value).as_str() {
            "binary" => Ok(Self::Binary),
            "ascii" => Ok(Self::Ascii),
            _ => Err(ConfigError::PlyFormat(value.to_string())),
        }
    }
}

impl TryFrom<String> for PlyFormat {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What to do with an actor whose `Rendered:` line has no entry in the
/// precomputed rendering time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum MissingActorPolicy {
    /// Fail the frame.
    #[default]
    Strict,
    /// Keep the literal Yes/No flag from the frame.
    LiteralFlag,
}

impl FromStr for MissingActorPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match canonical(value).as_str() {
            "strict" => Ok(Self::Strict),
            "literalflag" | "literal flag" => Ok(Self::LiteralFlag),
            _ => Err(ConfigError::MissingActorPolicy(value.to_string())),
        }
    }
}

impl TryFrom<String> for MissingActorPolicy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parse a `Yes`/`No` switch.
pub fn parse_yes_no(value: &str) -> Result<bool, ConfigError> {
    match canonical(value).as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(ConfigError::YesNo(value.to_string())),
    }
}

fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_yes_no(&value).map_err(serde::de::Error::custom)
}

/// Conversion settings supplied by the caller.
/// Every field is optional in JSON and defaults to the capture tool's defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub material_color: MaterialColorMode,
    pub light_color: LightColorMode,
    pub float_precision: FloatPrecision,
    pub ply_format: PlyFormat,
    /// Sphere samples per unit of sqrt(surface area).
    pub sphere_density: f64,
    /// Prism samples per unit of edge length.
    pub prism_density: f64,
    /// Total point budget shared by all point clouds of one frame.
    pub pcds_point_cap: usize,
    #[serde(deserialize_with = "yes_no")]
    pub normalize: bool,
    #[serde(deserialize_with = "yes_no")]
    pub include_spheres: bool,
    #[serde(deserialize_with = "yes_no")]
    pub include_prisms: bool,
    #[serde(deserialize_with = "yes_no")]
    pub include_point_clouds: bool,
    pub fps: u32,
    pub missing_actor_policy: MissingActorPolicy,
    /// Directory holding `<actor>.txt` files for point cloud actors.
    pub point_cloud_directory: PathBuf,
    /// Optional static actor description converted to one PLY per actor.
    pub static_actors_file: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            material_color: MaterialColorMode::GreyScale,
            light_color: LightColorMode::GreyScale,
            float_precision: FloatPrecision::F32,
            ply_format: PlyFormat::Binary,
            sphere_density: DEFAULT_SPHERE_DENSITY,
            prism_density: DEFAULT_PRISM_DENSITY,
            pcds_point_cap: DEFAULT_POINT_CLOUD_CAP,
            normalize: false,
            include_spheres: true,
            include_prisms: true,
            include_point_clouds: true,
            fps: 30,
            missing_actor_policy: MissingActorPolicy::Strict,
            point_cloud_directory: PathBuf::from("."),
            static_actors_file: None,
        }
    }
}

impl ConversionConfig {
    /// Load a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether the frame with this embedded number is converted at the configured rate.
    pub fn keeps_frame(&self, frame_number: u64) -> bool {
        match frame_stride(self.fps) {
            Some(stride) => frame_number % u64::from(stride) == 0,
            None => true,
        }
    }
}

impl fmt::Display for MaterialColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgba => "RGBA",
            Self::GreyScale => "Grey scale",
            Self::Rgb => "RGB",
        };
        f.write_str(name)
    }
}

impl fmt::Display for LightColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgbai => "RGBAI",
            Self::Rgba => "RGBA",
            Self::Rgbi => "RGBI",
            Self::Rgb => "RGB",
            Self::GreyScale => "Grey scale",
            Self::Intensity => "Intensity",
        };
        f.write_str(name)
    }
}
