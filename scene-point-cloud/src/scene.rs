/// Typed scene actors parsed from one frame description.
use constants::channel::OPAQUE_ALPHA;
use constants::scene_grammar::{
    POINT_CLOUD_FILE_EXTENSION, POINT_CLOUD_HEADER_SUFFIX, PRISM_HEADER_SUFFIX,
    SPHERE_HEADER_SUFFIX,
};
use glam::DVec3;
use std::path::PathBuf;

/// Kind of actor announced by a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Sphere,
    Prism,
    PointCloud,
}

impl ActorKind {
    /// Classify a trimmed line as an actor header by its suffix.
    pub fn from_header(line: &str) -> Option<Self> {
        if line.ends_with(PRISM_HEADER_SUFFIX) {
            Some(Self::Prism)
        } else if line.ends_with(POINT_CLOUD_HEADER_SUFFIX) {
            Some(Self::PointCloud)
        } else if line.ends_with(SPHERE_HEADER_SUFFIX) {
            Some(Self::Sphere)
        } else {
            None
        }
    }
}

/// RGBA colour with components on the 0..=255 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub [f64; 4]);

impl Color {
    /// Build from 3 or 4 components. Missing components are 0, a missing alpha is opaque.
    pub fn from_components(components: &[f64]) -> Self {
        let mut rgba = [0.0, 0.0, 0.0, OPAQUE_ALPHA];
        for (slot, value) in rgba.iter_mut().zip(components) {
            *slot = *value;
        }
        Self(rgba)
    }

    pub fn rgb(&self) -> [f64; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn rgba(&self) -> [f64; 4] {
        self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self([0.0, 0.0, 0.0, OPAQUE_ALPHA])
    }
}

/// Appearance and rendering state shared by every actor kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearance {
    pub material_color: Option<Color>,
    pub light_color: Option<Color>,
    pub light_intensity: Option<f64>,
    pub closest_light: Option<String>,
    /// Literal Yes/No flag, or the decayed weight when a time series applies.
    pub rendered_weight: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub name: String,
    pub center: Option<DVec3>,
    pub radius: Option<f64>,
    pub appearance: Appearance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    pub name: String,
    /// Corner points in encounter order.
    pub points: Vec<DVec3>,
    pub appearance: Appearance,
}

impl Prism {
    /// The eight corners, when exactly eight were listed.
    pub fn corners(&self) -> Option<[DVec3; 8]> {
        <[DVec3; 8]>::try_from(self.points.as_slice()).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudRef {
    pub name: String,
    /// Directory holding the external `<name>.txt` point file.
    pub directory: PathBuf,
    pub center: Option<DVec3>,
    pub scale: Option<DVec3>,
    /// Euler angles in degrees.
    pub rotation: Option<DVec3>,
    pub appearance: Appearance,
}

impl PointCloudRef {
    pub fn file_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.name, POINT_CLOUD_FILE_EXTENSION))
    }
}

/// One parsed actor.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEntity {
    Sphere(Sphere),
    Prism(Prism),
    PointCloud(PointCloudRef),
}

/// Actors of one frame, split by kind and kept in encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameScene {
    pub spheres: Vec<Sphere>,
    pub prisms: Vec<Prism>,
    pub point_clouds: Vec<PointCloudRef>,
}

impl FrameScene {
    pub fn push(&mut self, entity: SceneEntity) {
        match entity {
            SceneEntity::Sphere(s) => self.spheres.push(s),
            SceneEntity::Prism(p) => self.prisms.push(p),
            SceneEntity::PointCloud(c) => self.point_clouds.push(c),
        }
    }
}
