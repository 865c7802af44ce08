/// Single-pass parser turning a frame description into typed scene actors.
use crate::config::MissingActorPolicy;
use crate::error::ParseError;
use crate::rendering::RenderingTimeSeries;
use crate::scene::{
    ActorKind, Appearance, Color, FrameScene, PointCloudRef, Prism, SceneEntity, Sphere,
};
use constants::scene_grammar::{
    CENTER_KEY, CLOSEST_LIGHT_KEY, LIGHT_COLOR_KEY, LIGHT_INTENSITY_KEY, MATERIAL_COLOR_KEY,
    RADIUS_KEY, RENDERED_KEY, ROTATION_KEY, SCALE_KEY, rendered_flag,
};
use glam::DVec3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Classification of one trimmed line of a frame description.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Header { name: String, kind: ActorKind },
    Attribute(AttributeLine),
    Ignored,
}

/// A recognised attribute line.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeLine {
    MaterialColor(Vec<f64>),
    LightColor(Vec<f64>),
    LightIntensity(f64),
    Center(DVec3),
    Radius(f64),
    Scale(DVec3),
    Rotation(DVec3),
    ClosestLight(String),
    Rendered(u32),
    Point(DVec3),
}

/// Classify a line by header suffix first, then by keyword prefix.
/// Lines matching no rule are `Ignored`.
pub fn classify_line(raw: &str) -> LineKind {
    let line = raw.trim();

    if let Some(kind) = ActorKind::from_header(line) {
        let name = line.split_whitespace().next().unwrap_or_default().to_string();
        return LineKind::Header { name, kind };
    }

    classify_attribute(line)
        .map(LineKind::Attribute)
        .unwrap_or(LineKind::Ignored)
}

fn classify_attribute(line: &str) -> Option<AttributeLine> {
    if let Some(rest) = line.strip_prefix(MATERIAL_COLOR_KEY) {
        Some(AttributeLine::MaterialColor(digit_runs(rest)))
    } else if let Some(rest) = line.strip_prefix(LIGHT_COLOR_KEY) {
        Some(AttributeLine::LightColor(digit_runs(rest)))
    } else if let Some(rest) = line.strip_prefix(LIGHT_INTENSITY_KEY) {
        rest.trim().parse().ok().map(AttributeLine::LightIntensity)
    } else if let Some(rest) = line.strip_prefix(CENTER_KEY) {
        parse_vec3(rest).map(AttributeLine::Center)
    } else if let Some(rest) = line.strip_prefix(RADIUS_KEY) {
        rest.trim().parse().ok().map(AttributeLine::Radius)
    } else if let Some(rest) = line.strip_prefix(SCALE_KEY) {
        parse_vec3(rest).map(AttributeLine::Scale)
    } else if let Some(rest) = line.strip_prefix(ROTATION_KEY) {
        parse_vec3(rest).map(AttributeLine::Rotation)
    } else if let Some(rest) = line.strip_prefix(CLOSEST_LIGHT_KEY) {
        Some(AttributeLine::ClosestLight(rest.trim().to_string()))
    } else if let Some(rest) = line.strip_prefix(RENDERED_KEY) {
        rendered_flag(rest).map(AttributeLine::Rendered)
    } else {
        parse_point(line).map(AttributeLine::Point)
    }
}

/// Every unsigned integer run in the text, in order.
fn digit_runs(text: &str) -> Vec<f64> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse::<f64>().ok())
        .collect()
}

/// First three numeric tokens, accepting `X=1.0` style labels and trailing commas.
fn parse_vec3(text: &str) -> Option<DVec3> {
    let values: Vec<f64> = text
        .split_whitespace()
        .filter_map(|token| {
            let value = token.rsplit('=').next().unwrap_or(token);
            value.trim_matches(',').parse().ok()
        })
        .collect();

    match values.as_slice() {
        [x, y, z, ..] => Some(DVec3::new(*x, *y, *z)),
        _ => None,
    }
}

/// A bare line of exactly three numbers is a prism corner.
fn parse_point(line: &str) -> Option<DVec3> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 3 {
        return None;
    }
    let x = tokens[0].parse().ok()?;
    let y = tokens[1].parse().ok()?;
    let z = tokens[2].parse().ok()?;
    Some(DVec3::new(x, y, z))
}

/// Where to look up decayed rendering weights for the frame being parsed.
#[derive(Debug, Clone, Copy)]
pub struct RenderingLookup<'a> {
    pub series: &'a RenderingTimeSeries,
    /// 1-based position of the frame in the participant's ordered frame list.
    pub frame_index: usize,
    pub policy: MissingActorPolicy,
}

/// Attributes gathered for the actor currently being read.
struct PendingActor {
    name: String,
    kind: ActorKind,
    attribute_count: usize,
    center: Option<DVec3>,
    radius: Option<f64>,
    scale: Option<DVec3>,
    rotation: Option<DVec3>,
    points: Vec<DVec3>,
    appearance: Appearance,
}

impl PendingActor {
    fn new(name: String, kind: ActorKind) -> Self {
        Self {
            name,
            kind,
            attribute_count: 0,
            center: None,
            radius: None,
            scale: None,
            rotation: None,
            points: Vec::new(),
            appearance: Appearance::default(),
        }
    }

    fn into_entity(self, directory: &Path) -> SceneEntity {
        match self.kind {
            ActorKind::Sphere => SceneEntity::Sphere(Sphere {
                name: self.name,
                center: self.center,
                radius: self.radius,
                appearance: self.appearance,
            }),
            ActorKind::Prism => SceneEntity::Prism(Prism {
                name: self.name,
                points: self.points,
                appearance: self.appearance,
            }),
            ActorKind::PointCloud => SceneEntity::PointCloud(PointCloudRef {
                name: self.name,
                directory: directory.to_path_buf(),
                center: self.center,
                scale: self.scale,
                rotation: self.rotation,
                appearance: self.appearance,
            }),
        }
    }
}

enum ParseState {
    Idle,
    Collecting(PendingActor),
}

/// Frame description parser.
/// Holds the point cloud directory assigned to point cloud actors and the
/// optional rendering time series that overrides literal `Rendered:` flags.
pub struct FrameParser<'a> {
    point_cloud_directory: PathBuf,
    rendering: Option<RenderingLookup<'a>>,
}

impl<'a> FrameParser<'a> {
    pub fn new(point_cloud_directory: &Path) -> Self {
        Self {
            point_cloud_directory: point_cloud_directory.to_path_buf(),
            rendering: None,
        }
    }

    /// Override literal `Rendered:` flags with weights from a time series.
    pub fn with_rendering(mut self, lookup: RenderingLookup<'a>) -> Self {
        self.rendering = Some(lookup);
        self
    }

    /// Stream a frame file line by line.
    pub fn parse_file(&self, path: &Path) -> Result<FrameScene, ParseError> {
        let io_error = |source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_error)?);

        let mut state = ParseState::Idle;
        let mut scene = FrameScene::default();
        for line in reader.lines() {
            let line = line.map_err(io_error)?;
            state = self.step(state, &line, &mut scene)?;
        }
        self.finish(state, &mut scene);

        Ok(scene)
    }

    /// Parse already-loaded lines.
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<FrameScene, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = ParseState::Idle;
        let mut scene = FrameScene::default();
        for line in lines {
            state = self.step(state, line.as_ref(), &mut scene)?;
        }
        self.finish(state, &mut scene);

        Ok(scene)
    }

    fn step(
        &self,
        state: ParseState,
        line: &str,
        scene: &mut FrameScene,
    ) -> Result<ParseState, ParseError> {
        match (classify_line(line), state) {
            (LineKind::Header { name, kind }, previous) => {
                self.finish(previous, scene);
                Ok(ParseState::Collecting(PendingActor::new(name, kind)))
            }
            (LineKind::Attribute(attribute), ParseState::Collecting(mut actor)) => {
                self.apply(&mut actor, attribute)?;
                Ok(ParseState::Collecting(actor))
            }
            // Attributes before the first header have no owner.
            (LineKind::Attribute(_), ParseState::Idle) => Ok(ParseState::Idle),
            (LineKind::Ignored, state) => Ok(state),
        }
    }

    /// Flush the pending actor; actors without attributes are dropped.
    fn finish(&self, state: ParseState, scene: &mut FrameScene) {
        if let ParseState::Collecting(actor) = state {
            if actor.attribute_count > 0 {
                scene.push(actor.into_entity(&self.point_cloud_directory));
            }
        }
    }

    fn apply(&self, actor: &mut PendingActor, attribute: AttributeLine) -> Result<(), ParseError> {
        actor.attribute_count += 1;
        match attribute {
            AttributeLine::MaterialColor(values) => {
                actor.appearance.material_color = Some(Color::from_components(&values))
            }
            AttributeLine::LightColor(values) => {
                actor.appearance.light_color = Some(Color::from_components(&values))
            }
            AttributeLine::LightIntensity(value) => actor.appearance.light_intensity = Some(value),
            AttributeLine::Center(center) => actor.center = Some(center),
            AttributeLine::Radius(radius) => actor.radius = Some(radius),
            AttributeLine::Scale(scale) => actor.scale = Some(scale),
            AttributeLine::Rotation(rotation) => actor.rotation = Some(rotation),
            AttributeLine::ClosestLight(light) => actor.appearance.closest_light = Some(light),
            AttributeLine::Point(point) => actor.points.push(point),
            AttributeLine::Rendered(flag) => {
                actor.appearance.rendered_weight = Some(self.rendered_weight(&actor.name, flag)?)
            }
        }
        Ok(())
    }

    fn rendered_weight(&self, actor: &str, literal: u32) -> Result<u32, ParseError> {
        let Some(lookup) = self.rendering else {
            return Ok(literal);
        };

        match lookup.series.weight(actor, lookup.frame_index) {
            Some(weight) => Ok(weight),
            None => match lookup.policy {
                MissingActorPolicy::Strict => Err(ParseError::MissingRenderingWeight {
                    actor: actor.to_string(),
                    frame_index: lookup.frame_index,
                }),
                MissingActorPolicy::LiteralFlag => {
                    log::debug!("No rendering weight for '{}', keeping literal flag", actor);
                    Ok(literal)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FRAME: &str = "\
Cube_1 (Rectangular Prism):
Material Color: R=255 G=0 B=0 A=255
Light Color: R=10 G=20 B=30
Light Intensity: 2.5
0 0 0
1 0 0
0 1 0
1 1 0
0 0 1
1 0 1
0 1 1
1 1 1
Rendered: Yes
Ball (Sphere):
Center: 1.0 2.0 3.0
Radius: 0.5
Closest Light: PointLight_3
Rendered: No
Chair (Point Cloud):
Center: 0 0 0
Scale: 1 1 1
Rotation: 0 0 90
Rendered: Yes";

    fn parse(text: &str) -> FrameScene {
        FrameParser::new(Path::new("pcds"))
            .parse_lines(text.lines())
            .unwrap()
    }

    #[test]
    fn parses_each_actor_kind() {
        let scene = parse(FRAME);
        assert_eq!(scene.prisms.len(), 1);
        assert_eq!(scene.spheres.len(), 1);
        assert_eq!(scene.point_clouds.len(), 1);

        let prism = &scene.prisms[0];
        assert_eq!(prism.name, "Cube_1");
        assert_eq!(prism.points.len(), 8);
        assert!(prism.corners().is_some());
        assert_eq!(
            prism.appearance.material_color,
            Some(Color([255.0, 0.0, 0.0, 255.0]))
        );
        assert_eq!(
            prism.appearance.light_color,
            Some(Color([10.0, 20.0, 30.0, 255.0]))
        );
        assert_eq!(prism.appearance.light_intensity, Some(2.5));
        assert_eq!(prism.appearance.rendered_weight, Some(1));

        let sphere = &scene.spheres[0];
        assert_eq!(sphere.center, Some(DVec3::new(1.0, 2.0, 3.0)));
        assert_eq!(sphere.radius, Some(0.5));
        assert_eq!(sphere.appearance.closest_light.as_deref(), Some("PointLight_3"));
        assert_eq!(sphere.appearance.rendered_weight, Some(0));
    }

    #[test]
    fn trailing_actor_is_flushed() {
        let scene = parse(FRAME);
        let cloud = &scene.point_clouds[0];
        assert_eq!(cloud.name, "Chair");
        assert_eq!(cloud.rotation, Some(DVec3::new(0.0, 0.0, 90.0)));
        assert_eq!(cloud.file_path(), Path::new("pcds").join("Chair.txt"));
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let scene = parse("Ball (Sphere):\nVelocity: 3 4\nnot a point\nRadius: 2\n");
        assert_eq!(scene.spheres.len(), 1);
        assert_eq!(scene.spheres[0].radius, Some(2.0));
        assert_eq!(scene.spheres[0].center, None);
    }

    #[test]
    fn header_without_attributes_is_not_emitted() {
        let scene = parse("Empty (Sphere):\nBall (Sphere):\nRadius: 1\n");
        assert_eq!(scene.spheres.len(), 1);
        assert_eq!(scene.spheres[0].name, "Ball");
    }

    #[test]
    fn rendered_values_are_case_and_space_insensitive() {
        assert_eq!(
            classify_line("Rendered:  Y es"),
            LineKind::Attribute(AttributeLine::Rendered(1))
        );
        assert_eq!(
            classify_line("Rendered: no"),
            LineKind::Attribute(AttributeLine::Rendered(0))
        );
        assert_eq!(classify_line("Rendered: maybe"), LineKind::Ignored);
    }

    #[test]
    fn time_series_overrides_literal_flag() {
        let series = RenderingTimeSeries::from_frame_flags(
            vec![1],
            &[HashMap::from([("Ball".to_string(), true)])],
        );
        let lookup = RenderingLookup {
            series: &series,
            frame_index: 1,
            policy: MissingActorPolicy::Strict,
        };
        let scene = FrameParser::new(Path::new("."))
            .with_rendering(lookup)
            .parse_lines("Ball (Sphere):\nRendered: No\n".lines())
            .unwrap();
        assert_eq!(scene.spheres[0].appearance.rendered_weight, Some(1));
    }

    #[test]
    fn missing_series_entry_follows_policy() {
        let series = RenderingTimeSeries::from_frame_flags(
            vec![1],
            &[HashMap::from([("Other".to_string(), true)])],
        );
        let text = "Ball (Sphere):\nRendered: Yes\n";

        let strict = RenderingLookup {
            series: &series,
            frame_index: 1,
            policy: MissingActorPolicy::Strict,
        };
        let err = FrameParser::new(Path::new("."))
            .with_rendering(strict)
            .parse_lines(text.lines())
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingRenderingWeight { .. }));

        let lenient = RenderingLookup {
            policy: MissingActorPolicy::LiteralFlag,
            ..strict
        };
        let scene = FrameParser::new(Path::new("."))
            .with_rendering(lenient)
            .parse_lines(text.lines())
            .unwrap();
        assert_eq!(scene.spheres[0].appearance.rendered_weight, Some(1));
    }
}
