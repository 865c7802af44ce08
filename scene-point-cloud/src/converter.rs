/// Scene converter orchestrating parsing, sampling, composition and PLY output.
use crate::compositor::{Attribute, ChannelLayout, PointAttributes, PointBuffer};
use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::frames::{FrameFile, discover_frames};
use crate::normalize::normalize_positions;
use crate::parser::{FrameParser, RenderingLookup};
use crate::ply::write_ply;
use crate::rendering::RenderingTimeSeries;
use crate::sampling::{
    load_point_cloud, points_per_cloud, sample_prism, sample_sphere, subsample, transform_cloud,
};
use crate::scene::{Color, FrameScene, PointCloudRef, Prism, Sphere};
use constants::channel::POSITION_PROPERTIES;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File written next to a participant's PLY frames.
pub const SUMMARY_FILE_NAME: &str = "conversion_summary.json";

const PLY_EXTENSION: &str = "ply";

/// Identifies whose frames are being converted, for log context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionContext {
    pub experiment: String,
    pub participant: String,
}

impl ConversionContext {
    pub fn new(experiment: impl Into<String>, participant: impl Into<String>) -> Self {
        Self {
            experiment: experiment.into(),
            participant: participant.into(),
        }
    }
}

/// Outcome of converting one participant's frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub experiment: String,
    pub participant: String,
    pub frames_discovered: usize,
    pub frames_selected: usize,
    pub frames_written: usize,
    pub frames_failed: usize,
    pub points_written: usize,
    /// Every PLY property in record order, positions included.
    pub property_names: Vec<String>,
}

fn progress_bar(len: usize, unit: &str, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!("[{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}", unit);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message(message.to_string());
    pb
}

/// Converts frame descriptions into PLY point clouds for one configuration.
pub struct SceneConverter {
    config: ConversionConfig,
    layout: ChannelLayout,
}

impl SceneConverter {
    pub fn new(config: ConversionConfig) -> Self {
        let layout = ChannelLayout::from_config(&config);
        Self { config, layout }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// PLY property names of every record this converter writes.
    pub fn property_names(&self) -> Vec<String> {
        POSITION_PROPERTIES
            .iter()
            .chain(self.layout.property_names().iter())
            .map(|name| name.to_string())
            .collect()
    }

    fn parser<'a>(&self, rendering: Option<RenderingLookup<'a>>) -> FrameParser<'a> {
        let parser = FrameParser::new(&self.config.point_cloud_directory);
        match rendering {
            Some(lookup) => parser.with_rendering(lookup),
            None => parser,
        }
    }

    fn compose_sphere(&self, sphere: &Sphere) -> Result<Option<PointBuffer>, ConvertError> {
        let (Some(center), Some(radius)) = (sphere.center, sphere.radius) else {
            log::warn!(
                "Sphere '{}' is missing its center or radius, skipping",
                sphere.name
            );
            return Ok(None);
        };

        let points = sample_sphere(center, radius, self.config.sphere_density);
        let mut buffer = PointBuffer::new(self.layout);
        buffer.compose(
            &sphere.name,
            &points,
            &PointAttributes::from_appearance(&sphere.appearance),
        )?;
        Ok(Some(buffer))
    }

    fn compose_prism(&self, prism: &Prism) -> Result<Option<PointBuffer>, ConvertError> {
        let Some(corners) = prism.corners() else {
            log::warn!(
                "Prism '{}' has {} corners instead of 8, skipping",
                prism.name,
                prism.points.len()
            );
            return Ok(None);
        };

        let points = sample_prism(corners, self.config.prism_density);
        let mut buffer = PointBuffer::new(self.layout);
        buffer.compose(
            &prism.name,
            &points,
            &PointAttributes::from_appearance(&prism.appearance),
        )?;
        Ok(Some(buffer))
    }

    /// Load, subsample and place an external point cloud.
    /// Per-point material colours come from the columns after x, y, z.
    fn compose_point_cloud(
        &self,
        cloud: &PointCloudRef,
        point_cap: usize,
    ) -> Result<Option<PointBuffer>, ConvertError> {
        let (Some(center), Some(scale), Some(rotation)) = (cloud.center, cloud.scale, cloud.rotation)
        else {
            log::warn!(
                "Point cloud '{}' is missing its center, scale or rotation, skipping",
                cloud.name
            );
            return Ok(None);
        };

        let path = cloud.file_path();
        if !path.exists() {
            log::warn!("Point cloud file {} not found", path.display());
            return Ok(None);
        }

        let mut points = load_point_cloud(&path)?;
        subsample(&mut points, point_cap);
        transform_cloud(&mut points, center, scale, rotation);

        let mut attributes = PointAttributes::from_appearance(&cloud.appearance);
        attributes.material = Attribute::PerPoint(
            points
                .iter()
                .map(|point| {
                    let columns = point.attributes.len().min(4);
                    Color::from_components(&point.attributes[..columns])
                })
                .collect(),
        );

        let positions: Vec<_> = points.iter().map(|point| point.position).collect();
        let mut buffer = PointBuffer::new(self.layout);
        buffer.compose(&cloud.name, &positions, &attributes)?;
        Ok(Some(buffer))
    }

    /// Sample and compose every enabled actor, one buffer per actor name.
    /// Spheres come first, then prisms, then point clouds; actors sharing a
    /// name are merged in encounter order.
    pub fn compose_actors(
        &self,
        scene: &FrameScene,
    ) -> Result<Vec<(String, PointBuffer)>, ConvertError> {
        let mut actors: Vec<(String, PointBuffer)> = Vec::new();
        let mut add = |name: &str, buffer: Option<PointBuffer>| {
            let Some(buffer) = buffer else { return };
            match actors.iter_mut().find(|(existing, _)| existing == name) {
                Some((_, merged)) => merged.append(buffer),
                None => actors.push((name.to_string(), buffer)),
            }
        };

        if self.config.include_spheres {
            for sphere in &scene.spheres {
                add(&sphere.name, self.compose_sphere(sphere)?);
            }
        }

        if self.config.include_prisms {
            for prism in &scene.prisms {
                add(&prism.name, self.compose_prism(prism)?);
            }
        }

        if self.config.include_point_clouds {
            let point_cap = points_per_cloud(self.config.pcds_point_cap, scene.point_clouds.len());
            for cloud in &scene.point_clouds {
                add(&cloud.name, self.compose_point_cloud(cloud, point_cap)?);
            }
        }

        Ok(actors)
    }

    /// Every enabled actor of a scene in one buffer.
    pub fn compose_scene(&self, scene: &FrameScene) -> Result<PointBuffer, ConvertError> {
        let mut buffer = PointBuffer::new(self.layout);
        for (_, actor) in self.compose_actors(scene)? {
            buffer.append(actor);
        }
        Ok(buffer)
    }

    /// Convert one frame description to a PLY file. Returns the number of points written.
    pub fn convert_frame(
        &self,
        frame_path: &Path,
        output_path: &Path,
        rendering: Option<RenderingLookup<'_>>,
    ) -> Result<usize, ConvertError> {
        let scene = self.parser(rendering).parse_file(frame_path)?;
        let mut buffer = self.compose_scene(&scene)?;

        if self.config.normalize {
            normalize_positions(buffer.positions_mut());
        }

        write_ply(
            output_path,
            &buffer,
            self.config.float_precision,
            self.config.ply_format,
        )?;
        Ok(buffer.len())
    }

    /// Convert every selected frame of a participant in parallel.
    ///
    /// The rendering time series is built over all frames first. Frames are
    /// then filtered by the configured rate and written to
    /// `<output_dir>/frame_<N>.ply`. A failing frame is logged and counted;
    /// it never stops the others.
    pub fn convert_participant(
        &self,
        context: &ConversionContext,
        frames_dir: &Path,
        output_dir: &Path,
    ) -> Result<ConversionSummary, ConvertError> {
        let frames = discover_frames(frames_dir)?;
        let series = RenderingTimeSeries::build(&frames);

        let selected: Vec<(usize, &FrameFile)> = frames
            .iter()
            .filter(|frame| self.config.keeps_frame(frame.number))
            .filter_map(|frame| Some((series.frame_index(frame.number)?, frame)))
            .collect();

        log::info!(
            "Converting {} of {} frames for experiment '{}', participant '{}'",
            selected.len(),
            series.frame_count(),
            context.experiment,
            context.participant
        );

        fs::create_dir_all(output_dir)?;

        let pb = progress_bar(selected.len(), "frames", "Converting frames");
        let results: Vec<Result<usize, ConvertError>> = selected
            .par_iter()
            .map(|&(frame_index, frame)| {
                let lookup = RenderingLookup {
                    series: &series,
                    frame_index,
                    policy: self.config.missing_actor_policy,
                };
                let output_path = output_dir.join(format!("{}.{}", frame.stem(), PLY_EXTENSION));

                let result = self.convert_frame(&frame.path, &output_path, Some(lookup));
                if let Err(e) = &result {
                    log::error!(
                        "Experiment '{}', participant '{}', frame {}: {}",
                        context.experiment,
                        context.participant,
                        frame.number,
                        e
                    );
                }
                pb.inc(1);
                result
            })
            .collect();
        pb.finish_with_message("Frames converted");

        let summary = ConversionSummary {
            experiment: context.experiment.clone(),
            participant: context.participant.clone(),
            frames_discovered: series.frame_count(),
            frames_selected: selected.len(),
            frames_written: results.iter().filter(|result| result.is_ok()).count(),
            frames_failed: results.iter().filter(|result| result.is_err()).count(),
            points_written: results.iter().filter_map(|result| result.as_ref().ok()).sum(),
            property_names: self.property_names(),
        };

        let summary_path = output_dir.join(SUMMARY_FILE_NAME);
        fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
        log::info!(
            "Wrote {} frames ({} failed), summary saved to {}",
            summary.frames_written,
            summary.frames_failed,
            summary_path.display()
        );

        Ok(summary)
    }

    /// Convert a static actor description to one `<actor>.ply` per actor.
    /// Actors are normalized independently when normalization is enabled.
    /// Returns the number of files written; a failed save is logged and skipped.
    pub fn convert_static_actors(
        &self,
        static_actors_file: &Path,
        output_dir: &Path,
    ) -> Result<usize, ConvertError> {
        let scene = self.parser(None).parse_file(static_actors_file)?;
        let actors = self.compose_actors(&scene)?;
        log::info!(
            "Saving {} static actors from {}",
            actors.len(),
            static_actors_file.display()
        );

        let pb = progress_bar(actors.len(), "actors", "Saving static actors");
        let mut written = 0;
        for (name, mut buffer) in actors {
            if self.config.normalize && !buffer.is_empty() {
                normalize_positions(buffer.positions_mut());
            }

            let output_path = output_dir.join(format!("{}.{}", name, PLY_EXTENSION));
            match write_ply(
                &output_path,
                &buffer,
                self.config.float_precision,
                self.config.ply_format,
            ) {
                Ok(()) => written += 1,
                Err(e) => log::error!("Error saving '{}': {}", output_path.display(), e),
            }
            pb.inc(1);
        }
        pb.finish_with_message("Static actors saved");

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LightColorMode, MaterialColorMode};
    use std::path::PathBuf;

    fn converter(directory: PathBuf) -> SceneConverter {
        SceneConverter::new(ConversionConfig {
            material_color: MaterialColorMode::Rgb,
            light_color: LightColorMode::Intensity,
            sphere_density: 2.0,
            prism_density: 1.0,
            point_cloud_directory: directory,
            ..ConversionConfig::default()
        })
    }

    const SCENE: &str = "\
Ball (Sphere):
Center: 0 0 0
Radius: 1
Material Color: R=10 G=20 B=30
Rendered: Yes
Box (Rectangular Prism):
0 0 0
1 0 0
0 1 0
1 1 0
0 0 1
1 0 1
0 1 1
1 1 1
Broken (Rectangular Prism):
0 0 0
1 1 1
NoRadius (Sphere):
Center: 1 1 1
";

    #[test]
    fn actors_are_composed_in_kind_order() {
        let converter = converter(PathBuf::from("."));
        let scene = FrameParser::new(Path::new("."))
            .parse_lines(SCENE.lines())
            .unwrap();

        let actors = converter.compose_actors(&scene).unwrap();
        let names: Vec<&str> = actors.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Ball", "Box"]);
        // floor(2 * sqrt(4 * pi)) sphere samples, 4 per cube face.
        assert_eq!(actors[0].1.len(), 7);
        assert_eq!(actors[1].1.len(), 24);
        assert_eq!(actors[0].1.channels(0), &[10.0, 20.0, 30.0, 0.0, 1.0]);
    }

    #[test]
    fn excluded_kinds_are_skipped() {
        let mut converter = converter(PathBuf::from("."));
        converter.config.include_spheres = false;
        let scene = FrameParser::new(Path::new("."))
            .parse_lines(SCENE.lines())
            .unwrap();

        let buffer = converter.compose_scene(&scene).unwrap();
        assert_eq!(buffer.len(), 24);
    }

    #[test]
    fn point_cloud_uses_per_point_material() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Chair.txt"),
            "2\n0,0,0,255,0,0,255\n1,0,0,0,255,0\n",
        )
        .unwrap();

        let converter = converter(dir.path().to_path_buf());
        let scene = FrameParser::new(dir.path())
            .parse_lines(
                "Chair (Point Cloud):\nCenter: 0 0 0\nScale: 1 1 1\nRotation: 0 0 0\nLight Intensity: 3\n"
                    .lines(),
            )
            .unwrap();

        let buffer = converter.compose_scene(&scene).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.channels(0), &[255.0, 0.0, 0.0, 3.0, 1.0]);
        assert_eq!(buffer.channels(1), &[0.0, 255.0, 0.0, 3.0, 1.0]);
    }

    #[test]
    fn point_cap_is_shared_between_clouds() {
        let dir = tempfile::tempdir().unwrap();
        let rows = "5\n0,0,0\n1,0,0\n2,0,0\n3,0,0\n4,0,0\n";
        fs::write(dir.path().join("A.txt"), rows).unwrap();
        fs::write(dir.path().join("B.txt"), rows).unwrap();

        let mut converter = converter(dir.path().to_path_buf());
        converter.config.pcds_point_cap = 3;
        let scene = FrameParser::new(dir.path())
            .parse_lines(
                "A (Point Cloud):\nCenter: 0 0 0\nScale: 1 1 1\nRotation: 0 0 0\n\
                 B (Point Cloud):\nCenter: 0 0 0\nScale: 1 1 1\nRotation: 0 0 0\n"
                    .lines(),
            )
            .unwrap();

        // floor(3 / 2) points per cloud.
        let actors = converter.compose_actors(&scene).unwrap();
        assert_eq!(actors.len(), 2);
        assert!(actors.iter().all(|(_, buffer)| buffer.len() == 1));

        let again = converter.compose_scene(&scene).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(converter.compose_scene(&scene).unwrap(), again);
    }

    #[test]
    fn missing_point_cloud_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let converter = converter(dir.path().to_path_buf());
        let scene = FrameParser::new(dir.path())
            .parse_lines("Ghost (Point Cloud):\nCenter: 0 0 0\nScale: 1 1 1\nRotation: 0 0 0\n".lines())
            .unwrap();

        assert!(converter.compose_scene(&scene).unwrap().is_empty());
    }

    #[test]
    fn property_names_include_positions() {
        let converter = converter(PathBuf::from("."));
        assert_eq!(
            converter.property_names(),
            vec!["x", "y", "z", "red", "green", "blue", "light_intensity", "rendered"]
        );
    }
}
