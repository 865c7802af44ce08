/// Scene frame to PLY converter main entry point
use scene_point_cloud::{ConversionConfig, ConversionContext, SceneConverter};
use std::env;
use std::path::Path;

const STATIC_OUTPUT_DIR: &str = "StaticPCDs";

/// Name of the path component `levels` directories above `path`.
fn ancestor_name(path: &Path, levels: usize) -> String {
    path.ancestors()
        .nth(levels)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: {} <frames_dir> <output_dir> [config.json]", args[0]);
        std::process::exit(1);
    }

    let frames_dir = Path::new(&args[1]);
    let output_dir = Path::new(&args[2]);
    let config = match args.get(3) {
        Some(path) => ConversionConfig::from_json_file(Path::new(path))?,
        None => ConversionConfig::default(),
    };

    // Frames live under <experiment>/<participant>/<frames_dir>.
    let frames_dir = frames_dir.canonicalize()?;
    let context = ConversionContext::new(ancestor_name(&frames_dir, 2), ancestor_name(&frames_dir, 1));

    let converter = SceneConverter::new(config);

    if let Some(static_actors_file) = converter.config().static_actors_file.clone() {
        let written = converter
            .convert_static_actors(&static_actors_file, &output_dir.join(STATIC_OUTPUT_DIR))?;
        log::info!("Saved {} static actor point clouds", written);
    }

    let summary = converter.convert_participant(&context, &frames_dir, output_dir)?;

    log::info!(
        "Conversion complete: {} frames, {} points",
        summary.frames_written,
        summary.points_written
    );
    if summary.frames_failed > 0 {
        log::warn!("{} frames failed to convert", summary.frames_failed);
    }

    Ok(())
}
