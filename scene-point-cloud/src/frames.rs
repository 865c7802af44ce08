/// Discovery of `frame_<N>.txt` description files.
use constants::scene_grammar::{FRAME_FILE_EXTENSION, FRAME_FILE_PREFIX};
use std::fs;
use std::path::{Path, PathBuf};

/// A frame description file and its embedded frame number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFile {
    pub number: u64,
    pub path: PathBuf,
}

impl FrameFile {
    /// File stem without extension, e.g. `frame_120`.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// Frame number embedded in a `frame_<N>.txt` file name.
pub fn frame_number(path: &Path) -> Option<u64> {
    let extension = path.extension()?.to_string_lossy().to_lowercase();
    if extension != FRAME_FILE_EXTENSION {
        return None;
    }

    path.file_stem()?
        .to_str()?
        .strip_prefix(FRAME_FILE_PREFIX)?
        .parse()
        .ok()
}

/// Scans a directory for frame files, ordered by ascending frame number.
/// Entries that do not follow the naming scheme are skipped.
pub fn discover_frames(frames_dir: &Path) -> std::io::Result<Vec<FrameFile>> {
    let mut frames = Vec::new();

    for entry in fs::read_dir(frames_dir)? {
        let path = entry?.path();

        if path.is_file() {
            if let Some(number) = frame_number(&path) {
                frames.push(FrameFile { number, path });
            }
        }
    }

    frames.sort_by_key(|frame| frame.number);
    log::debug!(
        "Found {} frame files in {}",
        frames.len(),
        frames_dir.display()
    );

    Ok(frames)
}
