/// Temporal rendering-state tracking across the frames of one participant.
///
/// Each dynamic actor's binary `Rendered:` flag becomes an integer weight that
/// grows by one per visible frame and halves (rounding down) per hidden frame.
use crate::error::ParseError;
use crate::frames::FrameFile;
use crate::parser::{AttributeLine, LineKind, classify_line};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Decayed weight series for a flag sequence.
pub fn decay_weights(flags: &[bool]) -> Vec<u32> {
    let mut weights = Vec::with_capacity(flags.len());
    let mut previous = 0u32;

    for &rendered in flags {
        previous = if rendered {
            previous.saturating_add(1)
        } else {
            previous / 2
        };
        weights.push(previous);
    }

    weights
}

/// Rendered flag of every actor in one frame.
/// Only the first `Rendered:` line after an actor header counts.
pub fn rendering_flags_from_lines<I, S>(lines: I) -> HashMap<String, bool>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut flags = HashMap::new();
    let mut current_actor: Option<String> = None;

    for line in lines {
        match classify_line(line.as_ref()) {
            LineKind::Header { name, .. } => current_actor = Some(name),
            LineKind::Attribute(AttributeLine::Rendered(flag)) => {
                if let Some(actor) = current_actor.take() {
                    flags.insert(actor, flag != 0);
                }
            }
            _ => {}
        }
    }

    flags
}

/// Read the rendered flags of one frame file.
pub fn read_rendering_flags(path: &Path) -> Result<HashMap<String, bool>, ParseError> {
    let io_error = |source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_error)?);
    let lines = reader.lines().collect::<Result<Vec<_>, _>>().map_err(io_error)?;

    Ok(rendering_flags_from_lines(lines))
}

/// Per-actor decayed rendering weights, one per frame, in ascending frame order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderingTimeSeries {
    frame_numbers: Vec<u64>,
    weights: BTreeMap<String, Vec<u32>>,
}

impl RenderingTimeSeries {
    /// Scan every frame of a participant. Frames must already be ordered.
    /// An actor missing from a frame counts as not rendered in that frame,
    /// and so does every actor of a frame that cannot be read.
    pub fn build(frames: &[FrameFile]) -> Self {
        let per_frame: Vec<HashMap<String, bool>> = frames
            .par_iter()
            .map(|frame| {
                read_rendering_flags(&frame.path).unwrap_or_else(|e| {
                    log::warn!("Frame {} treated as fully hidden: {}", frame.number, e);
                    HashMap::new()
                })
            })
            .collect();

        let frame_numbers = frames.iter().map(|frame| frame.number).collect();
        Self::from_frame_flags(frame_numbers, &per_frame)
    }

    /// Assemble from per-frame flag dictionaries aligned with `frame_numbers`.
    pub fn from_frame_flags(frame_numbers: Vec<u64>, per_frame: &[HashMap<String, bool>]) -> Self {
        let mut flags: BTreeMap<String, Vec<bool>> = BTreeMap::new();

        for (index, frame) in per_frame.iter().enumerate() {
            for (actor, &rendered) in frame {
                let series = flags
                    .entry(actor.clone())
                    .or_insert_with(|| vec![false; per_frame.len()]);
                series[index] = rendered;
            }
        }

        let weights = flags
            .into_iter()
            .map(|(actor, series)| (actor, decay_weights(&series)))
            .collect();

        Self {
            frame_numbers,
            weights,
        }
    }

    /// Weight of an actor at a 1-based frame index.
    pub fn weight(&self, actor: &str, frame_index: usize) -> Option<u32> {
        let index = frame_index.checked_sub(1)?;
        self.weights.get(actor)?.get(index).copied()
    }

    pub fn series(&self, actor: &str) -> Option<&[u32]> {
        self.weights.get(actor).map(Vec::as_slice)
    }

    /// 1-based index of a frame number within the ordered frame list.
    pub fn frame_index(&self, frame_number: u64) -> Option<usize> {
        self.frame_numbers
            .binary_search(&frame_number)
            .ok()
            .map(|index| index + 1)
    }

    pub fn frame_count(&self) -> usize {
        self.frame_numbers.len()
    }
}
