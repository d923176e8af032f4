use std::path::PathBuf;

use crate::color::BackgroundReference;
use crate::persist::{OutputFormat, Quality, SavedSlice};
use crate::plan::{CutPlan, CutSpan, TailOutcome};
use crate::scan::Orientation;

/// One slice written to disk.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WrittenSlice {
    /// 1-based position in the output sequence.
    pub index: usize,
    pub path: PathBuf,
    pub format: OutputFormat,
    pub quality: Quality,
    /// Span of the source image this slice was cropped from.
    pub span: CutSpan,
    /// Written dimensions; smaller than the crop when the save ladder
    /// had to downscale.
    pub width: u32,
    pub height: u32,
    /// Save attempts that failed before this slice was written.
    pub failed_attempts: usize,
}

impl WrittenSlice {
    pub(crate) fn new(index: usize, span: CutSpan, saved: SavedSlice) -> Self {
        Self {
            index,
            path: saved.path,
            format: saved.format,
            quality: saved.quality,
            span,
            width: saved.width,
            height: saved.height,
            failed_attempts: saved.failures.len(),
        }
    }
}

/// Summary of one split run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SplitReport {
    pub input: PathBuf,
    /// Image dimensions [width, height].
    pub image_size: [u32; 2],
    pub orientation: Orientation,
    pub unit_size: i64,
    pub reference: BackgroundReference,
    pub tail: TailOutcome,
    pub slices: Vec<WrittenSlice>,
}

impl SplitReport {
    pub(crate) fn new(input: PathBuf, plan: &CutPlan, slices: Vec<WrittenSlice>) -> Self {
        Self {
            input,
            image_size: [plan.width, plan.height],
            orientation: plan.orientation,
            unit_size: plan.unit_size,
            reference: plan.reference,
            tail: plan.tail,
            slices,
        }
    }

    pub fn slice_paths(&self) -> impl Iterator<Item = &std::path::Path> {
        self.slices.iter().map(|s| s.path.as_path())
    }
}
