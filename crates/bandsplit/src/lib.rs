//! bandsplit: split large raster images along near-uniform background bands.
//!
//! Long scans and stitched screenshots usually have strips of plain
//! background between their logical pages. This crate finds such strips
//! near evenly spaced positions and cuts there, so every slice ends on
//! background instead of through content.
//!
//! The stages are:
//!
//! 1. **Background** – resolve the reference color (explicit, corner sample,
//!    dominant color, or black-or-white).
//! 2. **Scan** – classify fixed-thickness bands as uniform background, with a
//!    per-line noise allowance and a per-pixel color tolerance.
//! 3. **Plan** – choose orientation and unit size, locate one band per unit
//!    boundary, fall back to proportional cuts, apply the tail policy.
//! 4. **Persist** – crop each span and save it through an ordered ladder of
//!    format and quality fallbacks.
//!
//! # Public API
//! - [`Splitter`] as the primary entry point
//! - [`SplitConfig`] for tuning, loadable from JSON
//! - [`merge_files`] / [`image_size`] companions
//! - scanning primitives for callers that plan cuts themselves

mod api;
mod background;
mod color;
mod config;
mod error;
mod merge;
mod persist;
mod pipeline;
mod plan;
mod scan;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::Splitter;
pub use background::{estimate_by_corners, estimate_dominant, BackgroundPolicy};
pub use color::{color_distance, is_exact_background, BackgroundReference, Color};
pub use config::{
    ScanConfig, SplitConfig, TailConfig, DEFAULT_CORNER_PROBE_PX, DEFAULT_SCAN_WIDER_FACTOR,
};
pub use error::{Result, SplitError};
pub use merge::{image_size, merge_files, stack_vertically, MERGE_QUALITY};
pub use persist::{
    AttemptFailure, CodecLimits, FormatChoice, OutputFormat, PersistConfig, PersistError,
    PersistenceGuard, Quality, SaveAttempt, SavedSlice,
};
pub use pipeline::{load_image, slice_path, LoadedImage, SplitReport, WrittenSlice};
pub use plan::{build_plan, span_stddev, CutPlan, CutSource, CutSpan, TailOutcome};
pub use scan::{locate_band, scan_band, BandScan, CutPoint, Orientation};
