//! Split pipeline: load → resolve background → plan → crop → persist.
//!
//! Scanning and planning live in `crate::scan` and `crate::plan`; this layer
//! owns file I/O, slice naming and the order in which slices are written.

mod result;
mod run;

pub use result::{SplitReport, WrittenSlice};
pub use run::{load_image, slice_path, LoadedImage};

pub(crate) use run::{open_reader, plan_image, write_slices};
