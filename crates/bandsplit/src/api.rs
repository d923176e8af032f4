//! High-level split API.
//!
//! [`Splitter`] is the primary entry point. It wraps a validated
//! [`SplitConfig`] and a [`PersistenceGuard`] built from it.
//! Create once, split many files.

use std::path::Path;

use image::RgbImage;

use crate::config::SplitConfig;
use crate::error::Result;
use crate::persist::PersistenceGuard;
use crate::pipeline::{self, LoadedImage, SplitReport};
use crate::plan::CutPlan;

/// Primary split interface.
///
/// # Examples
///
/// ```no_run
/// use bandsplit::{SplitConfig, Splitter};
/// use std::path::Path;
///
/// let splitter = Splitter::with_config(SplitConfig::with_units(3)).unwrap();
/// let report = splitter.split_file(Path::new("scan.png")).unwrap();
/// for slice in &report.slices {
///     println!("{} -> {}", slice.index, slice.path.display());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Splitter {
    config: SplitConfig,
    guard: PersistenceGuard,
}

impl Splitter {
    /// Splitter producing `units` slices with default settings.
    pub fn new(units: u32) -> Result<Self> {
        Self::with_config(SplitConfig::with_units(units))
    }

    /// Validate `config` and build a splitter from it.
    pub fn with_config(config: SplitConfig) -> Result<Self> {
        config.validate()?;
        let guard = PersistenceGuard::new(config.persist.clone());
        Ok(Self { config, guard })
    }

    /// Load configuration from JSON and build a splitter in one step.
    pub fn from_config_json_file(path: &Path) -> Result<Self> {
        Self::with_config(SplitConfig::from_json_file(path)?)
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn guard(&self) -> &PersistenceGuard {
        &self.guard
    }

    /// Cut plan for an in-memory image. Nothing is written.
    pub fn plan(&self, image: &RgbImage) -> Result<CutPlan> {
        pipeline::plan_image(image, &self.config)
    }

    /// Load `path` and return its cut plan without writing anything.
    pub fn plan_file(&self, path: &Path) -> Result<CutPlan> {
        let loaded = pipeline::load_image(path)?;
        self.plan(&loaded.image)
    }

    /// Split the image at `path`; slices are written next to it.
    pub fn split_file(&self, path: &Path) -> Result<SplitReport> {
        let loaded = pipeline::load_image(path)?;
        self.split_loaded(&loaded)
    }

    /// Split an already decoded image. Slice names derive from `loaded.path`.
    pub fn split_loaded(&self, loaded: &LoadedImage) -> Result<SplitReport> {
        let plan = self.plan(&loaded.image)?;
        let slices = pipeline::write_slices(loaded, &plan, &self.config, &self.guard)?;
        tracing::info!(
            input = %loaded.path.display(),
            slices = slices.len(),
            "split complete"
        );
        Ok(SplitReport::new(loaded.path.clone(), &plan, slices))
    }
}
