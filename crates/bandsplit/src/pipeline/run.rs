use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader, RgbImage};

use super::WrittenSlice;
use crate::config::SplitConfig;
use crate::error::{Result, SplitError};
use crate::persist::{OutputFormat, PersistenceGuard};
use crate::plan::{build_plan, CutPlan};

/// A decoded input image and what is known about its container.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub image: RgbImage,
    /// Container format detected from the file contents.
    pub container: Option<ImageFormat>,
}

impl LoadedImage {
    /// Wrap an in-memory image that will be written as if loaded from `path`.
    pub fn from_image(path: impl Into<PathBuf>, image: RgbImage) -> Self {
        let path = path.into();
        let container = ImageFormat::from_path(&path).ok();
        Self {
            path,
            image,
            container,
        }
    }

    /// Writable format of the input container, if any.
    pub fn original_format(&self) -> Option<OutputFormat> {
        self.container.and_then(OutputFormat::from_image_format)
    }
}

/// Open `path` with the format sniffed from its contents and the decoder's
/// allocation limits lifted.
pub(crate) fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>> {
    let io_err = |source| SplitError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?;
    reader.no_limits();
    Ok(reader)
}

/// Open and decode `path`, normalizing to 8-bit RGB.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let reader = open_reader(path)?;
    let container = reader.format();
    let decoded = reader.decode().map_err(|e| SplitError::decode(path, e))?;
    tracing::info!(
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        format = ?container,
        "image loaded"
    );
    Ok(LoadedImage {
        path: path.to_path_buf(),
        image: decoded.into_rgb8(),
        container,
    })
}

/// Resolve the background reference and compute the cut plan.
pub(crate) fn plan_image(image: &RgbImage, config: &SplitConfig) -> Result<CutPlan> {
    let reference = config.background.resolve(image, config.corner_probe_px)?;
    build_plan(image, reference, config)
}

/// Output path of slice `index` (1-based): `<dir>/<stem>.<index>.<ext>`.
pub fn slice_path(input: &Path, index: usize, extension: Option<&str>) -> PathBuf {
    let mut name = input.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!(".{}", index));
    if let Some(ext) = extension {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

/// Formats and extension used for the slices of `loaded`.
///
/// An explicit output format wins. Otherwise slices keep the input's
/// container and extension, or become PNG when the container cannot be
/// written.
fn output_target(
    loaded: &LoadedImage,
    config: &SplitConfig,
) -> (OutputFormat, OutputFormat, Option<String>) {
    let original = loaded.original_format();
    match (config.output_format, original) {
        (Some(preferred), _) => (
            preferred,
            original.unwrap_or(preferred),
            Some(preferred.extension().to_string()),
        ),
        (None, Some(original)) => {
            let ext = loaded
                .path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| original.extension().to_string());
            (original, original, Some(ext))
        }
        (None, None) => (
            OutputFormat::Png,
            OutputFormat::Png,
            Some(OutputFormat::Png.extension().to_string()),
        ),
    }
}

/// Crop every span of `plan` and hand it to the persistence guard, in order.
///
/// Stops at the first failure; slices already written stay on disk.
pub(crate) fn write_slices(
    loaded: &LoadedImage,
    plan: &CutPlan,
    config: &SplitConfig,
    guard: &PersistenceGuard,
) -> Result<Vec<WrittenSlice>> {
    let (preferred, original, ext) = output_target(loaded, config);
    let (w, h) = loaded.image.dimensions();
    let mut written = Vec::with_capacity(plan.spans.len());

    for (k, (span, (x, y, cw, ch))) in plan.spans.iter().zip(plan.crop_boxes()).enumerate() {
        let index = k + 1;
        if cw == 0 || ch == 0 || x + cw > w || y + ch > h {
            return Err(SplitError::Geometry {
                start: span.start as i64,
                end: span.end as i64,
                limit: plan.primary_len() as i64,
            });
        }
        let slice = image::imageops::crop_imm(&loaded.image, x, y, cw, ch).to_image();
        let path = slice_path(&loaded.path, index, ext.as_deref());
        let saved = guard.save(&slice, &path, preferred, original)?;
        tracing::info!(
            index,
            path = %saved.path.display(),
            width = cw,
            height = ch,
            "slice written"
        );
        written.push(WrittenSlice::new(index, *span, saved));
    }

    Ok(written)
}
