//! Vertical merge of images and dimension queries.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::{Result, SplitError};
use crate::persist::{OutputFormat, PersistenceGuard, Quality, SavedSlice};
use crate::pipeline::open_reader;

/// Quality of the first save attempt of a merged image.
pub const MERGE_QUALITY: u8 = 95;

/// Stack `images` top to bottom on a white canvas as wide as the widest one.
pub fn stack_vertically(images: &[RgbImage]) -> RgbImage {
    let width = images.iter().map(|im| im.width()).max().unwrap_or(0);
    let height = images.iter().map(|im| im.height()).sum();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let mut y = 0i64;
    for im in images {
        image::imageops::replace(&mut canvas, im, 0, y);
        y += im.height() as i64;
    }
    canvas
}

/// Load `inputs`, stack them and save the result to `output`.
///
/// The output format follows the extension of `output`.
pub fn merge_files<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    guard: &PersistenceGuard,
) -> Result<SavedSlice> {
    if inputs.is_empty() {
        return Err(SplitError::config("merge needs at least one input image"));
    }
    let format = OutputFormat::from_path(output).ok_or_else(|| {
        SplitError::config(format!(
            "cannot infer an output format from {}",
            output.display()
        ))
    })?;

    let mut images = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = input.as_ref();
        let img = open_reader(path)?
            .decode()
            .map_err(|e| SplitError::decode(path, e))?;
        tracing::debug!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "merge input"
        );
        images.push(img.into_rgb8());
    }

    let merged = stack_vertically(&images);
    tracing::info!(
        inputs = images.len(),
        width = merged.width(),
        height = merged.height(),
        output = %output.display(),
        "merging"
    );

    let guard = PersistenceGuard::new(
        guard
            .config()
            .clone()
            .with_primary_quality(Quality::Lossy(MERGE_QUALITY)),
    );
    Ok(guard.save(&merged, output, format, format)?)
}

/// Dimensions of the image at `path`, read from its header.
pub fn image_size(path: &Path) -> Result<(u32, u32)> {
    image::image_dimensions(path).map_err(|e| SplitError::decode(path, e))
}
