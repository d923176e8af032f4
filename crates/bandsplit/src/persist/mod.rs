//! Persistence Guard: writes one image through an ordered ladder of save
//! strategies until one succeeds.
//!
//! Every attempt encodes into memory first and only then writes the file, so
//! a failed encode never leaves a partial file behind. Failures are logged and
//! collected; only running out of attempts is an error.

mod codec;

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::{Result, SplitError};

pub use codec::{encode, fit_to_limits, CodecLimits, OutputFormat};

/// Encoder quality setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Lossy quality in `1..=100` (JPEG only; other formats ignore it).
    Lossy(u8),
    /// Best lossless setting the format offers (JPEG: quality 100).
    Lossless,
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lossy(q) => write!(f, "q{}", q),
            Self::Lossless => f.write_str("lossless"),
        }
    }
}

/// Which format an attempt encodes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatChoice {
    /// The requested output format.
    Preferred,
    /// The input's container format.
    Original,
    /// Always this format.
    Fixed(OutputFormat),
}

/// One rung of the save ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SaveAttempt {
    pub format: FormatChoice,
    pub quality: Quality,
    /// Downscale to the format's [`CodecLimits`] before encoding.
    #[serde(default)]
    pub fit_limits: bool,
    /// Replace the target's extension with the format's canonical one.
    #[serde(default)]
    pub retarget_extension: bool,
}

impl SaveAttempt {
    pub const fn new(format: FormatChoice, quality: Quality) -> Self {
        Self {
            format,
            quality,
            fit_limits: false,
            retarget_extension: false,
        }
    }

    pub const fn fitted(mut self) -> Self {
        self.fit_limits = true;
        self
    }

    pub const fn retargeted(mut self) -> Self {
        self.retarget_extension = true;
        self
    }
}

/// Ordered save ladder.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    pub attempts: Vec<SaveAttempt>,
}

impl Default for PersistConfig {
    fn default() -> Self {
        use FormatChoice::*;
        Self {
            attempts: vec![
                SaveAttempt::new(Preferred, Quality::Lossy(90)),
                SaveAttempt::new(Preferred, Quality::Lossy(80)).fitted(),
                SaveAttempt::new(Preferred, Quality::Lossy(70)).fitted(),
                SaveAttempt::new(Preferred, Quality::Lossless).fitted(),
                SaveAttempt::new(Original, Quality::Lossy(60)),
                SaveAttempt::new(Fixed(OutputFormat::Png), Quality::Lossless).retargeted(),
            ],
        }
    }
}

impl PersistConfig {
    /// Same ladder with the first attempt's quality replaced.
    pub fn with_primary_quality(mut self, quality: Quality) -> Self {
        if let Some(first) = self.attempts.first_mut() {
            first.quality = quality;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.attempts.is_empty() {
            return Err(SplitError::config("persist.attempts must not be empty"));
        }
        for (i, a) in self.attempts.iter().enumerate() {
            if let Quality::Lossy(q) = a.quality {
                if !(1..=100).contains(&q) {
                    return Err(SplitError::config(format!(
                        "persist.attempts[{}]: quality must be within 1..=100, got {}",
                        i, q
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A failed rung of the ladder.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttemptFailure {
    /// 1-based position in the ladder.
    pub attempt: usize,
    pub format: OutputFormat,
    pub quality: Quality,
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SavedSlice {
    /// Path actually written (may differ from the request in its extension).
    pub path: PathBuf,
    pub format: OutputFormat,
    pub quality: Quality,
    /// Written dimensions (smaller than the input when downscaled).
    pub width: u32,
    pub height: u32,
    /// 1-based ladder position that succeeded.
    pub attempt: usize,
    /// Attempts that failed before the successful one.
    pub failures: Vec<AttemptFailure>,
}

impl SavedSlice {
    pub fn downscaled_from(&self, width: u32, height: u32) -> bool {
        (self.width, self.height) != (width, height)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("no save attempts configured for {}", path.display())]
    NoAttempts { path: PathBuf },

    #[error(
        "all {} save attempts failed for {}{}",
        failures.len(),
        path.display(),
        last_reason(failures)
    )]
    Exhausted {
        path: PathBuf,
        failures: Vec<AttemptFailure>,
    },
}

fn last_reason(failures: &[AttemptFailure]) -> String {
    failures
        .last()
        .map(|f| format!(" (last: {})", f.reason))
        .unwrap_or_default()
}

/// Writes images through the configured save ladder.
#[derive(Debug, Clone, Default)]
pub struct PersistenceGuard {
    config: PersistConfig,
}

impl PersistenceGuard {
    pub fn new(config: PersistConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PersistConfig {
        &self.config
    }

    /// Save `image` to `path`.
    ///
    /// `preferred` is the requested format; `original` is the format of the
    /// input the image came from.
    pub fn save(
        &self,
        image: &RgbImage,
        path: &Path,
        preferred: OutputFormat,
        original: OutputFormat,
    ) -> std::result::Result<SavedSlice, PersistError> {
        if self.config.attempts.is_empty() {
            return Err(PersistError::NoAttempts {
                path: path.to_path_buf(),
            });
        }

        let mut failures = Vec::new();
        for (i, attempt) in self.config.attempts.iter().enumerate() {
            let format = match attempt.format {
                FormatChoice::Preferred => preferred,
                FormatChoice::Original => original,
                FormatChoice::Fixed(f) => f,
            };
            let target = if attempt.retarget_extension {
                path.with_extension(format.extension())
            } else {
                path.to_path_buf()
            };

            let fitted = if attempt.fit_limits {
                fit_to_limits(image, format.limits())
            } else {
                std::borrow::Cow::Borrowed(image)
            };

            let outcome = encode(&fitted, format, attempt.quality)
                .map_err(|e| format!("encode {}: {}", format, e))
                .and_then(|bytes| {
                    std::fs::write(&target, bytes)
                        .map_err(|e| format!("write {}: {}", target.display(), e))
                });

            match outcome {
                Ok(()) => {
                    let (width, height) = fitted.dimensions();
                    tracing::debug!(
                        path = %target.display(),
                        %format,
                        quality = %attempt.quality,
                        attempt = i + 1,
                        "slice saved"
                    );
                    return Ok(SavedSlice {
                        path: target,
                        format,
                        quality: attempt.quality,
                        width,
                        height,
                        attempt: i + 1,
                        failures,
                    });
                }
                Err(reason) => {
                    tracing::warn!(
                        path = %target.display(),
                        %format,
                        quality = %attempt.quality,
                        attempt = i + 1,
                        %reason,
                        "save attempt failed"
                    );
                    failures.push(AttemptFailure {
                        attempt: i + 1,
                        format,
                        quality: attempt.quality,
                        path: target,
                        reason,
                    });
                }
            }
        }

        Err(PersistError::Exhausted {
            path: path.to_path_buf(),
            failures,
        })
    }
}
