//! Error types shared by every stage of a split run.

use std::path::PathBuf;

use crate::persist::PersistError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SplitError>;

/// Fatal conditions that abort a split, merge, or size query.
///
/// Band-not-found is not an error: it is an `Option` at the locator level and
/// always recovered by the proportional fallback cut.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// Invalid configuration value (CLI flag, JSON file, or programmatic).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Input image could not be opened or decoded.
    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Filesystem error outside of slice encoding.
    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Corner probe squares do not fit inside the image.
    #[error(
        "corner probe of {probe}px does not fit a {width}x{height} image \
         (needs 2*probe <= min side)"
    )]
    ProbeExceedsImage { probe: u32, width: u32, height: u32 },

    /// Primary dimension is at or below the configured minimum size.
    #[error("primary dimension {primary}px is not above the size threshold {threshold}px")]
    BelowSizeThreshold { primary: u32, threshold: u32 },

    /// Computed crop box is empty or leaves the image.
    #[error("degenerate crop [{start}, {end}) on an axis of length {limit}")]
    Geometry { start: i64, end: i64, limit: i64 },

    /// Every persistence strategy failed for one slice.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl SplitError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` when the error was raised before the input was touched.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = SplitError::BelowSizeThreshold {
            primary: 100,
            threshold: 120,
        };
        let msg = err.to_string();
        assert!(msg.contains("100px"));
        assert!(msg.contains("120px"));

        let err = SplitError::Geometry {
            start: 40,
            end: 40,
            limit: 300,
        };
        assert!(err.to_string().contains("[40, 40)"));
    }

    #[test]
    fn config_errors_are_flagged() {
        assert!(SplitError::config("units must be >= 2").is_config());
        assert!(!SplitError::ProbeExceedsImage {
            probe: 10,
            width: 5,
            height: 5
        }
        .is_config());
    }
}
