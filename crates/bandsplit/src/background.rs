//! Background reference estimation.
//!
//! Two estimators are available: averaging the four corner squares of the
//! image, and picking the most frequent color on a coarse sample grid. The
//! [`BackgroundPolicy`] decides which one runs (or whether an explicit color
//! is used instead).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use image::RgbImage;

use crate::color::{BackgroundReference, Color};
use crate::error::{Result, SplitError};

/// Number of grid steps per axis used by [`estimate_dominant`].
const DOMINANT_GRID_STEPS: u32 = 100;

/// How the background reference of a run is chosen.
///
/// Serialized as the same token accepted on the command line
/// (`white`, `black`, `blackorwhite`, `dominant`, `fuzzy`, `#RRGGBB`, `auto`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackgroundPolicy {
    /// Use exactly this color.
    Explicit(Color),
    /// Compare each pixel with whichever of black/white is closer.
    BlackOrWhite,
    /// Most frequent color on a coarse grid.
    Dominant,
    /// Dominant color plus fuzzy matching (white and black also accepted).
    Fuzzy,
    /// Mean of the four corner squares.
    #[default]
    AutoSample,
}

impl BackgroundPolicy {
    /// Returns `true` when the policy turns on fuzzy matching.
    pub fn implies_fuzzy(self) -> bool {
        matches!(self, Self::Fuzzy)
    }

    /// Resolve the policy to the reference used for scanning.
    pub fn resolve(self, image: &RgbImage, corner_probe_px: u32) -> Result<BackgroundReference> {
        let reference = match self {
            Self::Explicit(c) => BackgroundReference::Concrete(c),
            Self::BlackOrWhite => BackgroundReference::BlackOrWhite,
            Self::Dominant | Self::Fuzzy => BackgroundReference::Concrete(estimate_dominant(image)),
            Self::AutoSample => {
                BackgroundReference::Concrete(estimate_by_corners(image, corner_probe_px)?)
            }
        };
        tracing::info!(policy = %self, %reference, "background reference resolved");
        Ok(reference)
    }
}

impl fmt::Display for BackgroundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(c) if *c == Color::WHITE => f.write_str("white"),
            Self::Explicit(c) if *c == Color::BLACK => f.write_str("black"),
            Self::Explicit(c) => write!(f, "{}", c),
            Self::BlackOrWhite => f.write_str("blackorwhite"),
            Self::Dominant => f.write_str("dominant"),
            Self::Fuzzy => f.write_str("fuzzy"),
            Self::AutoSample => f.write_str("auto"),
        }
    }
}

impl FromStr for BackgroundPolicy {
    type Err = SplitError;

    fn from_str(token: &str) -> Result<Self> {
        let token = token.trim();
        match token.to_ascii_lowercase().as_str() {
            "white" => Ok(Self::Explicit(Color::WHITE)),
            "black" => Ok(Self::Explicit(Color::BLACK)),
            "blackorwhite" => Ok(Self::BlackOrWhite),
            "dominant" => Ok(Self::Dominant),
            "fuzzy" => Ok(Self::Fuzzy),
            "auto" => Ok(Self::AutoSample),
            _ if token.starts_with('#') => Color::from_hex(token)
                .map(Self::Explicit)
                .ok_or_else(|| SplitError::config(format!("invalid color token '{}'", token))),
            _ => Err(SplitError::config(format!(
                "unknown background color '{}' (expected white, black, blackorwhite, \
                 dominant, fuzzy, auto or #RRGGBB)",
                token
            ))),
        }
    }
}

impl TryFrom<String> for BackgroundPolicy {
    type Error = SplitError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BackgroundPolicy> for String {
    fn from(policy: BackgroundPolicy) -> Self {
        policy.to_string()
    }
}

/// Mean color of the four `probe x probe` corner squares.
///
/// Fails when the squares would overlap or leave the image
/// (`2 * probe > min(width, height)`) or when `probe` is zero.
pub fn estimate_by_corners(image: &RgbImage, probe: u32) -> Result<Color> {
    let (w, h) = image.dimensions();
    if probe == 0 || probe.saturating_mul(2) > w.min(h) {
        return Err(SplitError::ProbeExceedsImage {
            probe,
            width: w,
            height: h,
        });
    }

    let origins = [(0, 0), (w - probe, 0), (0, h - probe), (w - probe, h - probe)];
    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for (x0, y0) in origins {
        for x in x0..x0 + probe {
            for y in y0..y0 + probe {
                let p = image.get_pixel(x, y);
                sum[0] += p[0] as u64;
                sum[1] += p[1] as u64;
                sum[2] += p[2] as u64;
                count += 1;
            }
        }
    }

    Ok(Color::new(
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
    ))
}

/// Most frequent color on a grid of roughly 100x100 samples.
///
/// Ties go to the color that reached the winning count first.
pub fn estimate_dominant(image: &RgbImage) -> Color {
    let (w, h) = image.dimensions();
    let step_x = (w / DOMINANT_GRID_STEPS).max(1) as usize;
    let step_y = (h / DOMINANT_GRID_STEPS).max(1) as usize;

    let mut counts: HashMap<Color, u32> = HashMap::new();
    let mut best = (Color::WHITE, 0u32);
    for x in (0..w).step_by(step_x) {
        for y in (0..h).step_by(step_y) {
            let color = Color::from(image.get_pixel(x, y));
            let n = counts.entry(color).or_insert(0);
            *n += 1;
            if *n > best.1 {
                best = (color, *n);
            }
        }
    }

    tracing::debug!(
        distinct = counts.len(),
        color = %best.0,
        count = best.1,
        "dominant color sampled"
    );
    best.0
}
