//! Band scanning: classifying fixed-thickness strips against the background
//! reference and walking the image to find the first uniform one.

mod band;
mod locate;

pub use band::{scan_band, BandScan};
pub use locate::{locate_band, CutPoint};

/// Axis along which an image is cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Wide image: vertical bands, cut coordinates are x positions.
    Horizontal,
    /// Tall image: horizontal bands, cut coordinates are y positions.
    Vertical,
}

impl Orientation {
    /// Horizontal when the image is wider than tall or when forced.
    pub fn choose(width: u32, height: u32, split_vertically: bool) -> Self {
        if width > height || split_vertically {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    /// Length of the axis cuts are placed on.
    #[inline]
    pub fn primary_len(self, width: u32, height: u32) -> u32 {
        match self {
            Self::Horizontal => width,
            Self::Vertical => height,
        }
    }

    /// Length of a scanned line (the axis a band spans completely).
    #[inline]
    pub fn cross_len(self, width: u32, height: u32) -> u32 {
        match self {
            Self::Horizontal => height,
            Self::Vertical => width,
        }
    }

    /// Crop box `(x, y, w, h)` for the span `[start, end)` on the primary axis.
    ///
    /// A reversed span (`end < start`) yields an empty box.
    pub fn crop_box(self, start: u32, end: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let len = end.saturating_sub(start);
        match self {
            Self::Horizontal => (start, 0, len, height),
            Self::Vertical => (0, start, width, len),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        })
    }
}
