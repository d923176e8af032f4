//! Color representation and the distance metrics used to classify pixels
//! against a background reference.
//!
//! Distances are squared Euclidean in 8-bit RGB. They are only ever compared
//! against a squared tolerance, so no square root is taken.

use std::fmt;
use std::str::FromStr;

use image::Rgb;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` (or bare `RRGGBB`) hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        Some(Self::new(
            (value >> 16) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        ))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Shade used to resolve [`BackgroundReference::BlackOrWhite`].
    ///
    /// The red channel is not part of the sum: `(G + G + B) / 3`. This is the
    /// historical formula and existing cut positions depend on it.
    #[inline]
    pub fn black_or_white_shade(self) -> u32 {
        (self.g as u32 + self.g as u32 + self.b as u32) / 3
    }
}

impl From<Rgb<u8>> for Color {
    #[inline]
    fn from(p: Rgb<u8>) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

impl From<&Rgb<u8>> for Color {
    #[inline]
    fn from(p: &Rgb<u8>) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

impl From<Color> for Rgb<u8> {
    fn from(c: Color) -> Self {
        Rgb([c.r, c.g, c.b])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s).ok_or_else(|| format!("invalid hex color '{}' (expected #RRGGBB)", s))
    }
}

/// Background reference a band is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundReference {
    /// A single concrete color.
    Concrete(Color),
    /// Whichever of black or white is closer to each sample.
    BlackOrWhite,
}

impl BackgroundReference {
    /// Resolve the reference to a concrete color for one sample.
    #[inline]
    pub fn resolve_for(self, sample: Color) -> Color {
        match self {
            Self::Concrete(c) => c,
            Self::BlackOrWhite => {
                if sample.black_or_white_shade() < 128 {
                    Color::BLACK
                } else {
                    Color::WHITE
                }
            }
        }
    }
}

impl fmt::Display for BackgroundReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(c) => write!(f, "{}", c),
            Self::BlackOrWhite => f.write_str("black-or-white"),
        }
    }
}

/// Sum of squared per-channel differences.
#[inline]
pub fn squared_distance(a: Color, b: Color) -> u32 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Distance of `sample` from `reference`.
///
/// With `fuzzy` set the result is the minimum of the distance to the
/// reference, to white, and to black.
#[inline]
pub fn color_distance(sample: Color, reference: BackgroundReference, fuzzy: bool) -> u32 {
    let resolved = reference.resolve_for(sample);
    let distance = squared_distance(sample, resolved);
    if !fuzzy {
        return distance;
    }
    distance
        .min(squared_distance(sample, Color::WHITE))
        .min(squared_distance(sample, Color::BLACK))
}

/// Exact-match fast path evaluated before any distance computation.
#[inline]
pub fn is_exact_background(pixel: Color, reference: BackgroundReference) -> bool {
    match reference {
        BackgroundReference::Concrete(c) => pixel == c,
        BackgroundReference::BlackOrWhite => pixel == Color::BLACK || pixel == Color::WHITE,
    }
}

/// Squared distance above which a pixel counts as a mismatch.
#[inline]
pub fn mismatch_threshold(tolerance: u32) -> u64 {
    3 * (tolerance as u64) * (tolerance as u64)
}
