//! Output formats, their size limits, and in-memory encoding.

use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageResult, RgbImage};

use super::Quality;

/// Encodable slice format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    #[serde(rename = "webp")]
    WebP,
    Bmp,
    Tiff,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [Self::Jpeg, Self::Png, Self::WebP, Self::Bmp, Self::Tiff];

    /// Map a decoded container format; `None` when it cannot be written.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Tiff => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Guess from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        ImageFormat::from_path(path).ok().and_then(Self::from_image_format)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::WebP => ImageFormat::WebP,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// Largest image the encoder accepts.
    pub fn limits(self) -> CodecLimits {
        match self {
            Self::Jpeg => CodecLimits {
                max_side: Some(65_535),
                max_pixels: None,
            },
            Self::WebP => CodecLimits {
                max_side: Some(8_000),
                max_pixels: Some(32_000_000),
            },
            Self::Png | Self::Bmp | Self::Tiff => CodecLimits::UNBOUNDED,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            other => Err(format!("unsupported output format '{}'", other)),
        }
    }
}

/// Per-format encoder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum width and height.
    pub max_side: Option<u32>,
    /// Maximum `width * height`.
    pub max_pixels: Option<u64>,
}

impl CodecLimits {
    pub const UNBOUNDED: Self = Self {
        max_side: None,
        max_pixels: None,
    };

    /// Largest size with the same aspect ratio that fits, or `None` when
    /// `(width, height)` already fits.
    pub fn fitted_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let mut scale = 1.0f64;
        if let Some(side) = self.max_side {
            let longest = width.max(height);
            if longest > side {
                scale = scale.min(side as f64 / longest as f64);
            }
        }
        if let Some(max_pixels) = self.max_pixels {
            let pixels = width as u64 * height as u64;
            if pixels > max_pixels {
                scale = scale.min((max_pixels as f64 / pixels as f64).sqrt());
            }
        }
        if scale >= 1.0 {
            return None;
        }
        // Epsilon keeps an exact side limit from flooring one pixel short.
        let w = ((width as f64 * scale + 1e-9).floor() as u32).max(1);
        let h = ((height as f64 * scale + 1e-9).floor() as u32).max(1);
        Some((w, h))
    }
}

/// Downscale `image` (Lanczos3) so it satisfies `limits`.
pub fn fit_to_limits(image: &RgbImage, limits: CodecLimits) -> Cow<'_, RgbImage> {
    let (w, h) = image.dimensions();
    match limits.fitted_size(w, h) {
        None => Cow::Borrowed(image),
        Some((nw, nh)) => {
            tracing::debug!(from = ?(w, h), to = ?(nw, nh), "downscaling to codec limits");
            Cow::Owned(image::imageops::resize(image, nw, nh, FilterType::Lanczos3))
        }
    }
}

/// Encode `image` into an in-memory file.
pub fn encode(image: &RgbImage, format: OutputFormat, quality: Quality) -> ImageResult<Vec<u8>> {
    let (w, h) = image.dimensions();
    let data = image.as_raw();
    let mut buf = Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg => {
            let q = match quality {
                Quality::Lossy(q) => q.clamp(1, 100),
                Quality::Lossless => 100,
            };
            JpegEncoder::new_with_quality(&mut buf, q)
                .write_image(data, w, h, ExtendedColorType::Rgb8)?;
        }
        OutputFormat::Png => {
            let compression = match quality {
                Quality::Lossless => CompressionType::Best,
                Quality::Lossy(_) => CompressionType::Default,
            };
            PngEncoder::new_with_quality(&mut buf, compression, PngFilter::Adaptive)
                .write_image(data, w, h, ExtendedColorType::Rgb8)?;
        }
        OutputFormat::WebP => {
            WebPEncoder::new_lossless(&mut buf).write_image(data, w, h, ExtendedColorType::Rgb8)?;
        }
        OutputFormat::Bmp => {
            BmpEncoder::new(&mut buf).write_image(data, w, h, ExtendedColorType::Rgb8)?;
        }
        OutputFormat::Tiff => {
            TiffEncoder::new(&mut buf).write_image(data, w, h, ExtendedColorType::Rgb8)?;
        }
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::test_utils::canvas;

    #[test]
    fn format_tokens_and_extensions() {
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert!("gif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::from_path(Path::new("a/b.JPEG")), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_path(Path::new("a/b.gif")), None);
        for f in OutputFormat::ALL {
            assert_eq!(OutputFormat::from_image_format(f.image_format()), Some(f));
            assert_eq!(f.to_string().parse::<OutputFormat>().unwrap(), f);
        }
        assert_eq!(serde_json::to_string(&OutputFormat::WebP).unwrap(), "\"webp\"");
    }

    #[test]
    fn fitted_size_respects_side_and_pixel_caps() {
        let webp = OutputFormat::WebP.limits();
        assert_eq!(webp.fitted_size(8000, 4000), None);
        assert_eq!(webp.fitted_size(16000, 1000), Some((8000, 500)));

        // 7000 x 7000 = 49M pixels: side fits, area does not.
        let (w, h) = webp.fitted_size(7000, 7000).unwrap();
        assert_eq!(w, h);
        assert!(w as u64 * h as u64 <= 32_000_000);
        assert!(w >= 5650);

        assert_eq!(CodecLimits::UNBOUNDED.fitted_size(100_000, 100_000), None);
        assert_eq!(
            OutputFormat::Jpeg.limits().fitted_size(70_000, 10),
            Some((65_535, 9))
        );
    }

    #[test]
    fn fit_borrows_when_within_limits() {
        let img = canvas(40, 20, Color::WHITE);
        assert!(matches!(fit_to_limits(&img, OutputFormat::WebP.limits()), Cow::Borrowed(_)));
        let limits = CodecLimits {
            max_side: Some(10),
            max_pixels: None,
        };
        let fitted = fit_to_limits(&img, limits);
        assert_eq!(fitted.dimensions(), (10, 5));
    }

    #[test]
    fn every_format_encodes_and_decodes() {
        let img = canvas(32, 24, Color::new(19, 95, 216));
        for f in OutputFormat::ALL {
            let bytes = encode(&img, f, Quality::Lossy(90)).unwrap();
            let back = image::load_from_memory_with_format(&bytes, f.image_format()).unwrap();
            assert_eq!((back.width(), back.height()), (32, 24), "{f}");
        }
        let png = encode(&img, OutputFormat::Png, Quality::Lossless).unwrap();
        let back = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(back, img);
    }
}
