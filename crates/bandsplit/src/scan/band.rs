//! Uniformity test for one band.

use image::RgbImage;

use super::Orientation;
use crate::color::{
    color_distance, is_exact_background, mismatch_threshold, BackgroundReference, Color,
};
use crate::config::ScanConfig;

/// Outcome of scanning one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandScan {
    /// Every line of the band matched the background.
    pub uniform: bool,
    /// Lines to advance before the next attempt; `0` when `uniform`.
    pub resume: u32,
}

impl BandScan {
    const UNIFORM: Self = Self {
        uniform: true,
        resume: 0,
    };

    fn rejected_at(line: u32) -> Self {
        Self {
            uniform: false,
            resume: line + 1,
        }
    }
}

/// Scan `band_thickness` lines starting at `origin` on the primary axis.
///
/// Lines run across the full cross axis minus `margin` pixels at both ends.
/// The band is rejected at the first line that leaves the image or whose
/// mismatch count exceeds `diff_threshold` of the scanned line length; the
/// returned `resume` then points just past that line.
pub fn scan_band(
    image: &RgbImage,
    orientation: Orientation,
    origin: u32,
    reference: BackgroundReference,
    config: &ScanConfig,
) -> BandScan {
    let (w, h) = image.dimensions();
    let primary = orientation.primary_len(w, h);
    let cross = orientation.cross_len(w, h);

    let lo = config.margin;
    let hi = cross.saturating_sub(config.margin);
    let inner = cross.saturating_sub(config.margin.saturating_mul(2));
    let allowed = inner as f64 * config.diff_threshold;
    let threshold = mismatch_threshold(config.color_tolerance);

    let raw = image.as_raw();
    let stride = w as usize * 3;
    let pixel = |x: u32, y: u32| {
        let i = y as usize * stride + x as usize * 3;
        Color::new(raw[i], raw[i + 1], raw[i + 2])
    };

    for line in 0..config.band_thickness {
        let pos = origin as u64 + line as u64;
        if pos >= primary as u64 {
            return BandScan::rejected_at(line);
        }
        let pos = pos as u32;

        let mut mismatches = 0u32;
        for t in lo..hi {
            let p = match orientation {
                Orientation::Horizontal => pixel(pos, t),
                Orientation::Vertical => pixel(t, pos),
            };
            if is_exact_background(p, reference) {
                continue;
            }
            if color_distance(p, reference, config.fuzzy_matching) as u64 > threshold {
                mismatches += 1;
                if mismatches as f64 > allowed {
                    tracing::trace!(origin, line, mismatches, "band rejected");
                    return BandScan::rejected_at(line);
                }
            }
        }
    }

    BandScan::UNIFORM
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{canvas, fill_rect, speckle_column};

    fn white() -> BackgroundReference {
        BackgroundReference::Concrete(Color::WHITE)
    }

    fn cfg(band: u32, diff_threshold: f64) -> ScanConfig {
        ScanConfig {
            band_thickness: band,
            diff_threshold,
            ..Default::default()
        }
    }

    #[test]
    fn pure_background_band_is_uniform() {
        let img = canvas(120, 40, Color::WHITE);
        for origin in [0, 30, 100] {
            let r = scan_band(&img, Orientation::Horizontal, origin, white(), &cfg(20, 0.0));
            assert_eq!(r, BandScan { uniform: true, resume: 0 });
        }
        let img = canvas(40, 120, Color::new(19, 95, 216));
        let reference = BackgroundReference::Concrete(Color::new(19, 95, 216));
        let r = scan_band(&img, Orientation::Vertical, 50, reference, &cfg(20, 0.05));
        assert!(r.uniform);
    }

    #[test]
    fn band_past_the_edge_is_rejected_with_progress() {
        let img = canvas(100, 40, Color::WHITE);
        // Lines 90..99 are inside, line index 10 (x=100) is outside.
        let r = scan_band(&img, Orientation::Horizontal, 90, white(), &cfg(20, 0.05));
        assert_eq!(r, BandScan { uniform: false, resume: 11 });
        let r = scan_band(&img, Orientation::Horizontal, 100, white(), &cfg(20, 0.05));
        assert_eq!(r, BandScan { uniform: false, resume: 1 });
    }

    #[test]
    fn resume_points_past_failing_line() {
        let mut img = canvas(200, 50, Color::WHITE);
        fill_rect(&mut img, 107, 0, 3, 50, Color::BLACK);
        let r = scan_band(&img, Orientation::Horizontal, 100, white(), &cfg(20, 0.05));
        assert_eq!(r, BandScan { uniform: false, resume: 8 });
    }

    #[test]
    fn mismatch_fraction_above_threshold_rejects() {
        // 100 px columns; 5% allows 5 mismatches, 6 must reject.
        let mut img = canvas(60, 100, Color::WHITE);
        speckle_column(&mut img, 30, 6, Color::BLACK);
        let r = scan_band(&img, Orientation::Horizontal, 25, white(), &cfg(10, 0.05));
        assert_eq!(r, BandScan { uniform: false, resume: 6 });

        let mut img = canvas(60, 100, Color::WHITE);
        speckle_column(&mut img, 30, 5, Color::BLACK);
        let r = scan_band(&img, Orientation::Horizontal, 25, white(), &cfg(10, 0.05));
        assert!(r.uniform);
    }

    #[test]
    fn zero_threshold_rejects_any_mismatch() {
        let mut img = canvas(60, 100, Color::WHITE);
        speckle_column(&mut img, 30, 1, Color::BLACK);
        let r = scan_band(&img, Orientation::Horizontal, 30, white(), &cfg(1, 0.0));
        assert!(!r.uniform);
    }

    #[test]
    fn tolerance_absorbs_small_color_noise() {
        let img = canvas(60, 40, Color::new(250, 251, 252));
        let mut c = cfg(10, 0.0);
        c.color_tolerance = 1;
        assert!(!scan_band(&img, Orientation::Horizontal, 0, white(), &c).uniform);
        // squared distance 25+16+9 = 50 <= 3 * 5^2 = 75
        c.color_tolerance = 5;
        assert!(scan_band(&img, Orientation::Horizontal, 0, white(), &c).uniform);
    }

    #[test]
    fn margin_excludes_line_ends() {
        let mut img = canvas(60, 100, Color::WHITE);
        fill_rect(&mut img, 0, 0, 60, 8, Color::BLACK);
        fill_rect(&mut img, 0, 92, 60, 8, Color::BLACK);
        let mut c = cfg(10, 0.0);
        assert!(!scan_band(&img, Orientation::Horizontal, 10, white(), &c).uniform);
        c.margin = 8;
        assert!(scan_band(&img, Orientation::Horizontal, 10, white(), &c).uniform);
    }

    #[test]
    fn fuzzy_accepts_black_and_white_noise() {
        let grey = Color::new(128, 128, 128);
        let reference = BackgroundReference::Concrete(grey);
        let mut img = canvas(100, 60, grey);
        fill_rect(&mut img, 0, 20, 100, 3, Color::WHITE);
        fill_rect(&mut img, 0, 25, 100, 3, Color::BLACK);
        let mut c = cfg(20, 0.05);
        assert!(!scan_band(&img, Orientation::Vertical, 15, reference, &c).uniform);
        c.fuzzy_matching = true;
        assert!(scan_band(&img, Orientation::Vertical, 15, reference, &c).uniform);
    }

    #[test]
    fn black_or_white_reference() {
        let mut img = canvas(100, 60, Color::WHITE);
        fill_rect(&mut img, 0, 30, 100, 30, Color::BLACK);
        let c = cfg(20, 0.0);
        let bw = BackgroundReference::BlackOrWhite;
        assert!(scan_band(&img, Orientation::Vertical, 20, bw, &c).uniform);
        assert!(!scan_band(&img, Orientation::Vertical, 20, white(), &c).uniform);
    }
}
