use image::RgbImage;

use super::{scan_band, Orientation};
use crate::color::BackgroundReference;
use crate::config::ScanConfig;

/// A located background band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CutPoint {
    /// First line of the uniform band on the primary axis.
    pub band_start: u32,
    /// Cut coordinate: the middle of the band.
    pub position: u32,
}

/// Walk forward from `seed` until a uniform band is found.
///
/// Returns `None` when the walk reaches the end of the primary axis.
pub fn locate_band(
    image: &RgbImage,
    reference: BackgroundReference,
    orientation: Orientation,
    seed: u32,
    config: &ScanConfig,
) -> Option<CutPoint> {
    let (w, h) = image.dimensions();
    let primary = orientation.primary_len(w, h) as u64;

    let mut offset = 0u64;
    let mut attempts = 0u32;
    while seed as u64 + offset < primary {
        let origin = (seed as u64 + offset) as u32;
        let scan = scan_band(image, orientation, origin, reference, config);
        attempts += 1;
        if scan.uniform {
            let position = origin as u64 + (config.band_thickness / 2) as u64;
            tracing::debug!(seed, origin, position, attempts, "band located");
            return Some(CutPoint {
                band_start: origin,
                position: position.min(u32::MAX as u64) as u32,
            });
        }
        offset += scan.resume.max(1) as u64;
    }

    tracing::debug!(seed, attempts, "no band before edge");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::test_utils::{canvas, fill_rect, stripe_image};

    fn white() -> BackgroundReference {
        BackgroundReference::Concrete(Color::WHITE)
    }

    fn cfg(band: u32) -> ScanConfig {
        ScanConfig {
            band_thickness: band,
            ..Default::default()
        }
    }

    #[test]
    fn finds_band_at_seed_on_background() {
        let img = canvas(300, 100, Color::WHITE);
        let cut = locate_band(&img, white(), Orientation::Horizontal, 40, &cfg(20)).unwrap();
        assert_eq!(
            cut,
            CutPoint {
                band_start: 40,
                position: 50
            }
        );
    }

    #[test]
    fn skips_content_to_next_gap() {
        // White gap from x=140 to x=160 surrounded by content.
        let img = stripe_image(300, 100, &[(0, 140), (160, 300)]);
        let cut = locate_band(&img, white(), Orientation::Horizontal, 50, &cfg(20)).unwrap();
        assert_eq!(cut.band_start, 140);
        assert_eq!(cut.position, 150);
    }

    #[test]
    fn not_found_when_no_gap_is_wide_enough() {
        let img = stripe_image(300, 100, &[(0, 140), (155, 300)]);
        assert_eq!(
            locate_band(&img, white(), Orientation::Horizontal, 0, &cfg(20)),
            None
        );
    }

    #[test]
    fn seed_at_or_past_edge_is_not_found() {
        let img = canvas(100, 300, Color::WHITE);
        assert_eq!(locate_band(&img, white(), Orientation::Vertical, 300, &cfg(20)), None);
        assert_eq!(locate_band(&img, white(), Orientation::Vertical, 290, &cfg(20)), None);
    }

    #[test]
    fn vertical_orientation_scans_rows() {
        let mut img = canvas(100, 300, Color::BLACK);
        fill_rect(&mut img, 0, 200, 100, 30, Color::WHITE);
        let cut = locate_band(&img, white(), Orientation::Vertical, 10, &cfg(20)).unwrap();
        assert_eq!(cut.band_start, 200);
        assert_eq!(cut.position, 210);
    }
}
