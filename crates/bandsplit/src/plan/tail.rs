//! Final-slice policy: drop a blank tail or fold a thin one into its
//! predecessor.

use image::RgbImage;

use super::{CutSource, CutSpan};
use crate::config::TailConfig;
use crate::scan::Orientation;

/// What happened to the last span of a plan.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum TailOutcome {
    Kept,
    /// The tail was narrower than half a unit and now belongs to the
    /// previous span.
    Merged { removed: CutSpan },
    /// The tail was blank (channel standard deviation below the threshold).
    Dropped { removed: CutSpan, stddev: f64 },
}

/// Population standard deviation of all channel values inside `span`.
pub fn span_stddev(image: &RgbImage, orientation: Orientation, span: &CutSpan) -> f64 {
    let (w, h) = image.dimensions();
    let (x0, y0, cw, ch) = orientation.crop_box(span.start, span.end, w, h);

    let mut sum = 0u64;
    let mut sum_sq = 0u64;
    let mut n = 0u64;
    for y in y0..y0 + ch {
        for x in x0..x0 + cw {
            for &v in image.get_pixel(x, y).0.iter() {
                sum += v as u64;
                sum_sq += (v as u64) * (v as u64);
                n += 1;
            }
        }
    }
    if n == 0 {
        return 0.0;
    }
    let mean = sum as f64 / n as f64;
    let var = (sum_sq as f64 / n as f64 - mean * mean).max(0.0);
    var.sqrt()
}

/// Apply the tail policy to `spans` in place. Plans with fewer than two
/// spans are left alone.
pub(crate) fn apply(
    spans: &mut Vec<CutSpan>,
    image: &RgbImage,
    orientation: Orientation,
    unit_size: i64,
    config: &TailConfig,
) -> TailOutcome {
    if spans.len() < 2 {
        return TailOutcome::Kept;
    }
    let Some(&tail) = spans.last() else {
        return TailOutcome::Kept;
    };

    if let Some(threshold) = config.blank_stddev_threshold {
        let stddev = span_stddev(image, orientation, &tail);
        if stddev < threshold {
            spans.pop();
            tracing::info!(start = tail.start, end = tail.end, stddev, "blank tail dropped");
            return TailOutcome::Dropped {
                removed: tail,
                stddev,
            };
        }
    }

    if config.merge_thin && (tail.width() as f64) < unit_size as f64 / 2.0 {
        spans.pop();
        if let Some(prev) = spans.last_mut() {
            prev.end = tail.end;
            prev.source = CutSource::Edge;
        }
        tracing::info!(start = tail.start, end = tail.end, unit_size, "thin tail merged");
        return TailOutcome::Merged { removed: tail };
    }

    TailOutcome::Kept
}
