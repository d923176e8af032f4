//! Cut planning.
//!
//! A [`CutPlan`] is computed entirely from the decoded image and the
//! configuration before anything is written. Coordinates are computed in
//! signed arithmetic (the nominal unit size can be negative for images smaller
//! than the bands they are asked to hold) and clamped into `[0, primary]`.

mod tail;

use image::RgbImage;

use crate::color::BackgroundReference;
use crate::config::{ScanConfig, SplitConfig};
use crate::error::{Result, SplitError};
use crate::scan::{locate_band, Orientation};

pub use tail::{span_stddev, TailOutcome};

/// How the end coordinate of a span was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutSource {
    /// Middle of a located background band.
    Band,
    /// Proportional position used when no band was found.
    Fallback,
    /// Far edge of the image.
    Edge,
}

/// Half-open interval `[start, end)` on the primary axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CutSpan {
    pub start: u32,
    pub end: u32,
    pub source: CutSource,
}

impl CutSpan {
    #[inline]
    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

/// Ordered spans covering the image along the primary axis.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CutPlan {
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
    /// Nominal slice size; may be zero or negative for tiny images.
    pub unit_size: i64,
    pub reference: BackgroundReference,
    pub spans: Vec<CutSpan>,
    pub tail: TailOutcome,
}

impl CutPlan {
    pub fn primary_len(&self) -> u32 {
        self.orientation.primary_len(self.width, self.height)
    }

    /// Crop boxes `(x, y, w, h)` in span order.
    pub fn crop_boxes(&self) -> impl Iterator<Item = (u32, u32, u32, u32)> + '_ {
        self.spans
            .iter()
            .map(|s| self.orientation.crop_box(s.start, s.end, self.width, self.height))
    }
}

/// Compute the cut plan for `image` against `reference`.
pub fn build_plan(
    image: &RgbImage,
    reference: BackgroundReference,
    config: &SplitConfig,
) -> Result<CutPlan> {
    let (width, height) = image.dimensions();
    let orientation = Orientation::choose(width, height, config.split_vertically);
    let primary = orientation.primary_len(width, height);
    if primary <= config.size_threshold {
        return Err(SplitError::BelowSizeThreshold {
            primary,
            threshold: config.size_threshold,
        });
    }

    let scan = ScanConfig {
        fuzzy_matching: config.fuzzy(),
        ..config.scan.clone()
    };

    let p = primary as i64;
    let band = scan.band_thickness as i64;
    let units = config.units as i64;
    let unit_size = (p - band * (units - 1)) / units;
    tracing::info!(
        width,
        height,
        %orientation,
        units,
        unit_size,
        "planning cuts"
    );

    let mut spans = Vec::with_capacity(config.units as usize);
    let mut prev = 0i64;
    for i in 0..units - 1 {
        let mut seed = ((unit_size + band) * (i + 1)).max(prev + unit_size);
        if let Some(factor) = scan.scan_wider_factor {
            seed = (seed as f64 * factor).floor() as i64;
        }
        if seed >= p - band {
            seed = p;
        }
        if prev >= p - band {
            tracing::debug!(unit = i, prev, "reached far edge");
            break;
        }

        let seed_px = seed.clamp(0, p) as u32;
        let located = locate_band(image, reference, orientation, seed_px, &scan);
        let (mut cut, mut source) = match located {
            Some(point) => (point.position as i64, CutSource::Band),
            None => {
                let fallback = p.min(p * (i + 1) / units);
                tracing::warn!(
                    unit = i,
                    seed,
                    fallback,
                    "no background band found, cutting proportionally"
                );
                (fallback, CutSource::Fallback)
            }
        };
        if cut <= prev {
            cut = p;
            source = CutSource::Edge;
        }
        let cut = cut.clamp(0, p);
        if cut == p {
            source = CutSource::Edge;
        }

        spans.push(checked_span(prev, cut, source, p)?);
        tracing::debug!(unit = i, seed, start = prev, end = cut, ?source, "span planned");
        prev = cut;
    }

    if prev < p {
        spans.push(checked_span(prev, p, CutSource::Edge, p)?);
    }

    let tail = tail::apply(&mut spans, image, orientation, unit_size, &config.tail);

    Ok(CutPlan {
        orientation,
        width,
        height,
        unit_size,
        reference,
        spans,
        tail,
    })
}

fn checked_span(start: i64, end: i64, source: CutSource, limit: i64) -> Result<CutSpan> {
    if start < 0 || end <= start || end > limit {
        return Err(SplitError::Geometry { start, end, limit });
    }
    Ok(CutSpan {
        start: start as u32,
        end: end as u32,
        source,
    })
}
