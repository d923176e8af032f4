//! Shared synthetic image builders for unit tests.

use image::{Rgb, RgbImage};

use crate::color::Color;

/// Solid canvas of one color.
pub(crate) fn canvas(w: u32, h: u32, color: Color) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb::from(color))
}

/// Fill the rectangle `[x, x+w) x [y, y+h)`, clipped to the image.
pub(crate) fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Color) {
    let (iw, ih) = img.dimensions();
    let px = Rgb::from(color);
    for yy in y..(y + h).min(ih) {
        for xx in x..(x + w).min(iw) {
            img.put_pixel(xx, yy, px);
        }
    }
}

/// Set the first `count` pixels of column `x` (every other row) to `color`.
pub(crate) fn speckle_column(img: &mut RgbImage, x: u32, count: u32, color: Color) {
    let px = Rgb::from(color);
    for k in 0..count {
        img.put_pixel(x, 2 * k, px);
    }
}

/// White canvas with black content in each `[start, end)` column range.
pub(crate) fn stripe_image(w: u32, h: u32, content: &[(u32, u32)]) -> RgbImage {
    let mut img = canvas(w, h, Color::WHITE);
    for &(start, end) in content {
        fill_rect(&mut img, start, 0, end - start, h, Color::BLACK);
    }
    img
}

/// Deterministic high-variance pattern in the rectangle `[x, x+w) x [y, y+h)`.
pub(crate) fn checker_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
    let (iw, ih) = img.dimensions();
    for yy in y..(y + h).min(ih) {
        for xx in x..(x + w).min(iw) {
            let v = if (xx / 2 + yy / 2) % 2 == 0 { 20 } else { 230 };
            img.put_pixel(xx, yy, Rgb([v, v / 2, 255 - v]));
        }
    }
}
