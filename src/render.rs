//! Renders a palette as a strip of equal-width color bands.

use crate::Palette;
use image::{Rgb, RgbImage};

pub const BAND_WIDTH: u32 = 100;
pub const STRIP_HEIGHT: u32 = 200;

/// One [`BAND_WIDTH`] wide band per swatch, left to right in palette order.
pub fn swatch_strip(palette: &Palette) -> RgbImage {
    let swatches = palette.swatches();
    let width = BAND_WIDTH * swatches.len() as u32;

    RgbImage::from_fn(width, STRIP_HEIGHT, |x, _| {
        let (r, g, b) = swatches[(x / BAND_WIDTH) as usize].rgb();
        Rgb([r, g, b])
    })
}
