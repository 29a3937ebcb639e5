use crate::error::{Error, Result};
use image::{GenericImageView, Pixel, Rgba};
use std::collections::HashMap;
use tracing::debug;

/// Full 8-bit channel precision; no colors are merged while building the histogram.
pub const DEFAULT_PRECISION: u8 = 8;

/// One distinct color of an image together with the number of visible pixels that have it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramEntry {
    color: (u8, u8, u8),
    count: u64,
}

/// The distinct visible colors of an image and their pixel counts.
///
/// A histogram is never empty: building one from an image without visible pixels fails with
/// [`Error::EmptyImage`]. Entries are ordered by their packed RGB value with red as the most
/// significant channel, so the same image always produces the same entry order.
///
/// When built with a reduced channel precision, the stored colors are the truncated channel values
/// (`precision` bits each). Colors sharing truncated values merge into one entry, so per-color counts
/// are no longer exact, but [`PixelHistogram::total_count`] still is.
#[derive(Debug, Clone)]
pub struct PixelHistogram {
    entries: Vec<HistogramEntry>,
    total_count: u64,
    precision: u8,
}

impl HistogramEntry {
    pub(crate) fn new(color: (u8, u8, u8), count: u64) -> Self {
        Self { color, count }
    }

    pub fn color(self) -> (u8, u8, u8) {
        self.color
    }

    pub fn count(self) -> u64 {
        self.count
    }
}

impl PixelHistogram {
    /// Build a histogram of an image at full channel precision.
    pub fn from_image<I>(image: &I) -> Result<Self>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        Self::with_precision(image, DEFAULT_PRECISION)
    }

    /// Build a histogram keeping only the top `precision` bits of each channel. Bounds the number of
    /// distinct entries to `2^(3 * precision)` for very large or noisy images.
    pub fn with_precision<I>(image: &I, precision: u8) -> Result<Self>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        Self::from_pixels(image.pixels().map(|(_, _, pixel)| pixel.to_rgba()), precision)
    }

    pub(crate) fn from_pixels<T>(pixels: T, precision: u8) -> Result<Self>
    where
        T: IntoIterator<Item = Rgba<u8>>,
    {
        if !(1..=DEFAULT_PRECISION).contains(&precision) {
            return Err(Error::InvalidPrecision(precision));
        }

        let mut hist = HashMap::new();
        for Rgba([r, g, b, a]) in pixels {
            // fully transparent pixels carry no color
            if a == 0 {
                continue;
            }

            let color = (
                modify_width(r, 8, precision),
                modify_width(g, 8, precision),
                modify_width(b, 8, precision),
            );
            *hist.entry(color).or_insert(0u64) += 1;
        }

        if hist.is_empty() {
            return Err(Error::EmptyImage);
        }

        let mut entries = hist
            .into_iter()
            .map(|(color, count)| HistogramEntry::new(color, count))
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| pack_rgb(entry.color));

        let total_count = entries.iter().map(|entry| entry.count).sum();
        debug!(
            distinct_colors = entries.len(),
            total_count, precision, "built pixel histogram"
        );

        Ok(Self {
            entries,
            total_count,
            precision,
        })
    }

    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    pub fn distinct_colors(&self) -> usize {
        self.entries.len()
    }

    /// Number of visible pixels in the source image.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }
}

fn pack_rgb((r, g, b): (u8, u8, u8)) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Move a channel value between bit widths, dropping or padding the low bits.
pub(crate) fn modify_width(value: u8, current_width: u8, target_width: u8) -> u8 {
    if target_width > current_width {
        value.wrapping_shl((target_width - current_width) as u32)
    } else {
        value.wrapping_shr((current_width - target_width) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, RgbImage, RgbaImage};

    #[test]
    fn counts_distinct_colors() {
        let image = RgbImage::from_fn(4, 2, |x, _| if x < 3 { [10, 20, 30].into() } else { [0, 0, 0].into() });
        let hist = PixelHistogram::from_image(&image).unwrap();

        assert_eq!(hist.total_count(), 8);
        assert_eq!(
            hist.entries(),
            &[HistogramEntry::new((0, 0, 0), 2), HistogramEntry::new((10, 20, 30), 6)]
        );
    }

    #[test]
    fn skips_transparent_pixels() {
        let image = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => [255, 0, 0, 0].into(),
            1 => [255, 0, 0, 1].into(),
            _ => [0, 255, 0, 255].into(),
        });
        let hist = PixelHistogram::from_image(&image).unwrap();

        assert_eq!(hist.total_count(), 2);
        assert_eq!(hist.distinct_colors(), 2);
    }

    #[test]
    fn fully_transparent_image_is_empty() {
        let image = RgbaImage::from_pixel(5, 5, [12, 34, 56, 0].into());
        assert!(matches!(PixelHistogram::from_image(&image), Err(Error::EmptyImage)));
    }

    #[test]
    fn zero_sized_image_is_empty() {
        let image: RgbImage = ImageBuffer::new(0, 0);
        assert!(matches!(PixelHistogram::from_image(&image), Err(Error::EmptyImage)));
    }

    #[test]
    fn entries_are_ordered_by_packed_color() {
        let image = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => [0, 0, 255].into(),
            1 => [255, 0, 0].into(),
            _ => [0, 255, 0].into(),
        });
        let hist = PixelHistogram::from_image(&image).unwrap();
        let colors = hist.entries().iter().map(|entry| entry.color()).collect::<Vec<_>>();

        assert_eq!(colors, vec![(0, 0, 255), (0, 255, 0), (255, 0, 0)]);
    }

    #[test]
    fn reduced_precision_merges_close_colors() {
        let image = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => [200, 100, 50].into(),
            1 => [207, 103, 55].into(),
            _ => [8, 8, 8].into(),
        });
        let hist = PixelHistogram::with_precision(&image, 5).unwrap();

        assert_eq!(hist.precision(), 5);
        assert_eq!(hist.total_count(), 3);
        assert_eq!(
            hist.entries(),
            &[HistogramEntry::new((1, 1, 1), 1), HistogramEntry::new((25, 12, 6), 2)]
        );
    }

    #[test]
    fn rejects_out_of_range_precision() {
        let image = RgbImage::from_pixel(1, 1, [1, 2, 3].into());

        assert!(matches!(PixelHistogram::with_precision(&image, 0), Err(Error::InvalidPrecision(0))));
        assert!(matches!(PixelHistogram::with_precision(&image, 9), Err(Error::InvalidPrecision(9))));
    }

    #[test]
    fn modify_width_round_trips_top_bits() {
        assert_eq!(modify_width(0b1011_0111, 8, 5), 0b10110);
        assert_eq!(modify_width(0b10110, 5, 8), 0b1011_0000);
        assert_eq!(modify_width(42, 8, 8), 42);
    }
}
