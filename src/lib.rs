// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A library to extract a representative color palette from an image.
//!
//! The palette is computed with the median cut algorithm. The distinct visible colors of the image are
//! collected into a [`PixelHistogram`], which starts out as a single box in RGB space. The most
//! populous box is then repeatedly split in two along its widest channel, at the point where the
//! pixel-weighted count is halved, until the requested number of boxes is reached or every box holds
//! a single color. Each final box becomes one [`Swatch`]: the count-weighted mean color of the box and
//! the number of pixels it covers.
//!
//! ```no_run
//! let palette = colorthief::palette_from_file("photo.png", 6)?;
//!
//! for (swatch, ratio) in palette.swatches().iter().zip(palette.ratios()) {
//!     println!("{} {:.1}%", swatch.hex(), ratio * 100.0);
//! }
//! # Ok::<(), colorthief::Error>(())
//! ```

mod color_box;
mod error;
mod extractor;
mod histogram;
mod partitioner;
pub mod render;
mod swatch;

/// Default number of boxes, and so the maximum number of palette colors.
pub const DEFAULT_MAX_CUBES: usize = 6;
/// Default for [`PaletteBuilder::resize_image_area`]; the image is analyzed at full size.
pub const DEFAULT_RESIZE_IMAGE_AREA: u32 = 0;

pub use crate::{
    error::{Error, Result},
    histogram::{HistogramEntry, PixelHistogram, DEFAULT_PRECISION},
    swatch::Swatch,
};
pub use image;

use extractor::PaletteExtractor;
use image::{math::Rect, GenericImageView, ImageBuffer};
use palette::IntoColor;
use partitioner::MedianCutPartitioner;
use std::{num::NonZeroUsize, path::Path};
use tracing::debug;

/// The swatches produced by the median cut, one per final box.
///
/// Swatches are kept in the order their boxes were created during the cut, which is not a ranking.
/// Use [`Palette::sorted_by_population`] or [`Palette::most_prominent_color`] when the most common
/// colors are wanted first.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Palette {
    swatches: Vec<Swatch>,
    total_population: u64,
}

pub struct PaletteBuilder<P>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    image: ImageBuffer<P, Vec<<P as image::Pixel>::Subpixel>>,
    max_cubes: usize,
    precision: u8,
    resize_area: u32,
    region: Option<Rect>,
}

/// Collect the distinct visible colors of an image at full channel precision.
///
/// Fails with [`Error::EmptyImage`] if the image has no pixels with a non-zero alpha.
pub fn extract_histogram<I>(image: &I) -> Result<PixelHistogram>
where
    I: GenericImageView,
    I::Pixel: image::Pixel<Subpixel = u8>,
{
    PixelHistogram::from_image(image)
}

/// Run the median cut over a histogram, producing at most `max_cubes` swatches.
///
/// Fewer swatches are returned when the histogram runs out of boxes that can be split. Fails with
/// [`Error::InvalidTarget`] if `max_cubes` is zero.
pub fn compute_palette(histogram: &PixelHistogram, max_cubes: usize) -> Result<Palette> {
    let target = NonZeroUsize::new(max_cubes).ok_or(Error::InvalidTarget(max_cubes))?;
    Ok(quantize(histogram, target))
}

/// The mean color of every visible pixel, the single swatch of a one-box palette.
pub fn dominant_color(histogram: &PixelHistogram) -> (u8, u8, u8) {
    // a histogram always has an entry, so a one-box cut always yields exactly one swatch
    quantize(histogram, NonZeroUsize::MIN).swatches[0].rgb()
}

/// Decode an image file and compute its palette.
pub fn palette_from_file<T>(path: T, max_cubes: usize) -> Result<Palette>
where
    T: AsRef<Path>,
{
    let image = open_image(path)?;
    Palette::from_image(image).max_cubes(max_cubes).generate()
}

/// Decode an image file and return its [`dominant_color`].
pub fn color_from_file<T>(path: T) -> Result<(u8, u8, u8)>
where
    T: AsRef<Path>,
{
    let image = open_image(path)?;
    let histogram = extract_histogram(&image)?;
    Ok(dominant_color(&histogram))
}

/// Decode an image file into RGBA pixels. Decoding failures are reported as [`Error::ImageLoad`].
pub fn open_image<T>(path: T) -> Result<image::RgbaImage>
where
    T: AsRef<Path>,
{
    let path = path.as_ref();

    let image = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(image.into_rgba8())
}

fn quantize(histogram: &PixelHistogram, target: NonZeroUsize) -> Palette {
    // the partitioner reorders entries while splitting, so it works on a copy
    let mut entries = histogram.entries().to_vec();
    let state = MedianCutPartitioner::new(&mut entries, target).run();
    let swatches = PaletteExtractor::new(histogram.precision()).extract(&state);

    debug!(phase = ?state.phase(), boxes = swatches.len(), target = target.get(), "median cut finished");

    Palette::from_swatches(swatches, histogram.total_count())
}

impl Palette {
    pub fn from_image<P>(image: ImageBuffer<P, Vec<<P as image::Pixel>::Subpixel>>) -> PaletteBuilder<P>
    where
        P: image::Pixel<Subpixel = u8> + 'static,
    {
        PaletteBuilder::from_image(image)
    }

    pub(crate) fn from_swatches(swatches: Vec<Swatch>, total_population: u64) -> Palette {
        Self {
            swatches,
            total_population,
        }
    }

    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    pub fn len(&self) -> usize {
        self.swatches.len()
    }

    /// Always false for a palette computed from an image.
    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }

    /// Representative colors, index-aligned with [`Palette::pixel_counts`].
    pub fn colors(&self) -> Vec<(u8, u8, u8)> {
        self.swatches.iter().map(|swatch| swatch.rgb()).collect()
    }

    pub fn pixel_counts(&self) -> Vec<u64> {
        self.swatches.iter().map(|swatch| swatch.population()).collect()
    }

    /// Each swatch's share of the visible pixels of the image.
    pub fn ratios(&self) -> Vec<f64> {
        self.swatches
            .iter()
            .map(|swatch| swatch.population() as f64 / self.total_population as f64)
            .collect()
    }

    /// Number of visible pixels the palette was computed from. Equal to the sum of the swatch
    /// populations.
    pub fn total_population(&self) -> u64 {
        self.total_population
    }

    pub fn most_prominent_color(&self) -> Option<(u8, u8, u8)> {
        self.swatches
            .iter()
            .max_by_key(|swatch| swatch.population())
            .map(|swatch| swatch.rgb())
    }

    /// The swatches ordered from the largest population to the smallest. Equal populations keep their
    /// palette order.
    pub fn sorted_by_population(&self) -> Vec<Swatch> {
        let mut swatches = self.swatches.clone();
        swatches.sort_by_key(|swatch| std::cmp::Reverse(swatch.population()));
        swatches
    }

    pub fn into_parts(self) -> (Vec<(u8, u8, u8)>, Vec<u64>) {
        self.swatches
            .into_iter()
            .map(|swatch| (swatch.rgb(), swatch.population()))
            .unzip()
    }

    /// Write the palette as a strip of color bands. The format is picked from the file extension.
    pub fn save_swatch_strip<T>(&self, path: T) -> Result<()>
    where
        T: AsRef<Path>,
    {
        let path = path.as_ref();

        render::swatch_strip(self)
            .save(path)
            .map_err(|source| Error::SwatchWrite {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl<P> PaletteBuilder<P>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    pub fn from_image(image: ImageBuffer<P, Vec<<P as image::Pixel>::Subpixel>>) -> Self {
        Self {
            image,
            max_cubes: DEFAULT_MAX_CUBES,
            precision: DEFAULT_PRECISION,
            resize_area: DEFAULT_RESIZE_IMAGE_AREA,
            region: None,
        }
    }

    pub fn max_cubes(self, max_cubes: usize) -> Self {
        Self { max_cubes, ..self }
    }

    /// Keep only the top `precision` bits of each channel when building the histogram. See
    /// [`PixelHistogram`] for what is lost.
    pub fn precision(self, precision: u8) -> Self {
        Self { precision, ..self }
    }

    /// Scale the image down with nearest-neighbor sampling so it has at most `resize_area` pixels. Zero
    /// keeps the full image. Pixel counts then refer to the scaled image.
    pub fn resize_image_area(self, resize_area: u32) -> Self {
        Self { resize_area, ..self }
    }

    /// Only analyze the given rectangle. The rectangle is clipped to the image bounds.
    pub fn region(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            region: Some(Rect { x, y, width, height }),
            ..self
        }
    }

    pub fn clear_region(self) -> Self {
        Self { region: None, ..self }
    }

    pub fn generate(self) -> Result<Palette> {
        let image = match self.region {
            Some(region) => {
                let (width, height) = self.image.dimensions();
                let x = region.x.min(width);
                let y = region.y.min(height);

                self.image
                    .view(x, y, region.width.min(width - x), region.height.min(height - y))
                    .to_image()
            }
            None => self.image,
        };

        let image = scale_image_down(image, self.resize_area);
        let histogram = PixelHistogram::with_precision(&image, self.precision)?;

        compute_palette(&histogram, self.max_cubes)
    }
}

fn scale_image_down<P>(
    image: ImageBuffer<P, Vec<<P as image::Pixel>::Subpixel>>,
    resize_area: u32,
) -> ImageBuffer<P, Vec<<P as image::Pixel>::Subpixel>>
where
    P: image::Pixel<Subpixel = u8> + 'static,
{
    let (width, height) = image.dimensions();
    let area = u64::from(width) * u64::from(height);

    if resize_area == 0 || area <= u64::from(resize_area) {
        return image;
    }

    let scale_ratio = (f64::from(resize_area) / area as f64).sqrt();
    let scaled_width = ((f64::from(width) * scale_ratio) as u32).max(1);
    let scaled_height = ((f64::from(height) * scale_ratio) as u32).max(1);
    // a side clamped to 1 can push the other past the area limit
    let scaled_height = scaled_height.min(resize_area / scaled_width).max(1);
    let scaled_width = scaled_width.min(resize_area / scaled_height).max(1);

    debug!(width, height, scaled_width, scaled_height, "scaling image down");

    image::imageops::resize(
        &image,
        scaled_width,
        scaled_height,
        image::imageops::FilterType::Nearest,
    )
}

fn rgb_to_hsl(rgb: (u8, u8, u8)) -> (f32, f32, f32) {
    let raw = palette::Srgb::from_components(rgb);
    let raw_float: palette::Srgb<f32> = raw.into_format();
    let hsl: palette::Hsl = raw_float.into_color();
    let (h, s, l) = hsl.into_components();

    (h.into_positive_degrees(), s, l)
}
