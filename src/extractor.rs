use crate::{
    color_box::ColorBox,
    histogram::{modify_width, DEFAULT_PRECISION},
    partitioner::PartitionState,
    swatch::Swatch,
};

/// Turns the final boxes of a partition into swatches.
#[derive(Debug, Clone, Copy)]
pub struct PaletteExtractor {
    precision: u8,
}

impl PaletteExtractor {
    /// `precision` is the channel width the histogram was built with; representative colors are scaled
    /// back up to 8 bits from it.
    pub fn new(precision: u8) -> Self {
        Self { precision }
    }

    /// One swatch per box, in the order the partition holds them.
    pub fn extract(&self, state: &PartitionState<'_>) -> Vec<Swatch> {
        state.boxes().iter().map(|vbox| self.average_color(vbox)).collect()
    }

    fn average_color(&self, vbox: &ColorBox<'_>) -> Swatch {
        // weighted sums of each channel based on the color populations
        let (pop, red_sum, green_sum, blue_sum) =
            vbox.entries()
                .iter()
                .fold((0u64, 0u64, 0u64, 0u64), |(pop, red_sum, green_sum, blue_sum), entry| {
                    let (r, g, b) = entry.color();
                    let count = entry.count();

                    (
                        pop + count,
                        red_sum + u64::from(r) * count,
                        green_sum + u64::from(g) * count,
                        blue_sum + u64::from(b) * count,
                    )
                });

        let rgb = (
            self.scale_up(weighted_mean(red_sum, pop)),
            self.scale_up(weighted_mean(green_sum, pop)),
            self.scale_up(weighted_mean(blue_sum, pop)),
        );

        Swatch::new(rgb, vbox.population())
    }

    fn scale_up(&self, value: u8) -> u8 {
        modify_width(value, self.precision, DEFAULT_PRECISION)
    }
}

// rounds half away from zero
fn weighted_mean(sum: u64, population: u64) -> u8 {
    (sum as f64 / population as f64).round() as u8
}
