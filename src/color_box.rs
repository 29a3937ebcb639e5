use crate::histogram::HistogramEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

/// An axis-aligned region of color space over a disjoint slice of histogram entries.
///
/// The channel ranges and the population are computed once when the box is created. The only
/// operation that reorders the entries is [`ColorBox::split`], which consumes the box, so the cached
/// values always describe the entries the box holds.
#[derive(Debug)]
pub struct ColorBox<'a> {
    entries: &'a mut [HistogramEntry],
    population: u64,
    // min, max
    ranges: [(u8, u8); 3],
}

/// Returned by [`ColorBox::split`] for a box that holds a single color. Gives the box back.
#[derive(Debug)]
pub struct NotSplittable<'a>(pub ColorBox<'a>);

impl Channel {
    /// All channels in tie-breaking priority order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn of(self, (r, g, b): (u8, u8, u8)) -> u8 {
        match self {
            Channel::Red => r,
            Channel::Green => g,
            Channel::Blue => b,
        }
    }

    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

impl<'a> ColorBox<'a> {
    pub fn new(entries: &'a mut [HistogramEntry]) -> Self {
        let mut population = 0;
        let mut ranges = [(u8::MAX, u8::MIN); 3];

        for entry in entries.iter() {
            population += entry.count();

            for channel in Channel::ALL {
                let value = channel.of(entry.color());
                let (min, max) = &mut ranges[channel.index()];

                *min = (*min).min(value);
                *max = (*max).max(value);
            }
        }

        Self {
            entries,
            population,
            ranges,
        }
    }

    pub fn entries(&self) -> &[HistogramEntry] {
        &*self.entries
    }

    /// Sum of the pixel counts of every entry in the box.
    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn range(&self, channel: Channel) -> (u8, u8) {
        self.ranges[channel.index()]
    }

    pub fn width(&self, channel: Channel) -> u8 {
        let (min, max) = self.range(channel);
        max.saturating_sub(min)
    }

    /// The channel with the widest range. Ties go to red, then green.
    pub fn longest_axis(&self) -> Channel {
        let red_length = self.width(Channel::Red);
        let green_length = self.width(Channel::Green);
        let blue_length = self.width(Channel::Blue);

        if red_length >= green_length && red_length >= blue_length {
            Channel::Red
        } else if green_length >= blue_length {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    pub fn is_splittable(&self) -> bool {
        self.entries.len() > 1 && Channel::ALL.into_iter().any(|channel| self.width(channel) > 0)
    }

    /// Split the box in two along its longest axis at the weighted median.
    ///
    /// The entries are ordered by their value on the axis and cut where the cumulative pixel count of
    /// the lower half is as close as possible to half the population without exceeding it. Both halves
    /// always receive at least one entry.
    pub fn split(mut self) -> Result<(ColorBox<'a>, ColorBox<'a>), NotSplittable<'a>> {
        if !self.is_splittable() {
            return Err(NotSplittable(self));
        }

        let axis = self.longest_axis();
        // stable, so entries equal on the axis keep their histogram order
        self.entries.sort_by_key(|entry| axis.of(entry.color()));

        let split_point = self.find_split_point();
        let entries = self.entries;
        let (lower, upper) = entries.split_at_mut(split_point);

        Ok((ColorBox::new(lower), ColorBox::new(upper)))
    }

    fn find_split_point(&self) -> usize {
        let population = self.population;
        let mut cumulative = 0u64;
        let mut split_point = 1;

        // never consider the last entry so the upper half can't end up empty
        for (i, entry) in self.entries[..self.entries.len() - 1].iter().enumerate() {
            cumulative += entry.count();

            if cumulative * 2 > population {
                break;
            }

            split_point = i + 1;
        }

        split_point
    }
}
