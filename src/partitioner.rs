use crate::{
    color_box::{ColorBox, NotSplittable},
    histogram::HistogramEntry,
};
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    num::NonZeroUsize,
};
use tracing::trace;

/// Where the partitioning currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fewer boxes than the target and at least one box may still split.
    Active,
    /// No box can split any further.
    Exhausted,
    /// The box count reached the target.
    Done,
}

/// Repeatedly splits the most populous splittable box until the target box count is reached or
/// nothing is left to split.
pub struct MedianCutPartitioner<'a> {
    target: NonZeroUsize,
    // boxes not yet known to be unsplittable, highest ranked on top
    active: BinaryHeap<Ranked<'a>>,
    // boxes that refused to split because they hold a single color
    frozen: Vec<Ranked<'a>>,
    next_sequence: usize,
}

/// The boxes left when partitioning stops. Together they hold every histogram entry exactly once.
pub struct PartitionState<'a> {
    boxes: Vec<ColorBox<'a>>,
    phase: Phase,
}

// a box paired with its creation sequence number so equally ranked boxes pop in creation order
struct Ranked<'a> {
    sequence: usize,
    vbox: ColorBox<'a>,
}

impl<'a> MedianCutPartitioner<'a> {
    pub fn new(entries: &'a mut [HistogramEntry], target: NonZeroUsize) -> Self {
        let mut partitioner = Self {
            target,
            active: BinaryHeap::with_capacity(target.get()),
            frozen: Vec::new(),
            next_sequence: 0,
        };

        partitioner.push(ColorBox::new(entries));
        partitioner
    }

    pub fn box_count(&self) -> usize {
        self.active.len() + self.frozen.len()
    }

    pub fn phase(&self) -> Phase {
        if self.box_count() >= self.target.get() {
            Phase::Done
        } else if self.active.is_empty() {
            Phase::Exhausted
        } else {
            Phase::Active
        }
    }

    /// Split the highest ranked box once, or freeze it if it turns out it can't be split.
    pub fn step(&mut self) -> Phase {
        if self.phase() != Phase::Active {
            return self.phase();
        }

        if let Some(Ranked { sequence, vbox }) = self.active.pop() {
            match vbox.split() {
                Ok((lower, upper)) => {
                    trace!(
                        sequence,
                        lower = lower.population(),
                        upper = upper.population(),
                        "split box"
                    );

                    self.push(lower);
                    self.push(upper);
                }
                Err(NotSplittable(vbox)) => self.frozen.push(Ranked { sequence, vbox }),
            }
        }

        self.phase()
    }

    pub fn run(mut self) -> PartitionState<'a> {
        let phase = loop {
            match self.step() {
                Phase::Active => continue,
                phase => break phase,
            }
        };

        let mut boxes = self.active.into_vec();
        boxes.append(&mut self.frozen);
        boxes.sort_by_key(|ranked| ranked.sequence);

        PartitionState {
            boxes: boxes.into_iter().map(|ranked| ranked.vbox).collect(),
            phase,
        }
    }

    fn push(&mut self, vbox: ColorBox<'a>) {
        self.active.push(Ranked {
            sequence: self.next_sequence,
            vbox,
        });
        self.next_sequence += 1;
    }
}

impl<'a> PartitionState<'a> {
    /// The final boxes in the order they were created.
    pub fn boxes(&self) -> &[ColorBox<'a>] {
        &self.boxes
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl Ranked<'_> {
    fn key(&self) -> (u64, u8, Reverse<usize>) {
        let axis = self.vbox.longest_axis();
        (self.vbox.population(), self.vbox.width(axis), Reverse(self.sequence))
    }
}

impl Eq for Ranked<'_> {}
impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(colors: &[((u8, u8, u8), u64)]) -> Vec<HistogramEntry> {
        colors
            .iter()
            .map(|&(color, count)| HistogramEntry::new(color, count))
            .collect()
    }

    fn target(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn starts_with_a_single_box() {
        let mut entries = entries(&[((0, 0, 0), 1), ((255, 255, 255), 1)]);
        let partitioner = MedianCutPartitioner::new(&mut entries, target(4));

        assert_eq!(partitioner.box_count(), 1);
        assert_eq!(partitioner.phase(), Phase::Active);
    }

    #[test]
    fn target_of_one_is_done_immediately() {
        let mut entries = entries(&[((0, 0, 0), 1), ((255, 255, 255), 1)]);
        let state = MedianCutPartitioner::new(&mut entries, target(1)).run();

        assert_eq!(state.phase(), Phase::Done);
        assert_eq!(state.boxes().len(), 1);
        assert_eq!(state.boxes()[0].population(), 2);
    }

    #[test]
    fn each_step_adds_one_box() {
        let mut entries = entries(&[((0, 0, 0), 1), ((80, 0, 0), 1), ((160, 0, 0), 1), ((240, 0, 0), 1)]);
        let mut partitioner = MedianCutPartitioner::new(&mut entries, target(3));

        assert_eq!(partitioner.step(), Phase::Active);
        assert_eq!(partitioner.box_count(), 2);
        assert_eq!(partitioner.step(), Phase::Done);
        assert_eq!(partitioner.box_count(), 3);
        assert_eq!(partitioner.step(), Phase::Done);
        assert_eq!(partitioner.box_count(), 3);
    }

    #[test]
    fn exhausts_when_every_box_is_a_single_color() {
        let mut entries = entries(&[((0, 0, 0), 5), ((10, 10, 10), 3), ((20, 20, 20), 1)]);
        let state = MedianCutPartitioner::new(&mut entries, target(10)).run();

        assert_eq!(state.phase(), Phase::Exhausted);
        assert_eq!(state.boxes().len(), 3);
        assert!(state.boxes().iter().all(|vbox| vbox.entries().len() == 1));
    }

    #[test]
    fn splits_the_most_populous_box_first() {
        // first split separates the two dark colors (weight 2) from the two bright ones (weight 20)
        let mut entries = entries(&[((0, 0, 0), 1), ((10, 0, 0), 1), ((200, 0, 0), 10), ((250, 0, 0), 10)]);
        let state = MedianCutPartitioner::new(&mut entries, target(3)).run();
        let populations = state.boxes().iter().map(|vbox| vbox.population()).collect::<Vec<_>>();

        assert_eq!(populations, vec![2, 10, 10]);
    }

    #[test]
    fn equal_population_ties_go_to_the_wider_box() {
        let mut entries = entries(&[((0, 0, 0), 1), ((2, 0, 0), 1), ((100, 0, 0), 1), ((200, 0, 0), 1)]);
        let state = MedianCutPartitioner::new(&mut entries, target(3)).run();
        let ranges = state
            .boxes()
            .iter()
            .map(|vbox| vbox.range(crate::color_box::Channel::Red))
            .collect::<Vec<_>>();

        // the narrow (0..2) box is kept whole while (100..200) splits
        assert_eq!(ranges, vec![(0, 2), (100, 100), (200, 200)]);
    }

    #[test]
    fn equal_rank_ties_go_to_the_earlier_box() {
        let mut entries = entries(&[((0, 0, 0), 1), ((10, 0, 0), 1), ((100, 0, 0), 1), ((110, 0, 0), 1)]);
        let state = MedianCutPartitioner::new(&mut entries, target(3)).run();
        let ranges = state
            .boxes()
            .iter()
            .map(|vbox| vbox.range(crate::color_box::Channel::Red))
            .collect::<Vec<_>>();

        // (0..10) and (100..110) tie on population and width, the first one created splits
        assert_eq!(ranges, vec![(100, 110), (0, 0), (10, 10)]);
    }

    #[test]
    fn single_color_box_is_frozen_without_counting_as_a_split() {
        let mut entries = entries(&[((0, 0, 0), 10), ((100, 0, 0), 1), ((200, 0, 0), 1)]);
        let mut partitioner = MedianCutPartitioner::new(&mut entries, target(10));

        assert_eq!(partitioner.step(), Phase::Active);
        assert_eq!(partitioner.box_count(), 2);
        // the heavy single color ranks first and is frozen
        assert_eq!(partitioner.step(), Phase::Active);
        assert_eq!(partitioner.box_count(), 2);
        assert_eq!(partitioner.step(), Phase::Active);
        assert_eq!(partitioner.box_count(), 3);

        let state = partitioner.run();
        assert_eq!(state.phase(), Phase::Exhausted);
        assert_eq!(state.boxes().len(), 3);
    }

    #[test]
    fn boxes_partition_the_entries() {
        let colors = (0..50u8)
            .map(|i| ((i * 5, 255 - i * 3, i.wrapping_mul(37)), u64::from(i % 7) + 1))
            .collect::<Vec<_>>();
        let total = colors.iter().map(|(_, count)| count).sum::<u64>();
        let mut entries = entries(&colors);
        let state = MedianCutPartitioner::new(&mut entries, target(8)).run();

        assert_eq!(state.boxes().len(), 8);
        assert_eq!(state.boxes().iter().map(|vbox| vbox.entries().len()).sum::<usize>(), 50);
        assert_eq!(state.boxes().iter().map(|vbox| vbox.population()).sum::<u64>(), total);
    }
}
