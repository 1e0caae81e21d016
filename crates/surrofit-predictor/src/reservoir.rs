//! Bounded, class-balanced reservoir of training samples.
//!
//! An evolutionary run spends most generations near converged fitness, so
//! a plain FIFO reservoir would end up dominated by one outcome class and
//! starve the model of the rare extreme examples it most needs to
//! discriminate. The reservoir therefore partitions its capacity into a
//! high-value and a low-value retention quota and evicts from whichever
//! class is over its quota first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::sample::InputOutputPair;

/// Caller-supplied classification routing a sample to its retention
/// bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleClass {
    /// High-value outcome (e.g. fitness at or above the population median).
    High,
    /// Low-value outcome.
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    class: SampleClass,
    pair: InputOutputPair,
}

/// Bounded reservoir holding up to `total_capacity` training pairs across
/// a high-value and a low-value retention quota.
///
/// Eviction policy: a bucket with capacity 0 never accepts samples;
/// admission is otherwise free while the reservoir is below
/// `total_capacity`. Once full, inserting evicts the oldest entry of the
/// most-over-quota bucket, falling back to the incoming sample's bucket
/// and then to the globally oldest entry. Entries age FIFO within their
/// bucket throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedTrainingSet {
    high_capacity: usize,
    low_capacity: usize,
    total_capacity: usize,
    entries: VecDeque<Entry>,
}

impl WeightedTrainingSet {
    /// Creates an empty reservoir with the given bucket quotas and total
    /// capacity.
    #[must_use]
    pub fn new(high_capacity: usize, low_capacity: usize, total_capacity: usize) -> Self {
        Self {
            high_capacity,
            low_capacity,
            total_capacity,
            entries: VecDeque::with_capacity(total_capacity),
        }
    }

    /// Inserts a training pair under the given bucket classification,
    /// evicting per the reservoir policy when at capacity.
    pub fn add_individual_to_training_set(&mut self, pair: InputOutputPair, class: SampleClass) {
        if self.total_capacity == 0 || self.capacity_of(class) == 0 {
            return;
        }
        if self.entries.len() >= self.total_capacity {
            self.evict_for(class);
        }
        self.entries.push_back(Entry { class, pair });
    }

    /// Returns a copy of all currently held pairs, oldest first.
    ///
    /// The copy is intentionally detached from the live reservoir so that
    /// shuffling and splitting it for training never races with concurrent
    /// inserts from evaluation workers still reporting results.
    #[must_use]
    pub fn get_all_values(&self) -> Vec<InputOutputPair> {
        self.entries.iter().map(|entry| entry.pair.clone()).collect()
    }

    /// Total number of pairs currently held.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Number of pairs currently held in the given bucket.
    #[must_use]
    pub fn count_of(&self, class: SampleClass) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.class == class)
            .count()
    }

    fn capacity_of(&self, class: SampleClass) -> usize {
        match class {
            SampleClass::High => self.high_capacity,
            SampleClass::Low => self.low_capacity,
        }
    }

    /// Removes one entry to make room for an incoming sample of the given
    /// class. The victim bucket is the most-over-quota one; ties and the
    /// nothing-over-quota case fall back to the incoming bucket, then to
    /// the globally oldest entry.
    #[expect(clippy::cast_possible_wrap)]
    fn evict_for(&mut self, incoming: SampleClass) {
        let over = |class: SampleClass| {
            self.count_of(class) as isize - self.capacity_of(class) as isize
        };
        let high_over = over(SampleClass::High);
        let low_over = over(SampleClass::Low);

        let victim = if high_over > 0 || low_over > 0 {
            match high_over.cmp(&low_over) {
                std::cmp::Ordering::Greater => SampleClass::High,
                std::cmp::Ordering::Less => SampleClass::Low,
                std::cmp::Ordering::Equal => incoming,
            }
        } else {
            incoming
        };

        let position = self
            .entries
            .iter()
            .position(|entry| entry.class == victim);
        match position {
            Some(index) => {
                self.entries.remove(index);
            }
            // incoming bucket is empty; evict the globally oldest entry
            None => {
                self.entries.pop_front();
            }
        }
    }
}
