//! Run metrics supplied by the outer optimizer and the predictor's own
//! observability counters.

use serde::{Deserialize, Serialize};
use surrofit_stats::quartiles::Quartiles;

/// Quartile record of true population fitness for one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationQuartiles {
    /// Generation the quartiles were computed for.
    pub generation: usize,
    /// First quartile of the generation's fitness values.
    pub first: f32,
    /// Median of the generation's fitness values.
    pub median: f32,
    /// Third quartile of the generation's fitness values.
    pub third: f32,
}

/// Ordered-by-generation quartile records of true population fitness.
///
/// The outer optimizer records one entry per generation; the predictor
/// layer only ever reads the latest. Before any record exists every
/// threshold derived from these metrics fails closed.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    records: Vec<GenerationQuartiles>,
}

impl RunMetrics {
    /// Creates an empty metrics store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the quartile record for a generation.
    pub fn record(&mut self, generation: usize, quartiles: Quartiles) {
        self.records.push(GenerationQuartiles {
            generation,
            first: quartiles.first,
            median: quartiles.median,
            third: quartiles.third,
        });
    }

    /// Returns the most recently recorded quartiles, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&GenerationQuartiles> {
        self.records.last()
    }

    /// Returns all records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[GenerationQuartiles] {
        &self.records
    }
}

/// Per-generation counters for one predictor instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTally {
    /// Predictions issued (model queried for an unevaluated member).
    pub issued: u32,
    /// Predictions accepted and substituted for a true evaluation.
    pub accepted: u32,
    /// Members the model would have substituted whose true fitness failed
    /// the threshold.
    pub false_positives: u32,
    /// Members the model rejected whose true fitness passed the threshold.
    pub false_negatives: u32,
}

/// Prediction/acceptance/false-positive/false-negative tallies, indexed by
/// generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionStats {
    generations: Vec<GenerationTally>,
}

impl PredictionStats {
    /// Creates an empty tally store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tally_mut(&mut self, generation: usize) -> &mut GenerationTally {
        if self.generations.len() <= generation {
            self.generations
                .resize(generation + 1, GenerationTally::default());
        }
        &mut self.generations[generation]
    }

    /// Records one issued prediction, counted as accepted when it was
    /// substituted for a true evaluation.
    pub fn record_prediction(&mut self, generation: usize, accepted: bool) {
        let tally = self.tally_mut(generation);
        tally.issued += 1;
        if accepted {
            tally.accepted += 1;
        }
    }

    /// Records a would-have-substituted verdict contradicted by the true
    /// fitness.
    pub fn record_false_positive(&mut self, generation: usize) {
        self.tally_mut(generation).false_positives += 1;
    }

    /// Records a rejected verdict the true fitness would have passed.
    pub fn record_false_negative(&mut self, generation: usize) {
        self.tally_mut(generation).false_negatives += 1;
    }

    /// Returns the tally for a generation, if any prediction activity was
    /// recorded for it.
    #[must_use]
    pub fn generation(&self, generation: usize) -> Option<&GenerationTally> {
        self.generations.get(generation)
    }

    /// Sums all per-generation tallies.
    #[must_use]
    pub fn totals(&self) -> GenerationTally {
        let mut totals = GenerationTally::default();
        for tally in &self.generations {
            totals.issued += tally.issued;
            totals.accepted += tally.accepted;
            totals.false_positives += tally.false_positives;
            totals.false_negatives += tally.false_negatives;
        }
        totals
    }
}
