//! The shared predictor lifecycle contract and per-generation
//! bookkeeping.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized → Ready(untrained) → Ready(trained, accuracy=A) → …
//! ```
//!
//! There is no terminal state; a predictor cycles every generation. The
//! outer optimizer sequences the calls so that a generation's
//! `after_generation` completes before the next generation's
//! `at_start_of_generation` runs, which is what lets a generation's
//! predictions use that generation's freshly retrained model and
//! quartiles.
//!
//! # Concurrency
//!
//! Implementations guard all shared mutable state — the model handle, the
//! reservoir, accuracy scalars, and counters — behind a single exclusive
//! lock per predictor instance. Every trait method locks once for one
//! logical operation (one add, one predict, one retrain pass) and never
//! holds the lock across independent calls. Nothing suspends while
//! holding the lock: training and inference are synchronous calls into
//! the bound engine and always run to completion.

use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use surrofit_stats::quartiles::Quartiles;

use crate::{
    member::PopulationMember,
    metrics::{PredictionStats, RunMetrics},
    reservoir::{SampleClass, WeightedTrainingSet},
    sample::InputOutputPair,
    snapshot::{PredictorSnapshot, QuartileSnapshot},
};

/// Generation lifecycle contract shared by every predictor strategy.
///
/// All methods take `&self`; implementations are safe to share across the
/// outer optimizer's evaluation workers.
pub trait ResultPredictor: Send + Sync {
    /// Materializes the model handle. Idempotent: deserializes a persisted
    /// blob if one is pending, otherwise leaves or creates the handle per
    /// strategy; a no-op once a handle exists.
    fn setup(&self);

    /// Adds one genuinely evaluated input/output pair to the training
    /// reservoir.
    fn add_input_output_to_data(&self, inputs: &[f32], outputs: &[f32]);

    /// Offers predictions to unevaluated members at the start of a
    /// generation, substituting fitness where every gate passes.
    fn at_start_of_generation(
        &self,
        population: &mut [PopulationMember],
        run_metrics: &RunMetrics,
        generation: usize,
    );

    /// Harvests the generation's true evaluations, refreshes the quartile
    /// snapshot, and retrains the model.
    fn after_generation(
        &self,
        population: &[PopulationMember],
        generation: usize,
        base_score_error: f32,
    );

    /// Predicts the per-objective fitness for an input vector from the
    /// current model state, without mutating any training data. Returns
    /// `None` while no model is available.
    fn predict(&self, input: &[f32]) -> Option<Vec<f32>>;

    /// Current validation accuracy estimate; −1 means untrained or
    /// untrusted.
    fn network_accuracy(&self) -> f32;

    /// Copy of the per-generation prediction tallies.
    fn stats(&self) -> PredictionStats;

    /// Serializable copy of the complete predictor state.
    fn snapshot(&self) -> PredictorSnapshot;
}

/// Accepted-prediction budget for one generation.
#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn prediction_budget(max_prediction_ratio: f32, population_len: usize) -> usize {
    (max_prediction_ratio * population_len as f32).floor() as usize
}

/// State every strategy keeps behind its lock: the reservoir, the
/// quartile snapshot, the accuracy estimate, the tallies, and the seeded
/// RNG driving shuffles and acceptance gambles.
pub(crate) struct PredictorCore {
    pub reservoir: WeightedTrainingSet,
    pub quartiles: Option<QuartileSnapshot>,
    pub network_accuracy: f32,
    pub stats: PredictionStats,
    pub rng: Pcg32,
}

impl PredictorCore {
    /// Builds the core from persisted state, falling back to a fresh
    /// reservoir with the given capacities.
    pub(crate) fn from_snapshot(
        snapshot: &PredictorSnapshot,
        high_capacity: usize,
        low_capacity: usize,
        total_capacity: usize,
        rng: Pcg32,
    ) -> Self {
        let reservoir = snapshot
            .reservoir
            .clone()
            .unwrap_or_else(|| WeightedTrainingSet::new(high_capacity, low_capacity, total_capacity));
        Self {
            reservoir,
            quartiles: snapshot.quartiles,
            network_accuracy: snapshot.network_accuracy,
            stats: snapshot.stats.clone(),
            rng,
        }
    }

    /// Recomputes the quartile snapshot from the full population's
    /// fitness values. An empty population leaves the snapshot unchanged.
    pub(crate) fn update_quartiles(&mut self, population: &[PopulationMember]) {
        let fitnesses = population.iter().map(|member| member.fitness);
        if let Some(quartiles) = Quartiles::new(fitnesses) {
            self.quartiles = Some(QuartileSnapshot::from(quartiles));
        }
    }

    /// Retention bucket for a harvested sample: at or above the median is
    /// high-value. Before any quartiles exist everything routes low.
    pub(crate) fn bucket_for(&self, output_sum: f32) -> SampleClass {
        match self.quartiles {
            Some(quartiles) if output_sum >= quartiles.median => SampleClass::High,
            _ => SampleClass::Low,
        }
    }

    /// Detached, shuffled copy of the reservoir for a training/validation
    /// split.
    pub(crate) fn shuffled_training_data(&mut self) -> Vec<InputOutputPair> {
        let mut data = self.reservoir.get_all_values();
        data.shuffle(&mut self.rng);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn core() -> PredictorCore {
        PredictorCore::from_snapshot(
            &PredictorSnapshot::default(),
            5,
            5,
            10,
            Pcg32::seed_from_u64(7),
        )
    }

    #[test]
    fn budget_floors_the_population_fraction() {
        assert_eq!(prediction_budget(0.5, 8), 4);
        assert_eq!(prediction_budget(0.3, 10), 3);
        assert_eq!(prediction_budget(0.5, 5), 2);
        assert_eq!(prediction_budget(0.0, 100), 0);
        assert_eq!(prediction_budget(1.0, 7), 7);
    }

    #[test]
    fn quartiles_follow_population_fitness() {
        let mut core = core();
        assert!(core.quartiles.is_none());
        let population: Vec<PopulationMember> = (1..=8)
            .map(|i| {
                let mut member = PopulationMember::new(vec![0.0]);
                member.assign_evaluation(vec![i as f32]);
                member
            })
            .collect();
        core.update_quartiles(&population);
        let quartiles = core.quartiles.unwrap();
        assert_eq!(quartiles.first, 2.5);
        assert_eq!(quartiles.median, 4.5);
        assert_eq!(quartiles.third, 6.5);
    }

    #[test]
    fn bucket_splits_at_the_median() {
        let mut core = core();
        assert_eq!(core.bucket_for(100.0), SampleClass::Low);
        core.quartiles = Some(QuartileSnapshot {
            first: 2.0,
            median: 5.0,
            third: 8.0,
        });
        assert_eq!(core.bucket_for(5.0), SampleClass::High);
        assert_eq!(core.bucket_for(4.9), SampleClass::Low);
    }

    #[test]
    fn empty_population_preserves_quartiles() {
        let mut core = core();
        core.quartiles = Some(QuartileSnapshot {
            first: 1.0,
            median: 2.0,
            third: 3.0,
        });
        core.update_quartiles(&[]);
        assert_eq!(core.quartiles.unwrap().median, 2.0);
    }
}
