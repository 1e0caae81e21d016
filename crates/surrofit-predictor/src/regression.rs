//! Direct-value regression strategy.
//!
//! Fitness is trained and predicted directly on normalized input/output
//! pairs. Inputs are rescaled by the configured variable ranges; outputs
//! by a grow-only observed maximum (the minimum is fixed at 0). The bound
//! model is fine-tuned from its current weights for a fixed number of
//! epochs each generation rather than retrained from scratch.
//!
//! Acceptance is uncertainty-aware: the whole error-widened interval
//! `[prediction − error, prediction + error]` must lie strictly between
//! the configured quartile thresholds, and when the evaluate-anyway
//! gamble is enabled an accepted prediction is only substituted with
//! probability equal to the current network accuracy, so a trickle of
//! threshold-passing individuals still receives true evaluations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::{
    config::{ConfigError, RunParameters},
    engine::{BoxedRegressionModel, RegressionEngine, RegressionModel},
    member::PopulationMember,
    metrics::{PredictionStats, RunMetrics},
    predictor::{PredictorCore, ResultPredictor, prediction_budget},
    sample::{InputOutputPair, normalize},
    snapshot::{PredictorSnapshot, QuartileSnapshot},
};

/// Which population-fitness quartile a prediction threshold reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThresholdSelector {
    Unbounded,
    FirstQuartile,
    Median,
    ThirdQuartile,
}

impl ThresholdSelector {
    fn from_config(value: u32) -> Self {
        match value {
            1 => Self::FirstQuartile,
            2 => Self::Median,
            3 => Self::ThirdQuartile,
            _ => Self::Unbounded,
        }
    }

    /// Resolves the selector against a quartile snapshot. An unbounded
    /// selector yields the given infinity; a quartile selector with no
    /// snapshot yet yields `None` so the acceptance gate fails closed.
    fn resolve(self, quartiles: Option<QuartileSnapshot>, unbounded: f32) -> Option<f32> {
        match self {
            Self::Unbounded => Some(unbounded),
            Self::FirstQuartile => quartiles.map(|q| q.first),
            Self::Median => quartiles.map(|q| q.median),
            Self::ThirdQuartile => quartiles.map(|q| q.third),
        }
    }
}

struct RegressionState {
    core: PredictorCore,
    model: Option<BoxedRegressionModel>,
    pending_blob: Option<Vec<u8>>,
    max_output_values: Vec<f32>,
    training_error: f32,
}

/// Surrogate predictor that regresses fitness values directly.
pub struct RegressionPredictor {
    training_data_minimum: usize,
    minimum_accuracy: f32,
    max_prediction_ratio: f32,
    training_epochs_per_generation: usize,
    lower_threshold: ThresholdSelector,
    upper_threshold: ThresholdSelector,
    evaluate_anyway_chance: bool,
    input_min: Vec<f32>,
    input_max: Vec<f32>,
    output_min: Vec<f32>,
    engine: Box<dyn RegressionEngine>,
    state: Mutex<RegressionState>,
}

impl RegressionPredictor {
    /// Creates a predictor with an empty reservoir; the model itself is
    /// materialized by the first [`ResultPredictor::setup`] call.
    pub fn new(
        params: &RunParameters,
        engine: Box<dyn RegressionEngine>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::from_snapshot(params, engine, seed, &PredictorSnapshot::default())
    }

    /// Restores a predictor from persisted state; the model blob is
    /// deserialized by the first [`ResultPredictor::setup`] call.
    pub fn from_snapshot(
        params: &RunParameters,
        engine: Box<dyn RegressionEngine>,
        seed: u64,
        snapshot: &PredictorSnapshot,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let core = PredictorCore::from_snapshot(
            snapshot,
            params.training_data_high as usize,
            params.training_data_low as usize,
            params.training_data_total as usize,
            Pcg32::seed_from_u64(seed),
        );
        let (input_min, input_max) = params.input_bounds();
        let (output_min, output_max) = params.output_bounds();
        let max_output_values = if snapshot.max_output_values.len() == output_max.len() {
            snapshot.max_output_values.clone()
        } else {
            output_max
        };
        Ok(Self {
            training_data_minimum: params.training_data_minimum as usize,
            minimum_accuracy: params.minimum_accuracy,
            max_prediction_ratio: params.max_prediction_ratio,
            training_epochs_per_generation: params.training_epochs_per_generation as usize,
            lower_threshold: ThresholdSelector::from_config(params.lower_prediction_threshold),
            upper_threshold: ThresholdSelector::from_config(params.upper_prediction_threshold),
            evaluate_anyway_chance: params.evaluate_anyway_chance,
            input_min,
            input_max,
            output_min,
            engine,
            state: Mutex::new(RegressionState {
                core,
                model: None,
                pending_blob: snapshot.model_blob.clone(),
                max_output_values,
                training_error: snapshot.training_error,
            }),
        })
    }

    /// Whether the error-widened prediction interval lies strictly inside
    /// the acceptance thresholds.
    #[must_use]
    pub fn passes_threshold_check(
        prediction: f32,
        training_error: f32,
        lower_threshold: f32,
        upper_threshold: f32,
    ) -> bool {
        (prediction - training_error) > lower_threshold
            && (prediction + training_error) < upper_threshold
    }

    fn lock(&self) -> MutexGuard<'_, RegressionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Normalizes an input, runs the model, and rescales the outputs back
    /// into fitness space.
    fn infer_denormalized(
        &self,
        model: &dyn RegressionModel,
        max_output_values: &[f32],
        input: &[f32],
    ) -> Vec<f32> {
        let normalized = normalize(input, &self.input_min, &self.input_max);
        model
            .infer(&normalized)
            .iter()
            .zip(max_output_values.iter().zip(&self.output_min))
            .map(|(&value, (&max, &min))| value * (max - min) + min)
            .collect()
    }

    fn add_sample_locked(&self, state: &mut RegressionState, inputs: &[f32], outputs: &[f32]) {
        // observed output maxima only ever grow
        for (max, &value) in state.max_output_values.iter_mut().zip(outputs) {
            *max = max.max(value);
        }
        let pair = InputOutputPair::with_normalized_inputs(
            inputs.to_vec(),
            outputs.to_vec(),
            &self.input_min,
            &self.input_max,
        );
        let class = state.core.bucket_for(pair.output_sum());
        state.core.reservoir.add_individual_to_training_set(pair, class);
    }

    /// Fine-tunes the current model for the configured epoch count, then
    /// refreshes accuracy as `1 − mean_absolute_error / base_score_error`
    /// over the held-out split. The quotient may go negative when the
    /// model is worse than the baseline; a negative accuracy fails the
    /// minimum-accuracy gate like any other.
    #[expect(clippy::cast_precision_loss)]
    fn train_locked(&self, state: &mut RegressionState, base_score_error: f32) {
        if state.core.reservoir.count() < self.training_data_minimum {
            state.core.network_accuracy = -1.0;
            return;
        }
        let RegressionState {
            core,
            model,
            max_output_values,
            training_error,
            ..
        } = state;
        let Some(model) = model.as_mut() else {
            core.network_accuracy = -1.0;
            return;
        };

        let data = core.shuffled_training_data();
        let train_len = data.len() * 4 / 5;
        let (training, validation) = data.split_at(train_len);
        if training.is_empty() || validation.is_empty() {
            core.network_accuracy = -1.0;
            return;
        }

        let inputs: Vec<Vec<f32>> = training
            .iter()
            .map(|pair| {
                pair.normalized_inputs().map_or_else(
                    || normalize(pair.inputs(), &self.input_min, &self.input_max),
                    <[f32]>::to_vec,
                )
            })
            .collect();
        let targets: Vec<Vec<f32>> = training
            .iter()
            .map(|pair| normalize(pair.outputs(), &self.output_min, max_output_values))
            .collect();
        for _ in 0..self.training_epochs_per_generation {
            model.train_epoch(&inputs, &targets);
        }

        // held-out error is measured in denormalized fitness space
        let mut differences = vec![0.0_f32; self.output_min.len()];
        for pair in validation {
            let predicted = self.infer_denormalized(&**model, max_output_values, pair.inputs());
            for (difference, (&truth, &prediction)) in differences
                .iter_mut()
                .zip(pair.outputs().iter().zip(&predicted))
            {
                *difference += (truth - prediction).abs();
            }
        }
        let mean_absolute_error: f32 = differences
            .iter()
            .map(|difference| difference / validation.len() as f32)
            .sum();
        *training_error = mean_absolute_error;
        core.network_accuracy = if base_score_error > 0.0 {
            1.0 - mean_absolute_error / base_score_error
        } else {
            -1.0
        };
    }
}

impl ResultPredictor for RegressionPredictor {
    fn setup(&self) {
        let mut state = self.lock();
        let state = &mut *state;
        if state.model.is_some() {
            return;
        }
        if let Some(blob) = state.pending_blob.as_deref() {
            state.model = self.engine.load(blob);
            if state.model.is_none() {
                // corrupt blob: fall back to a fresh model, untrusted
                state.core.network_accuracy = -1.0;
            }
        }
        if state.model.is_none() {
            state.model = Some(
                self.engine
                    .create(self.input_min.len(), self.output_min.len()),
            );
        }
    }

    fn add_input_output_to_data(&self, inputs: &[f32], outputs: &[f32]) {
        let mut state = self.lock();
        self.add_sample_locked(&mut state, inputs, outputs);
    }

    fn at_start_of_generation(
        &self,
        population: &mut [PopulationMember],
        run_metrics: &RunMetrics,
        generation: usize,
    ) {
        let mut state = self.lock();
        let state = &mut *state;
        if state.core.network_accuracy < self.minimum_accuracy {
            return;
        }
        let Some(model) = state.model.as_deref() else {
            return;
        };
        let latest = run_metrics.latest().map(|record| QuartileSnapshot {
            first: record.first,
            median: record.median,
            third: record.third,
        });
        let Some(lower) = self.lower_threshold.resolve(latest, f32::NEG_INFINITY) else {
            return;
        };
        let Some(upper) = self.upper_threshold.resolve(latest, f32::INFINITY) else {
            return;
        };

        let budget = prediction_budget(self.max_prediction_ratio, population.len());
        let mut accepted = 0;
        for member in population.iter_mut() {
            if accepted >= budget {
                break;
            }
            if member.is_evaluated() {
                continue;
            }
            let result = self.infer_denormalized(model, &state.max_output_values, &member.vector);
            let sum: f32 = result.iter().sum();
            let passes = Self::passes_threshold_check(sum, state.training_error, lower, upper);
            // the gamble keeps a ground-truth trickle flowing even for
            // threshold-passing individuals
            let substitute = passes
                && (!self.evaluate_anyway_chance
                    || state.core.rng.random::<f32>() < state.core.network_accuracy);
            state.core.stats.record_prediction(generation, substitute);
            if substitute {
                member.fitness = sum;
                member.objectives_fitness = result;
                member.predicted = true;
                accepted += 1;
            }
        }
    }

    fn after_generation(
        &self,
        population: &[PopulationMember],
        generation: usize,
        base_score_error: f32,
    ) {
        let mut state = self.lock();
        let state = &mut *state;

        // score would-have verdicts against the truth with the model and
        // thresholds that issued this generation's predictions
        if state.core.network_accuracy >= self.minimum_accuracy
            && let Some(model) = state.model.as_deref()
            && let Some(lower) = self
                .lower_threshold
                .resolve(state.core.quartiles, f32::NEG_INFINITY)
            && let Some(upper) = self
                .upper_threshold
                .resolve(state.core.quartiles, f32::INFINITY)
        {
            for member in population
                .iter()
                .filter(|member| member.is_evaluated() && !member.predicted)
            {
                let predicted_sum: f32 = self
                    .infer_denormalized(model, &state.max_output_values, &member.vector)
                    .iter()
                    .sum();
                let predicted_pass = Self::passes_threshold_check(
                    predicted_sum,
                    state.training_error,
                    lower,
                    upper,
                );
                let truth_pass = member.fitness > lower && member.fitness < upper;
                if predicted_pass && !truth_pass {
                    state.core.stats.record_false_positive(generation);
                } else if !predicted_pass && truth_pass {
                    state.core.stats.record_false_negative(generation);
                }
            }
        }

        state.core.update_quartiles(population);
        for member in population
            .iter()
            .filter(|member| member.is_evaluated() && !member.predicted)
        {
            self.add_sample_locked(state, &member.vector, &member.objectives_fitness);
        }
        self.train_locked(state, base_score_error);
    }

    fn predict(&self, input: &[f32]) -> Option<Vec<f32>> {
        let state = self.lock();
        let model = state.model.as_deref()?;
        Some(self.infer_denormalized(model, &state.max_output_values, input))
    }

    fn network_accuracy(&self) -> f32 {
        self.lock().core.network_accuracy
    }

    fn stats(&self) -> PredictionStats {
        self.lock().core.stats.clone()
    }

    fn snapshot(&self) -> PredictorSnapshot {
        let state = self.lock();
        PredictorSnapshot {
            model_blob: state
                .model
                .as_deref()
                .map(|model| model.to_blob())
                .or_else(|| state.pending_blob.clone()),
            reservoir: Some(state.core.reservoir.clone()),
            quartiles: state.core.quartiles,
            network_accuracy: state.core.network_accuracy,
            training_error: state.training_error,
            max_output_values: state.max_output_values.clone(),
            stats: state.core.stats.clone(),
        }
    }
}
