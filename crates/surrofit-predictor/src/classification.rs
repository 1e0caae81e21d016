//! Quartile-bucketed classification strategy.
//!
//! Continuous fitness (the sum of per-objective components) is remapped
//! onto `total_classes` ordinal buckets using the last computed population
//! quartiles, and the bound classifier is trained on those labels.
//! Inference reverses the same piecewise-linear mapping to turn a
//! predicted class back into a fitness estimate.
//!
//! The mapping is deliberately asymmetric at the extremes: class 0 maps
//! back to one below the first quartile and the top class to one above
//! the third quartile. The ±1 offsets are conservative margins so a
//! substituted extreme never lands exactly on an acceptance boundary.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::{
    config::{ConfigError, RunParameters},
    engine::{BoxedClassifierModel, ClassifierEngine},
    member::PopulationMember,
    metrics::{PredictionStats, RunMetrics},
    predictor::{PredictorCore, ResultPredictor, prediction_budget},
    sample::InputOutputPair,
    snapshot::{PredictorSnapshot, QuartileSnapshot},
};

/// Maps a fitness sum onto an ordinal class using the quartile
/// boundaries.
///
/// Below the first quartile is class 0 and at or above the third quartile
/// is the top class; the two middle segments interpolate linearly with
/// truncation, `mid = (total_classes - 1) / 2` classes per segment.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn classify_fitness(sum: f32, quartiles: QuartileSnapshot, total_classes: usize) -> usize {
    let mid = (total_classes - 1) / 2;
    if sum < quartiles.first {
        return 0;
    }
    if sum < quartiles.median {
        let ratio = 1.0 + (sum - quartiles.first) * mid as f32 / (quartiles.median - quartiles.first);
        return ratio as usize;
    }
    if sum < quartiles.third {
        let ratio = 1.0
            + mid as f32
            + (sum - quartiles.median) * mid as f32 / (quartiles.third - quartiles.median);
        return ratio as usize;
    }
    total_classes - 1
}

/// Inverts [`classify_fitness`]: maps a class index back to a fitness
/// estimate on the matching quartile segment, with the conservative ±1
/// margins at the extreme classes.
#[expect(clippy::cast_precision_loss)]
fn class_to_fitness(class: usize, quartiles: QuartileSnapshot, total_classes: usize) -> f32 {
    let mid = (total_classes - 1) / 2;
    if class == 0 {
        return quartiles.first - 1.0;
    }
    if (class as f32) < (total_classes as f32 - 1.0) / 2.0 {
        let dif = quartiles.median - quartiles.first;
        return quartiles.first + dif * (class as f32 / mid as f32) - 1.0;
    }
    if class < total_classes - 1 {
        let dif = quartiles.third - quartiles.median;
        return quartiles.median + dif * ((class - mid) as f32 / mid as f32) - 1.0;
    }
    quartiles.third + 1.0
}

struct ClassificationState {
    core: PredictorCore,
    model: Option<BoxedClassifierModel>,
    pending_blob: Option<Vec<u8>>,
}

/// Surrogate predictor that buckets fitness into quartile-derived classes
/// before training the bound classifier.
pub struct ClassificationPredictor {
    threshold_class: usize,
    total_classes: usize,
    training_data_minimum: usize,
    minimum_accuracy: f32,
    max_prediction_ratio: f32,
    engine: Box<dyn ClassifierEngine>,
    state: Mutex<ClassificationState>,
}

impl ClassificationPredictor {
    /// Creates a predictor with an empty reservoir and no model.
    pub fn new(
        params: &RunParameters,
        engine: Box<dyn ClassifierEngine>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::from_snapshot(params, engine, seed, &PredictorSnapshot::default())
    }

    /// Restores a predictor from persisted state; the model blob is
    /// deserialized by the first [`ResultPredictor::setup`] call.
    pub fn from_snapshot(
        params: &RunParameters,
        engine: Box<dyn ClassifierEngine>,
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
        Ok(Self {
            threshold_class: params.threshold_class as usize,
            total_classes: params.total_classes as usize,
            training_data_minimum: params.training_data_minimum as usize,
            minimum_accuracy: params.minimum_accuracy,
            max_prediction_ratio: params.max_prediction_ratio,
            engine,
            state: Mutex::new(ClassificationState {
                core,
                model: None,
                pending_blob: snapshot.model_blob.clone(),
            }),
        })
    }

    /// Whether a predicted class is trusted enough to substitute for a
    /// real evaluation.
    #[must_use]
    pub fn passes_threshold_check(&self, class: usize) -> bool {
        class >= self.threshold_class
    }

    fn lock(&self) -> MutexGuard<'_, ClassificationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add_sample_locked(state: &mut ClassificationState, inputs: &[f32], outputs: &[f32]) {
        let pair = InputOutputPair::new(inputs.to_vec(), outputs.to_vec());
        let class = state.core.bucket_for(pair.output_sum());
        state.core.reservoir.add_individual_to_training_set(pair, class);
    }

    /// Retrains from a shuffled reservoir snapshot, swapping the model in
    /// on success. Skipped below the training minimum or before any
    /// quartiles exist (accuracy forced to −1 so every gate fails
    /// closed); a failed fit keeps the previous model and accuracy.
    #[expect(clippy::cast_precision_loss)]
    fn train_locked(&self, state: &mut ClassificationState) {
        if state.core.reservoir.count() < self.training_data_minimum {
            state.core.network_accuracy = -1.0;
            return;
        }
        let Some(quartiles) = state.core.quartiles else {
            state.core.network_accuracy = -1.0;
            return;
        };

        let data = state.core.shuffled_training_data();
        let train_len = data.len() * 4 / 5;
        let (training, validation) = data.split_at(train_len);
        if training.is_empty() || validation.is_empty() {
            state.core.network_accuracy = -1.0;
            return;
        }

        let inputs: Vec<Vec<f32>> = training.iter().map(|pair| pair.inputs().to_vec()).collect();
        let classes: Vec<usize> = training
            .iter()
            .map(|pair| classify_fitness(pair.output_sum(), quartiles, self.total_classes))
            .collect();
        let Some(model) = self.engine.fit(&inputs, &classes, self.total_classes) else {
            return;
        };

        let mut error = 0.0_f32;
        for pair in validation {
            let computed = model.decide(pair.inputs());
            let original = classify_fitness(pair.output_sum(), quartiles, self.total_classes);
            error += (computed as f32 - original as f32).abs() / (self.total_classes - 1) as f32;
        }
        state.core.network_accuracy = 1.0 - error / validation.len() as f32;
        state.model = Some(model);
    }
}

impl ResultPredictor for ClassificationPredictor {
    fn setup(&self) {
        let mut state = self.lock();
        let state = &mut *state;
        if state.model.is_none()
            && let Some(blob) = state.pending_blob.as_deref()
        {
            state.model = self.engine.load(blob);
        }
    }

    fn add_input_output_to_data(&self, inputs: &[f32], outputs: &[f32]) {
        let mut state = self.lock();
        Self::add_sample_locked(&mut state, inputs, outputs);
    }

    fn at_start_of_generation(
        &self,
        population: &mut [PopulationMember],
        _run_metrics: &RunMetrics,
        generation: usize,
    ) {
        let mut state = self.lock();
        let state = &mut *state;
        if state.core.network_accuracy < self.minimum_accuracy {
            return;
        }
        let Some(quartiles) = state.core.quartiles else {
            return;
        };
        let Some(model) = state.model.as_deref() else {
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
            let class = model.decide(&member.vector);
            let passes = self.passes_threshold_check(class);
            state.core.stats.record_prediction(generation, passes);
            if passes {
                let estimate = class_to_fitness(class, quartiles, self.total_classes);
                member.fitness = estimate;
                member.objectives_fitness = vec![estimate];
                member.predicted = true;
                accepted += 1;
            }
        }
    }

    fn after_generation(
        &self,
        population: &[PopulationMember],
        generation: usize,
        _base_score_error: f32,
    ) {
        let mut state = self.lock();
        let state = &mut *state;

        // score the verdicts this generation's model would have issued
        // against the now-known truth, before anything is refreshed
        if state.core.network_accuracy >= self.minimum_accuracy
            && let Some(model) = state.model.as_deref()
            && let Some(quartiles) = state.core.quartiles
        {
            for member in population
                .iter()
                .filter(|member| member.is_evaluated() && !member.predicted)
            {
                let predicted_pass = self.passes_threshold_check(model.decide(&member.vector));
                let truth_class = classify_fitness(member.fitness, quartiles, self.total_classes);
                let truth_pass = self.passes_threshold_check(truth_class);
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
            Self::add_sample_locked(state, &member.vector, &member.objectives_fitness);
        }
        self.train_locked(state);
    }

    fn predict(&self, input: &[f32]) -> Option<Vec<f32>> {
        let state = self.lock();
        let model = state.model.as_deref()?;
        let quartiles = state.core.quartiles?;
        let class = model.decide(input);
        Some(vec![class_to_fitness(class, quartiles, self.total_classes)])
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
            training_error: 0.0,
            max_output_values: Vec::new(),
            stats: state.core.stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{DecisionVariable, ObjectiveSpec, VariableObjective},
        engine::ClassifierModel,
    };

    const QUARTILES: QuartileSnapshot = QuartileSnapshot {
        first: 2.5,
        median: 4.5,
        third: 6.5,
    };

    /// Test engine whose models classify exactly like the generation's
    /// quartile mapping, so validation accuracy is always 1.0.
    struct OracleEngine;

    struct OracleModel;

    impl ClassifierModel for OracleModel {
        fn decide(&self, input: &[f32]) -> usize {
            classify_fitness(input[0], QUARTILES, 4)
        }

        fn to_blob(&self) -> Vec<u8> {
            b"oracle".to_vec()
        }
    }

    impl ClassifierEngine for OracleEngine {
        fn fit(
            &self,
            _inputs: &[Vec<f32>],
            _classes: &[usize],
            _total_classes: usize,
        ) -> Option<BoxedClassifierModel> {
            Some(Box::new(OracleModel))
        }

        fn load(&self, blob: &[u8]) -> Option<BoxedClassifierModel> {
            (blob == b"oracle").then(|| Box::new(OracleModel) as BoxedClassifierModel)
        }
    }

    /// Engine that never produces a model.
    struct FailingEngine;

    impl ClassifierEngine for FailingEngine {
        fn fit(
            &self,
            _inputs: &[Vec<f32>],
            _classes: &[usize],
            _total_classes: usize,
        ) -> Option<BoxedClassifierModel> {
            None
        }

        fn load(&self, _blob: &[u8]) -> Option<BoxedClassifierModel> {
            None
        }
    }

    fn params(training_data_minimum: u32) -> RunParameters {
        RunParameters {
            training_data_minimum,
            variables: vec![DecisionVariable {
                name: "x0".to_string(),
                enabled: true,
                weight: 1.0,
                range_min: 0.0,
                range_max: 10.0,
                objective: VariableObjective::Ignore,
            }],
            objectives: vec![ObjectiveSpec {
                name: "score".to_string(),
                enabled: true,
            }],
            ..RunParameters::default()
        }
    }

    fn evaluated_population() -> Vec<PopulationMember> {
        (1..=8)
            .map(|i| {
                let fitness = i as f32;
                let mut member = PopulationMember::new(vec![fitness]);
                member.assign_evaluation(vec![fitness]);
                member
            })
            .collect()
    }

    fn trained_predictor(training_data_minimum: u32) -> ClassificationPredictor {
        let predictor =
            ClassificationPredictor::new(&params(training_data_minimum), Box::new(OracleEngine), 1)
                .unwrap();
        predictor.setup();
        predictor.after_generation(&evaluated_population(), 0, 0.0);
        predictor
    }

    #[test]
    fn classify_matches_documented_scenario() {
        // population [1..=8] quartiles 2.5 / 4.5 / 6.5, four classes
        assert_eq!(classify_fitness(1.0, QUARTILES, 4), 0);
        assert_eq!(classify_fitness(7.5, QUARTILES, 4), 3);
        // the median itself lands in the upper-middle segment
        assert_eq!(classify_fitness(4.5, QUARTILES, 4), 2);
        assert_eq!(classify_fitness(3.0, QUARTILES, 4), 1);
        assert_eq!(classify_fitness(5.0, QUARTILES, 4), 2);
    }

    #[test]
    fn classify_is_monotonic_in_fitness() {
        for total_classes in [2, 4, 5, 7] {
            let mut previous = 0;
            let mut fitness = -2.0;
            while fitness <= 10.0 {
                let class = classify_fitness(fitness, QUARTILES, total_classes);
                assert!(class >= previous, "classify must not decrease");
                assert!(class < total_classes);
                previous = class;
                fitness += 0.125;
            }
        }
    }

    #[test]
    fn interior_classes_round_trip() {
        // the ±1 margins assume quartile gaps wider than the per-class
        // step, so use comfortably spread quartiles
        let quartiles = QuartileSnapshot {
            first: 10.0,
            median: 30.0,
            third: 50.0,
        };
        for total_classes in [4, 5, 7] {
            for class in 1..total_classes - 1 {
                let fitness = class_to_fitness(class, quartiles, total_classes);
                assert_eq!(
                    classify_fitness(fitness, quartiles, total_classes),
                    class,
                    "round trip failed for class {class} of {total_classes}"
                );
            }
        }
    }

    #[test]
    fn extreme_classes_carry_margins() {
        assert_eq!(class_to_fitness(0, QUARTILES, 4), QUARTILES.first - 1.0);
        assert_eq!(class_to_fitness(3, QUARTILES, 4), QUARTILES.third + 1.0);
    }

    #[test]
    fn after_generation_trains_and_clears_gate() {
        let predictor = trained_predictor(5);
        // the oracle agrees with the labels, so validation is perfect
        assert_eq!(predictor.network_accuracy(), 1.0);
        let quartiles = predictor.lock().core.quartiles.unwrap();
        assert_eq!(quartiles.first, 2.5);
        assert_eq!(quartiles.median, 4.5);
        assert_eq!(quartiles.third, 6.5);
        assert_eq!(predictor.lock().core.reservoir.count(), 8);
    }

    #[test]
    fn below_minimum_forces_untrusted_accuracy_and_no_predictions() {
        let predictor = trained_predictor(50);
        assert_eq!(predictor.network_accuracy(), -1.0);

        let mut population: Vec<PopulationMember> =
            (0..8).map(|_| PopulationMember::new(vec![7.0])).collect();
        predictor.at_start_of_generation(&mut population, &RunMetrics::new(), 1);
        assert!(population.iter().all(|member| !member.is_evaluated()));
        assert!(population.iter().all(|member| !member.predicted));
        assert!(predictor.stats().generation(1).is_none());
    }

    #[test]
    fn accepted_predictions_respect_threshold_and_budget() {
        let predictor = trained_predictor(5);
        // eight unevaluated members the oracle scores in the top class
        let mut population: Vec<PopulationMember> =
            (0..8).map(|_| PopulationMember::new(vec![7.0])).collect();
        predictor.at_start_of_generation(&mut population, &RunMetrics::new(), 1);

        let predicted = population.iter().filter(|member| member.predicted).count();
        // max_prediction_ratio 0.5 of 8 members
        assert_eq!(predicted, 4);
        for member in population.iter().filter(|member| member.predicted) {
            // top class maps to third quartile + 1
            assert_eq!(member.fitness, 7.5);
            assert_eq!(member.objectives_fitness, vec![7.5]);
        }
        let tally = *predictor.stats().generation(1).unwrap();
        assert_eq!(tally.accepted, 4);
        assert_eq!(tally.issued, 4);
    }

    #[test]
    fn below_threshold_classes_are_rejected() {
        let predictor = trained_predictor(5);
        // the oracle scores fitness 1.0 as class 0, below threshold 2
        let mut population: Vec<PopulationMember> =
            (0..4).map(|_| PopulationMember::new(vec![1.0])).collect();
        predictor.at_start_of_generation(&mut population, &RunMetrics::new(), 1);

        assert!(population.iter().all(|member| !member.predicted));
        let tally = *predictor.stats().generation(1).unwrap();
        assert_eq!(tally.issued, 4);
        assert_eq!(tally.accepted, 0);
    }

    #[test]
    fn ground_truth_is_never_overwritten() {
        let predictor = trained_predictor(5);
        let mut member = PopulationMember::new(vec![7.0]);
        member.assign_evaluation(vec![3.0]);
        let mut population = vec![member];
        predictor.at_start_of_generation(&mut population, &RunMetrics::new(), 1);

        assert_eq!(population[0].fitness, 3.0);
        assert_eq!(population[0].objectives_fitness, vec![3.0]);
        assert!(!population[0].predicted);
    }

    #[test]
    fn failed_fit_keeps_previous_model_and_accuracy() {
        let failing =
            ClassificationPredictor::new(&params(5), Box::new(FailingEngine), 1).unwrap();
        failing.after_generation(&evaluated_population(), 0, 0.0);
        // the engine produced nothing: no model appears and the accuracy
        // stays at its previous (untrusted) value instead of going stale
        assert!(failing.predict(&[7.0]).is_none());
        assert_eq!(failing.network_accuracy(), -1.0);
    }

    #[test]
    fn verdict_mismatches_are_tallied() {
        let predictor = trained_predictor(5);

        // vector says top class, truth says bottom: false positive
        let mut liar = PopulationMember::new(vec![7.0]);
        liar.assign_evaluation(vec![1.0]);
        // vector says bottom class, truth says top: false negative
        let mut sleeper = PopulationMember::new(vec![1.0]);
        sleeper.assign_evaluation(vec![7.0]);
        // agreement in both directions: no tally
        let mut honest = PopulationMember::new(vec![7.0]);
        honest.assign_evaluation(vec![7.0]);

        predictor.after_generation(&[liar, sleeper, honest], 1, 0.0);
        let tally = *predictor.stats().generation(1).unwrap();
        assert_eq!(tally.false_positives, 1);
        assert_eq!(tally.false_negatives, 1);
    }

    #[test]
    fn predict_requires_model_and_quartiles() {
        let predictor =
            ClassificationPredictor::new(&params(5), Box::new(OracleEngine), 1).unwrap();
        assert!(predictor.predict(&[7.0]).is_none());

        let trained = trained_predictor(5);
        assert_eq!(trained.predict(&[7.0]), Some(vec![7.5]));
        assert_eq!(trained.predict(&[1.0]), Some(vec![1.5]));
    }

    #[test]
    fn concurrent_adds_and_predictions_are_serialized() {
        let predictor = trained_predictor(5);
        std::thread::scope(|scope| {
            for i in 0..4_u32 {
                let predictor = &predictor;
                scope.spawn(move || {
                    for j in 0..25_u32 {
                        let value = (i * 25 + j) as f32 / 10.0;
                        predictor.add_input_output_to_data(&[value], &[value]);
                        let _ = predictor.predict(&[value]);
                    }
                });
            }
        });
        // 8 harvested + 100 concurrent adds, capped at the total capacity
        assert_eq!(predictor.lock().core.reservoir.count(), 100);
    }

    #[test]
    fn snapshot_restores_through_setup() {
        let predictor = trained_predictor(5);
        let snapshot = predictor.snapshot();
        assert_eq!(snapshot.model_blob.as_deref(), Some(&b"oracle"[..]));
        assert_eq!(snapshot.reservoir.as_ref().unwrap().count(), 8);

        let restored =
            ClassificationPredictor::from_snapshot(&params(5), Box::new(OracleEngine), 1, &snapshot)
                .unwrap();
        // setup is idempotent and materializes the persisted model
        restored.setup();
        restored.setup();
        assert_eq!(restored.network_accuracy(), 1.0);
        assert_eq!(restored.predict(&[7.0]), Some(vec![7.5]));
        assert_eq!(restored.lock().core.reservoir.count(), 8);
    }
}
