//! Demonstration optimizer: a toy continuous-maximization GA with the
//! surrogate predictor wired into its generation loop.
//!
//! Only members whose fitness is still unset after the predictor ran get
//! a true (here: cheap, but standing in for expensive) evaluation; every
//! true evaluation feeds the reservoir through `after_generation`.

use std::{fs, path::PathBuf, thread};

use anyhow::Context;
use chrono::Utc;
use rand::{Rng, SeedableRng, seq::IndexedRandom};
use rand_distr::Normal;
use rand_pcg::Pcg32;

use surrofit_engines::{centroid::CentroidClassifier, network::NetworkRegressor};
use surrofit_predictor::{
    classification::ClassificationPredictor,
    config::{DecisionVariable, ObjectiveSpec, RunParameters, VariableObjective},
    member::PopulationMember,
    metrics::RunMetrics,
    predictor::ResultPredictor,
    regression::RegressionPredictor,
    snapshot::PredictorSnapshot,
};
use surrofit_stats::quartiles::Quartiles;

use crate::schema::DemoModel;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
enum Strategy {
    #[default]
    Classification,
    Regression,
}

impl Strategy {
    fn name(self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::Regression => "regression",
        }
    }
}

const VARIABLE_COUNT: usize = 4;
const RANGE_MIN: f32 = 0.0;
const RANGE_MAX: f32 = 10.0;
const TARGET: f32 = 7.0;

const ELITE_COUNT: usize = 2;
const TOURNAMENT_SIZE: usize = 3;
const BLX_ALPHA: f32 = 0.3;
const MUTATION_RATE: f32 = 0.2;
const MUTATION_SIGMA: f32 = 0.5;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DemoArg {
    /// Predictor strategy to wire into the loop
    #[arg(long, default_value = "classification")]
    strategy: Strategy,
    #[arg(long, default_value_t = 40)]
    population: usize,
    #[arg(long, default_value_t = 60)]
    generations: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Output file path for the predictor snapshot
    #[arg(long)]
    snapshot_out: Option<PathBuf>,
    /// Previously saved snapshot to resume from
    #[arg(long)]
    snapshot_in: Option<PathBuf>,
}

/// Single "proximity" objective: closer to the per-variable target is
/// better, never negative.
fn evaluate(vector: &[f32]) -> Vec<f32> {
    let objective: f32 = vector
        .iter()
        .map(|&x| RANGE_MAX - (x - TARGET).abs())
        .sum();
    vec![objective.max(0.0)]
}

fn run_parameters() -> RunParameters {
    RunParameters {
        training_data_minimum: 20,
        max_prediction_ratio: 0.35,
        lower_prediction_threshold: 2,
        upper_prediction_threshold: 0,
        variables: (0..VARIABLE_COUNT)
            .map(|i| DecisionVariable {
                name: format!("x{i}"),
                enabled: true,
                weight: 1.0,
                range_min: RANGE_MIN,
                range_max: RANGE_MAX,
                objective: VariableObjective::Ignore,
            })
            .collect(),
        objectives: vec![ObjectiveSpec {
            name: "proximity".to_string(),
            enabled: true,
        }],
        ..RunParameters::default()
    }
}

fn random_member<R>(rng: &mut R) -> PopulationMember
where
    R: Rng + ?Sized,
{
    let vector = (0..VARIABLE_COUNT)
        .map(|_| rng.random_range(RANGE_MIN..=RANGE_MAX))
        .collect();
    PopulationMember::new(vector)
}

fn tournament_select<'a, R>(population: &'a [PopulationMember], rng: &mut R) -> &'a PopulationMember
where
    R: Rng + ?Sized,
{
    population
        .choose_multiple(rng, TOURNAMENT_SIZE)
        .max_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap())
        .unwrap()
}

/// BLX-α crossover on the bounded genome.
fn crossover<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    p1.iter()
        .zip(p2)
        .map(|(&x1, &x2)| {
            let min = f32::min(x1, x2);
            let max = f32::max(x1, x2);
            let d = max - min;
            rng.random_range(min - BLX_ALPHA * d..=max + BLX_ALPHA * d)
                .clamp(RANGE_MIN, RANGE_MAX)
        })
        .collect()
}

/// Gaussian mutation on the bounded genome.
fn mutate<R>(genome: &mut [f32], rng: &mut R)
where
    R: Rng + ?Sized,
{
    let normal = Normal::new(0.0, MUTATION_SIGMA).unwrap();
    for gene in genome {
        if rng.random_bool(MUTATION_RATE.into()) {
            *gene = (*gene + rng.sample(normal)).clamp(RANGE_MIN, RANGE_MAX);
        }
    }
}

/// Next generation: elites carried over with their fitness, the rest bred
/// fresh with unset fitness so the predictor gets first refusal on them.
fn evolve<R>(population: &[PopulationMember], rng: &mut R) -> Vec<PopulationMember>
where
    R: Rng + ?Sized,
{
    assert!(population.is_sorted_by(|a, b| a.fitness >= b.fitness));

    let mut next = population[..ELITE_COUNT.min(population.len())].to_vec();
    while next.len() < population.len() {
        let p1 = tournament_select(population, rng);
        let p2 = tournament_select(population, rng);
        let mut child = crossover(&p1.vector, &p2.vector, rng);
        mutate(&mut child, rng);
        next.push(PopulationMember::new(child));
    }
    next
}

fn build_predictor(
    arg: &DemoArg,
    params: &RunParameters,
    snapshot: &PredictorSnapshot,
) -> anyhow::Result<Box<dyn ResultPredictor>> {
    let predictor: Box<dyn ResultPredictor> = match arg.strategy {
        Strategy::Classification => Box::new(ClassificationPredictor::from_snapshot(
            params,
            Box::new(CentroidClassifier),
            arg.seed,
            snapshot,
        )?),
        Strategy::Regression => Box::new(RegressionPredictor::from_snapshot(
            params,
            Box::new(NetworkRegressor::new(params.hidden_layer as usize, arg.seed)),
            arg.seed,
            snapshot,
        )?),
    };
    Ok(predictor)
}

#[expect(clippy::cast_precision_loss)]
pub(crate) fn run(arg: &DemoArg) -> anyhow::Result<()> {
    let params = run_parameters();

    let snapshot = match &arg.snapshot_in {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let model: DemoModel = serde_json::from_str(&json)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            model.snapshot
        }
        None => PredictorSnapshot::default(),
    };
    let predictor = build_predictor(arg, &params, &snapshot)?;
    predictor.setup();

    let mut rng = Pcg32::seed_from_u64(arg.seed);
    let mut run_metrics = RunMetrics::new();
    let mut population: Vec<PopulationMember> =
        (0..arg.population).map(|_| random_member(&mut rng)).collect();
    let mut final_best_fitness = 0.0_f32;

    for generation in 0..arg.generations {
        predictor.at_start_of_generation(&mut population, &run_metrics, generation);

        // true evaluations for whatever the predictor left unset, in
        // parallel like the real expensive evaluations would run
        thread::scope(|scope| {
            for member in &mut population {
                if !member.is_evaluated() {
                    scope.spawn(move || {
                        member.assign_evaluation(evaluate(&member.vector));
                    });
                }
            }
        });

        let quartiles = Quartiles::new(population.iter().map(|member| member.fitness))
            .context("population is empty")?;
        run_metrics.record(generation, quartiles);
        predictor.after_generation(&population, generation, quartiles.third);

        population.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());
        let best = population[0].fitness;
        final_best_fitness = final_best_fitness.max(best);
        let mean =
            population.iter().map(|member| member.fitness).sum::<f32>() / population.len() as f32;
        let tally = predictor
            .stats()
            .generation(generation)
            .copied()
            .unwrap_or_default();
        eprintln!(
            "Generation #{generation}: best {best:.3}, mean {mean:.3}, accuracy {:.3}, \
             predictions {}/{}",
            predictor.network_accuracy(),
            tally.accepted,
            tally.issued,
        );

        if generation + 1 < arg.generations {
            population = evolve(&population, &mut rng);
        }
    }

    let totals = predictor.stats().totals();
    eprintln!(
        "Prediction totals: issued {}, accepted {}, false positives {}, false negatives {}",
        totals.issued, totals.accepted, totals.false_positives, totals.false_negatives,
    );

    if let Some(path) = &arg.snapshot_out {
        let model = DemoModel {
            name: format!("demo-{}", arg.strategy.name()),
            trained_at: Utc::now(),
            strategy: arg.strategy.name().to_string(),
            final_best_fitness,
            snapshot: predictor.snapshot(),
        };
        let json = serde_json::to_string_pretty(&model)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Saved predictor snapshot to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_is_non_negative_and_peaks_at_target() {
        let at_target = evaluate(&[TARGET; VARIABLE_COUNT])[0];
        let off_target = evaluate(&[0.0; VARIABLE_COUNT])[0];
        assert_eq!(at_target, RANGE_MAX * VARIABLE_COUNT as f32);
        assert!(off_target < at_target);
        assert!(off_target >= 0.0);
    }

    #[test]
    fn crossover_stays_within_variable_ranges() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            let child = crossover(&[0.0, 10.0, 3.0, 7.0], &[10.0, 0.0, 4.0, 6.0], &mut rng);
            assert_eq!(child.len(), 4);
            assert!(child.iter().all(|&x| (RANGE_MIN..=RANGE_MAX).contains(&x)));
        }
    }

    #[test]
    fn evolve_preserves_elites_and_size() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut population: Vec<PopulationMember> =
            (0..10).map(|_| random_member(&mut rng)).collect();
        for member in &mut population {
            member.assign_evaluation(evaluate(&member.vector));
        }
        population.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap());

        let next = evolve(&population, &mut rng);
        assert_eq!(next.len(), 10);
        // elites keep their evaluated fitness, offspring start unset
        assert_eq!(next[0], population[0]);
        assert_eq!(next[1], population[1]);
        assert!(next[2..].iter().all(|member| !member.is_evaluated()));
    }

    #[test]
    fn demo_parameters_are_valid() {
        run_parameters().validate().unwrap();
    }
}
