//! Population members as seen by the predictor layer.

use serde::{Deserialize, Serialize};

/// Sentinel fitness marking an individual the outer optimizer has not yet
/// evaluated. Genuine fitness values are non-negative.
pub const UNEVALUATED_FITNESS: f32 = -1.0;

/// An individual in the outer optimizer's population.
///
/// The predictor layer reads the genome `vector` and only ever writes
/// `fitness`, `objectives_fitness`, and `predicted` on members whose
/// fitness is still [`UNEVALUATED_FITNESS`]; a genuinely evaluated
/// individual is never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationMember {
    /// Genome vector, read-only to the predictor.
    pub vector: Vec<f32>,
    /// Scalar fitness; [`UNEVALUATED_FITNESS`] until evaluated or
    /// substituted.
    pub fitness: f32,
    /// Per-objective fitness components.
    pub objectives_fitness: Vec<f32>,
    /// True only when the predictor substituted this fitness instead of a
    /// genuine evaluation.
    pub predicted: bool,
}

impl PopulationMember {
    /// Creates an unevaluated member with the given genome.
    #[must_use]
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            fitness: UNEVALUATED_FITNESS,
            objectives_fitness: Vec::new(),
            predicted: false,
        }
    }

    /// Whether this member carries a genuine or substituted fitness.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.fitness >= 0.0
    }

    /// Records a genuine evaluation result: per-objective components plus
    /// their sum as the scalar fitness.
    pub fn assign_evaluation(&mut self, objectives_fitness: Vec<f32>) {
        self.fitness = objectives_fitness.iter().copied().sum();
        self.objectives_fitness = objectives_fitness;
        self.predicted = false;
    }
}
