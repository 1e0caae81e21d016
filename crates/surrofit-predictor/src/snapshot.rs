//! Serializable predictor state for persistence across runs.

use serde::{Deserialize, Serialize};
use surrofit_stats::quartiles::Quartiles;

use crate::{metrics::PredictionStats, reservoir::WeightedTrainingSet};

/// The quartile boundaries a predictor last computed from a population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuartileSnapshot {
    pub first: f32,
    pub median: f32,
    pub third: f32,
}

impl From<Quartiles> for QuartileSnapshot {
    fn from(quartiles: Quartiles) -> Self {
        Self {
            first: quartiles.first,
            median: quartiles.median,
            third: quartiles.third,
        }
    }
}

/// Complete persisted state of one predictor instance.
///
/// Produced by `ResultPredictor::snapshot` and consumed by the strategy
/// `from_snapshot` constructors; the model blob is deserialized lazily by
/// the first `setup()` call. Round-trips through serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorSnapshot {
    /// Opaque serialized model, if one was ever trained or restored.
    pub model_blob: Option<Vec<u8>>,
    /// Reservoir contents and capacities.
    pub reservoir: Option<WeightedTrainingSet>,
    /// Last computed quartile boundaries.
    pub quartiles: Option<QuartileSnapshot>,
    /// Validation accuracy estimate; −1 means untrained or untrusted.
    pub network_accuracy: f32,
    /// Mean-absolute validation error of the regression strategy.
    pub training_error: f32,
    /// Grow-only observed output maxima of the regression strategy.
    pub max_output_values: Vec<f32>,
    /// Per-generation prediction tallies.
    pub stats: PredictionStats,
}

impl Default for PredictorSnapshot {
    fn default() -> Self {
        Self {
            model_blob: None,
            reservoir: None,
            quartiles: None,
            network_accuracy: -1.0,
            training_error: 0.0,
            max_output_values: Vec::new(),
            stats: PredictionStats::default(),
        }
    }
}
