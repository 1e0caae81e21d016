use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrofit_predictor::snapshot::PredictorSnapshot;

/// On-disk wrapper around a predictor snapshot produced by a demo run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub strategy: String,
    pub final_best_fitness: f32,
    pub snapshot: PredictorSnapshot,
}
