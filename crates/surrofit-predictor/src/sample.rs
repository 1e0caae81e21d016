//! Training samples harvested from genuinely evaluated individuals.

use serde::{Deserialize, Serialize};

/// A single training example: an individual's genome paired with its
/// genuinely evaluated per-objective fitness.
///
/// Pairs are immutable once constructed. A pair may optionally carry a
/// pre-normalized copy of its inputs, rescaled into [0, 1] with bounds
/// supplied at construction; strategies whose engines train on normalized
/// inputs store it so the rescale happens once instead of on every epoch.
/// Outputs are normalized at training time because their upper bounds grow
/// as better individuals are observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputOutputPair {
    inputs: Vec<f32>,
    outputs: Vec<f32>,
    normalized_inputs: Option<Vec<f32>>,
}

impl InputOutputPair {
    /// Creates a pair holding raw inputs and outputs.
    #[must_use]
    pub fn new(inputs: Vec<f32>, outputs: Vec<f32>) -> Self {
        Self {
            inputs,
            outputs,
            normalized_inputs: None,
        }
    }

    /// Creates a pair that also stores its inputs rescaled into [0, 1]
    /// using the supplied per-component bounds.
    ///
    /// # Panics
    ///
    /// Panics if the bound vectors are shorter than `inputs`.
    #[must_use]
    pub fn with_normalized_inputs(
        inputs: Vec<f32>,
        outputs: Vec<f32>,
        input_min: &[f32],
        input_max: &[f32],
    ) -> Self {
        let normalized_inputs = Some(normalize(&inputs, input_min, input_max));
        Self {
            inputs,
            outputs,
            normalized_inputs,
        }
    }

    /// Returns the raw input vector.
    #[must_use]
    pub fn inputs(&self) -> &[f32] {
        &self.inputs
    }

    /// Returns the raw output vector.
    #[must_use]
    pub fn outputs(&self) -> &[f32] {
        &self.outputs
    }

    /// Returns the pre-normalized input copy, if one was stored at
    /// construction.
    #[must_use]
    pub fn normalized_inputs(&self) -> Option<&[f32]> {
        self.normalized_inputs.as_deref()
    }

    /// Returns the sum of the output components, the scalar fitness this
    /// pair represents.
    #[must_use]
    pub fn output_sum(&self) -> f32 {
        self.outputs.iter().copied().sum()
    }
}

/// Rescales each component into [0, 1] using the matching bounds.
///
/// A degenerate bound pair (`max <= min`) maps its component to 0 so a
/// collapsed range never produces NaN or infinities.
///
/// # Panics
///
/// Panics if the bound slices are shorter than `values`.
#[must_use]
pub fn normalize(values: &[f32], min: &[f32], max: &[f32]) -> Vec<f32> {
    assert!(
        min.len() >= values.len() && max.len() >= values.len(),
        "normalization bounds must cover every component"
    );
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let range = max[i] - min[i];
            if range > 0.0 {
                ((value - min[i]) / range).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_sum_is_component_sum() {
        let pair = InputOutputPair::new(vec![1.0, 2.0], vec![3.0, 4.5]);
        assert_eq!(pair.output_sum(), 7.5);
        assert!(pair.normalized_inputs().is_none());
    }

    #[test]
    fn normalize_rescales_into_unit_interval() {
        let normalized = normalize(&[0.0, 5.0, 10.0], &[0.0, 0.0, 0.0], &[10.0, 10.0, 10.0]);
        assert_eq!(normalized, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn normalize_clamps_out_of_bounds_values() {
        let normalized = normalize(&[-5.0, 15.0], &[0.0, 0.0], &[10.0, 10.0]);
        assert_eq!(normalized, vec![0.0, 1.0]);
    }

    #[test]
    fn normalize_degenerate_range_maps_to_zero() {
        let normalized = normalize(&[3.0], &[3.0], &[3.0]);
        assert_eq!(normalized, vec![0.0]);
    }

    #[test]
    fn stored_normalized_inputs_use_construction_bounds() {
        let pair = InputOutputPair::with_normalized_inputs(
            vec![2.0, 8.0],
            vec![1.0],
            &[0.0, 0.0],
            &[10.0, 10.0],
        );
        assert_eq!(pair.normalized_inputs(), Some(&[0.2, 0.8][..]));
        assert_eq!(pair.inputs(), &[2.0, 8.0]);
    }
}
