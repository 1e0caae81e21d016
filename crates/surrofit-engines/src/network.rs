//! Feed-forward network regression engine.
//!
//! A single hidden layer with logistic activations, trained by plain
//! stochastic gradient descent. Inputs and targets are expected in
//! [0, 1], which is exactly what the regression strategy feeds it. Weight
//! initialization is seeded, so a run is reproducible end to end.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use surrofit_predictor::engine::{BoxedRegressionModel, RegressionEngine, RegressionModel};

const DEFAULT_LEARNING_RATE: f32 = 0.1;

/// Engine producing one-hidden-layer sigmoid networks.
#[derive(Debug, Clone)]
pub struct NetworkRegressor {
    hidden_len: usize,
    learning_rate: f32,
    seed: u64,
}

impl NetworkRegressor {
    /// Creates an engine whose models carry the given hidden layer width
    /// and are initialized from the given seed.
    #[must_use]
    pub fn new(hidden_len: usize, seed: u64) -> Self {
        Self {
            hidden_len,
            learning_rate: DEFAULT_LEARNING_RATE,
            seed,
        }
    }
}

/// Weights and biases of a one-hidden-layer network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkModel {
    // row-major: one row of input weights per hidden unit, one row of
    // hidden weights per output unit
    hidden_weights: Vec<Vec<f32>>,
    hidden_biases: Vec<f32>,
    output_weights: Vec<Vec<f32>>,
    output_biases: Vec<f32>,
    learning_rate: f32,
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl NetworkModel {
    fn forward(&self, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let hidden: Vec<f32> = self
            .hidden_weights
            .iter()
            .zip(&self.hidden_biases)
            .map(|(weights, &bias)| {
                let sum: f32 = weights.iter().zip(input).map(|(&w, &x)| w * x).sum();
                sigmoid(sum + bias)
            })
            .collect();
        let output: Vec<f32> = self
            .output_weights
            .iter()
            .zip(&self.output_biases)
            .map(|(weights, &bias)| {
                let sum: f32 = weights.iter().zip(&hidden).map(|(&w, &h)| w * h).sum();
                sigmoid(sum + bias)
            })
            .collect();
        (hidden, output)
    }

    fn backpropagate(&mut self, input: &[f32], target: &[f32]) {
        let (hidden, output) = self.forward(input);

        // logistic output deltas for squared loss
        let output_deltas: Vec<f32> = output
            .iter()
            .zip(target)
            .map(|(&out, &truth)| (out - truth) * out * (1.0 - out))
            .collect();
        let hidden_deltas: Vec<f32> = hidden
            .iter()
            .enumerate()
            .map(|(j, &h)| {
                let downstream: f32 = self
                    .output_weights
                    .iter()
                    .zip(&output_deltas)
                    .map(|(weights, &delta)| weights[j] * delta)
                    .sum();
                h * (1.0 - h) * downstream
            })
            .collect();

        for (weights, (&delta, bias)) in self
            .output_weights
            .iter_mut()
            .zip(output_deltas.iter().zip(&mut self.output_biases))
        {
            for (weight, &h) in weights.iter_mut().zip(&hidden) {
                *weight -= self.learning_rate * delta * h;
            }
            *bias -= self.learning_rate * delta;
        }
        for (weights, (&delta, bias)) in self
            .hidden_weights
            .iter_mut()
            .zip(hidden_deltas.iter().zip(&mut self.hidden_biases))
        {
            for (weight, &x) in weights.iter_mut().zip(input) {
                *weight -= self.learning_rate * delta * x;
            }
            *bias -= self.learning_rate * delta;
        }
    }
}

impl RegressionModel for NetworkModel {
    fn infer(&self, input: &[f32]) -> Vec<f32> {
        self.forward(input).1
    }

    fn train_epoch(&mut self, inputs: &[Vec<f32>], targets: &[Vec<f32>]) {
        for (input, target) in inputs.iter().zip(targets) {
            self.backpropagate(input, target);
        }
    }

    fn to_blob(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl RegressionEngine for NetworkRegressor {
    fn create(&self, input_len: usize, output_len: usize) -> BoxedRegressionModel {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut layer = |rows: usize, columns: usize| -> Vec<Vec<f32>> {
            (0..rows)
                .map(|_| {
                    (0..columns)
                        .map(|_| rng.random_range(-0.5..=0.5))
                        .collect()
                })
                .collect()
        };
        let hidden_weights = layer(self.hidden_len, input_len);
        let output_weights = layer(output_len, self.hidden_len);
        Box::new(NetworkModel {
            hidden_weights,
            hidden_biases: vec![0.0; self.hidden_len],
            output_weights,
            output_biases: vec![0.0; output_len],
            learning_rate: self.learning_rate,
        })
    }

    fn load(&self, blob: &[u8]) -> Option<BoxedRegressionModel> {
        let model: NetworkModel = serde_json::from_slice(blob).ok()?;
        Some(Box::new(model))
    }
}
