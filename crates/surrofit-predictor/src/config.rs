//! Run configuration consumed by predictor construction.
//!
//! The outer optimizer hands the predictor a [`RunParameters`] value once,
//! at construction. Scalar parameters are validated against their
//! documented ranges; the decision-variable and objective descriptions
//! size the model's input/output layers and seed the output normalization
//! bounds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a [`RunParameters`] value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parameter `{name}` value {value} outside valid range {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("threshold class {threshold} must be below total classes {classes}")]
    ThresholdBeyondClasses { threshold: u32, classes: u32 },
    #[error("no enabled decision variables")]
    NoInputs,
    #[error("no enabled objectives")]
    NoOutputs,
    #[error("decision variable `{0}` has range_min above range_max")]
    InvertedVariableRange(String),
}

/// Whether a decision variable contributes its own objective component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableObjective {
    /// The variable's weighted magnitude is an objective component.
    Minimise,
    /// The variable only feeds the input layer.
    Ignore,
}

/// One decision variable of the optimization problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionVariable {
    pub name: String,
    pub enabled: bool,
    pub weight: f32,
    pub range_min: f32,
    pub range_max: f32,
    pub objective: VariableObjective,
}

/// One evaluator objective of the optimization problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub name: String,
    pub enabled: bool,
}

/// Named, range-validated predictor parameters plus the problem
/// description.
///
/// Scalar ranges and defaults follow the original tuning surface:
///
/// | parameter | range | default |
/// |---|---|---|
/// | `threshold_class` | 0..=20 | 2 |
/// | `total_classes` | 2..=20 | 4 |
/// | `training_data_high` | 0..=200 | 25 |
/// | `training_data_low` | 0..=200 | 25 |
/// | `training_data_total` | 1..=200 | 100 |
/// | `training_data_minimum` | 1..=200 | 20 |
/// | `minimum_accuracy` | 0..=1 | 0.75 |
/// | `max_prediction_ratio` | 0..=1 | 0.5 |
/// | `hidden_layer` | 1..=200 | 10 |
/// | `training_epochs_per_generation` | 1..=1000 | 100 |
/// | `lower_prediction_threshold` | 0..=3 | 0 |
/// | `upper_prediction_threshold` | 0..=3 | 0 |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParameters {
    /// Minimum predicted class for accepting a classification prediction.
    pub threshold_class: u32,
    /// Number of ordinal fitness classes for the classification strategy.
    pub total_classes: u32,
    /// High-value retention quota of the training reservoir.
    pub training_data_high: u32,
    /// Low-value retention quota of the training reservoir.
    pub training_data_low: u32,
    /// Total capacity of the training reservoir.
    pub training_data_total: u32,
    /// Minimum reservoir size before training is attempted.
    pub training_data_minimum: u32,
    /// Minimum validation accuracy a model must clear before its
    /// predictions are used.
    pub minimum_accuracy: f32,
    /// Maximum fraction of a population that may receive substituted
    /// fitness in one generation.
    pub max_prediction_ratio: f32,
    /// Hidden layer width for network-backed regression engines.
    pub hidden_layer: u32,
    /// Fine-tuning epochs run on the regression model each generation.
    pub training_epochs_per_generation: u32,
    /// Lower regression acceptance threshold: 0 none, 1 first quartile,
    /// 2 median, 3 third quartile.
    pub lower_prediction_threshold: u32,
    /// Upper regression acceptance threshold, same encoding.
    pub upper_prediction_threshold: u32,
    /// When true, an accepted regression prediction is only substituted
    /// with probability equal to the current network accuracy.
    pub evaluate_anyway_chance: bool,
    /// Decision variables; enabled ones size the input layer.
    pub variables: Vec<DecisionVariable>,
    /// Evaluator objectives; enabled ones size the output layer.
    pub objectives: Vec<ObjectiveSpec>,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            threshold_class: 2,
            total_classes: 4,
            training_data_high: 25,
            training_data_low: 25,
            training_data_total: 100,
            training_data_minimum: 20,
            minimum_accuracy: 0.75,
            max_prediction_ratio: 0.5,
            hidden_layer: 10,
            training_epochs_per_generation: 100,
            lower_prediction_threshold: 0,
            upper_prediction_threshold: 0,
            evaluate_anyway_chance: true,
            variables: Vec::new(),
            objectives: Vec::new(),
        }
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl RunParameters {
    /// Validates every scalar against its documented range and the
    /// problem description for layer sizing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("threshold_class", self.threshold_class.into(), 0.0, 20.0)?;
        check_range("total_classes", self.total_classes.into(), 2.0, 20.0)?;
        check_range(
            "training_data_high",
            self.training_data_high.into(),
            0.0,
            200.0,
        )?;
        check_range(
            "training_data_low",
            self.training_data_low.into(),
            0.0,
            200.0,
        )?;
        check_range(
            "training_data_total",
            self.training_data_total.into(),
            1.0,
            200.0,
        )?;
        check_range(
            "training_data_minimum",
            self.training_data_minimum.into(),
            1.0,
            200.0,
        )?;
        check_range("minimum_accuracy", self.minimum_accuracy.into(), 0.0, 1.0)?;
        check_range(
            "max_prediction_ratio",
            self.max_prediction_ratio.into(),
            0.0,
            1.0,
        )?;
        check_range("hidden_layer", self.hidden_layer.into(), 1.0, 200.0)?;
        check_range(
            "training_epochs_per_generation",
            self.training_epochs_per_generation.into(),
            1.0,
            1000.0,
        )?;
        check_range(
            "lower_prediction_threshold",
            self.lower_prediction_threshold.into(),
            0.0,
            3.0,
        )?;
        check_range(
            "upper_prediction_threshold",
            self.upper_prediction_threshold.into(),
            0.0,
            3.0,
        )?;
        if self.threshold_class >= self.total_classes {
            return Err(ConfigError::ThresholdBeyondClasses {
                threshold: self.threshold_class,
                classes: self.total_classes,
            });
        }
        if self.input_layer_len() == 0 {
            return Err(ConfigError::NoInputs);
        }
        if self.output_layer_len() == 0 {
            return Err(ConfigError::NoOutputs);
        }
        for variable in self.enabled_variables() {
            if variable.range_min > variable.range_max {
                return Err(ConfigError::InvertedVariableRange(variable.name.clone()));
            }
        }
        Ok(())
    }

    fn enabled_variables(&self) -> impl Iterator<Item = &DecisionVariable> {
        self.variables.iter().filter(|variable| variable.enabled)
    }

    /// Number of model inputs: one per enabled decision variable.
    #[must_use]
    pub fn input_layer_len(&self) -> usize {
        self.enabled_variables().count()
    }

    /// Number of model outputs: one per enabled evaluator objective, plus
    /// one per enabled variable with a minimise objective.
    #[must_use]
    pub fn output_layer_len(&self) -> usize {
        let evaluator_outputs = self
            .objectives
            .iter()
            .filter(|objective| objective.enabled)
            .count();
        let variable_outputs = self
            .enabled_variables()
            .filter(|variable| variable.objective == VariableObjective::Minimise)
            .count();
        evaluator_outputs + variable_outputs
    }

    /// Input normalization bounds: the configured range of each enabled
    /// variable.
    #[must_use]
    pub fn input_bounds(&self) -> (Vec<f32>, Vec<f32>) {
        let min = self
            .enabled_variables()
            .map(|variable| variable.range_min)
            .collect();
        let max = self
            .enabled_variables()
            .map(|variable| variable.range_max)
            .collect();
        (min, max)
    }

    /// Output normalization bounds, ordered evaluator objectives first.
    ///
    /// Minima are fixed at 0. An evaluator objective starts with a max of
    /// 0 that grows as outputs are observed; a variable-derived objective
    /// is bounded by the largest weighted magnitude its range allows.
    #[must_use]
    pub fn output_bounds(&self) -> (Vec<f32>, Vec<f32>) {
        let mut max = Vec::with_capacity(self.output_layer_len());
        for objective in &self.objectives {
            if objective.enabled {
                max.push(0.0);
            }
        }
        for variable in self.enabled_variables() {
            if variable.objective == VariableObjective::Minimise {
                let bound = f32::max(
                    (variable.range_min * variable.weight).abs(),
                    (variable.range_max * variable.weight).abs(),
                );
                max.push(bound);
            }
        }
        let min = vec![0.0; max.len()];
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, min: f32, max: f32) -> DecisionVariable {
        DecisionVariable {
            name: name.to_string(),
            enabled: true,
            weight: 1.0,
            range_min: min,
            range_max: max,
            objective: VariableObjective::Ignore,
        }
    }

    fn objective(name: &str) -> ObjectiveSpec {
        ObjectiveSpec {
            name: name.to_string(),
            enabled: true,
        }
    }

    fn valid_parameters() -> RunParameters {
        RunParameters {
            variables: vec![variable("x0", 0.0, 10.0), variable("x1", -5.0, 5.0)],
            objectives: vec![objective("score")],
            ..RunParameters::default()
        }
    }

    #[test]
    fn default_parameters_validate_with_a_problem() {
        valid_parameters().validate().unwrap();
    }

    #[test]
    fn out_of_range_scalar_is_rejected() {
        let params = RunParameters {
            minimum_accuracy: 1.5,
            ..valid_parameters()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::OutOfRange {
                name: "minimum_accuracy",
                ..
            })
        ));
    }

    #[test]
    fn threshold_must_stay_below_class_count() {
        let params = RunParameters {
            threshold_class: 4,
            total_classes: 4,
            ..valid_parameters()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::ThresholdBeyondClasses { .. })
        ));
    }

    #[test]
    fn disabled_variables_are_excluded_from_layers() {
        let mut params = valid_parameters();
        params.variables[1].enabled = false;
        assert_eq!(params.input_layer_len(), 1);
        let (min, max) = params.input_bounds();
        assert_eq!(min, vec![0.0]);
        assert_eq!(max, vec![10.0]);
    }

    #[test]
    fn minimised_variables_contribute_bounded_outputs() {
        let mut params = valid_parameters();
        params.variables[1].objective = VariableObjective::Minimise;
        params.variables[1].weight = 2.0;
        assert_eq!(params.output_layer_len(), 2);
        let (min, max) = params.output_bounds();
        assert_eq!(min, vec![0.0, 0.0]);
        // evaluator objective grows from 0; variable objective bounded by
        // max(|-5 * 2|, |5 * 2|)
        assert_eq!(max, vec![0.0, 10.0]);
    }

    #[test]
    fn empty_problem_is_rejected() {
        let params = RunParameters::default();
        assert!(matches!(params.validate(), Err(ConfigError::NoInputs)));
    }
}
