//! Surrogate fitness prediction layer for population-based optimizers.
//!
//! This crate implements the orchestration policy that lets an evolutionary
//! run substitute cheap model predictions for expensive fitness evaluations.
//! Evaluating an individual for real is assumed costly; the predictor layer
//! decides, generation by generation, which individuals can have their
//! fitness *estimated* by a learned model instead, while continuously
//! retraining that model from genuinely evaluated individuals.
//!
//! # How a Generation Flows
//!
//! ```text
//! outer optimizer finishes generation G
//!     ↓ after_generation(population, G, base_score_error)
//! harvest true-evaluated individuals → reservoir
//! recompute fitness quartiles, retrain model, refresh accuracy
//!     ↓ generation G+1 begins
//!     ↓ at_start_of_generation(population, run_metrics, G+1)
//! for each unevaluated individual: predict, gate, maybe substitute
//!     ↓
//! outer optimizer truly evaluates whatever is still unset
//! ```
//!
//! # Safe-by-Default Gates
//!
//! A prediction is only ever substituted when every gate passes:
//!
//! - the model exists and its validation accuracy clears the configured
//!   minimum (untrained models report an accuracy of −1, which never
//!   clears any gate);
//! - the strategy-specific threshold check accepts the predicted value;
//! - the per-generation prediction budget has not been exhausted.
//!
//! All degenerate states (empty reservoir, failed training, quartiles not
//! yet computed) degrade to "never predicts" rather than corrupting a
//! population member's fitness.
//!
//! # Strategies
//!
//! Two concrete strategies share the [`predictor::ResultPredictor`]
//! contract:
//!
//! - [`classification::ClassificationPredictor`] buckets fitness into
//!   quartile-derived ordinal classes before training; inference returns a
//!   class that is reverse-mapped to a conservative fitness estimate.
//! - [`regression::RegressionPredictor`] trains on normalized fitness
//!   values directly and accepts a prediction only when its error-widened
//!   interval lies strictly inside the configured quartile thresholds.
//!
//! The learning algorithms themselves are opaque: strategies talk to them
//! through the capability traits in [`engine`], so any engine (tree,
//! network, linear model) can be bound without touching orchestration
//! logic.
//!
//! # Concurrency
//!
//! The outer optimizer may evaluate population members from parallel
//! worker threads and report results concurrently. Each predictor guards
//! its shared mutable state (model handle, reservoir, accuracy, counters)
//! with a single exclusive lock; every lifecycle call locks once for one
//! logical operation and training always runs to completion under the
//! lock. See [`predictor`] for the contract.

pub mod classification;
pub mod config;
pub mod engine;
pub mod member;
pub mod metrics;
pub mod predictor;
pub mod regression;
pub mod reservoir;
pub mod sample;
pub mod snapshot;
