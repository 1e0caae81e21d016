//! Reference learning engines for the surrogate predictor layer.
//!
//! The predictor crate only knows the capability traits in
//! `surrofit_predictor::engine`; this crate provides two concrete,
//! deterministic engines behind them:
//!
//! - [`centroid::CentroidClassifier`] — a nearest-centroid classifier for
//!   the classification strategy
//! - [`network::NetworkRegressor`] — a one-hidden-layer sigmoid network
//!   trained by stochastic gradient descent for the regression strategy
//!
//! Both models serialize to opaque JSON blobs, so predictor snapshots
//! round-trip without the orchestration layer knowing anything about the
//! model internals. Any other engine implementing the same traits can be
//! bound in their place.

pub mod centroid;
pub mod network;
