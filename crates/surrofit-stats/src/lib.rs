//! Statistical utilities for the surrofit project.
//!
//! This crate provides the quartile computation shared by the surrogate
//! predictor layer and the demonstration driver:
//!
//! - **Quartiles**: first quartile, median, and third quartile of a
//!   fitness distribution, used both as classification boundaries and as
//!   prediction-acceptance thresholds
//!
//! # Examples
//!
//! ```
//! use surrofit_stats::quartiles::Quartiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
//! let quartiles = Quartiles::new(values).unwrap();
//! assert_eq!(quartiles.first, 2.5);
//! assert_eq!(quartiles.median, 4.5);
//! assert_eq!(quartiles.third, 6.5);
//! ```

pub mod quartiles;
