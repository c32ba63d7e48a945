//! Rust binding for the liblinear library
//!
//! This crate trains and applies linear classifiers and regressors
//! through the native liblinear library. Trained models can be saved
//! to and loaded from disk in the library's text format, to avoid the
//! (potentially) costly training process.
//!
//! A model is trained from a problem: a set of training instances,
//! each with a class label and a feature vector. Consider doing
//! sentiment analysis over a humble training corpus:
//!
//! ```text
//! Positive: A beautiful album.
//! Negative: A crappy ugly album.
//! ```
//!
//! Labeling the classes positive: 0 and negative: 1, and numbering the
//! words as features (a: 1, beautiful: 2, album: 3, crappy: 4,
//! ugly: 5) with boolean values, gives one feature vector per
//! sentence:
//!
//! ```rust,no_run
//! use rlinear::{from_dense_vector, Model, Parameters, Problem, TrainingInstance};
//!
//! # fn main() -> rlinear::Result<()> {
//! let mut problem = Problem::new();
//! problem.add(&TrainingInstance::new(
//!     0.0,
//!     from_dense_vector(&[1.0, 1.0, 1.0, 0.0, 0.0]),
//! ))?;
//! problem.add(&TrainingInstance::new(
//!     1.0,
//!     from_dense_vector(&[1.0, 0.0, 1.0, 1.0, 1.0]),
//! ))?;
//!
//! // The defaults train an L2-regularized L2-loss support vector
//! // classifier with cost 1.
//! let model = Model::train(&Parameters::default(), &problem)?;
//!
//! // "This is a beautiful book." maps onto the training features as
//! // {a, beautiful}; the model predicts it to be positive (0).
//! let label = model.predict(&from_dense_vector(&[1.0, 1.0, 0.0, 0.0, 0.0]))?;
//! assert_eq!(label, 0.0);
//! # Ok(())
//! # }
//! ```
//!
//! The native library must be available at link time; see the build
//! script for the `LIBLINEAR_LIB_DIR` and `LIBLINEAR_STATIC`
//! overrides.

pub mod core;
pub mod ffi;
pub mod model;
pub mod params;
pub mod persistence;
pub mod problem;
pub mod validation;

// Re-export main types for convenience
pub use crate::core::error::{LinearError, Result};
pub use crate::core::types::{from_dense_vector, FeatureValue, FeatureVector, TrainingInstance};
pub use crate::model::Model;
pub use crate::params::{ClassWeight, Parameters, SolverType};
pub use crate::persistence::{read_model, write_model};
pub use crate::problem::Problem;
pub use crate::validation::cross_validation;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
