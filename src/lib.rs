//! Crossfold: model-agnostic cross-validation orchestration.
//!
//! Crossfold partitions data into folds, refits a caller-supplied model (or
//! an entire model-selection procedure) with each fold held out, and
//! aggregates the held-out predictions into a cross-validated criterion
//! with a bias adjustment and, for large samples, a confidence interval.
//! It never fits models itself; model families plug in through the traits
//! in [`traits`].
//!
//! # Quick Start
//!
//! ```
//! use crossfold::prelude::*;
//!
//! let x: Vec<f64> = (0..50).map(f64::from).collect();
//! let y: Vec<f64> = x.iter().map(|v| 1.5 * v - 2.0 + (v * 1.3).cos()).collect();
//! let data = DataFrame::from_numeric(vec![("x", x), ("y", y)]).expect("valid frame");
//!
//! let model = LinearModel::fit(&data, "y", &["x"]).expect("fits");
//! let config = CvConfig::new().with_k(10).with_seed(123);
//! let outcome = cv_cases(&model, &data, &Criterion::mse(), &config).expect("runs");
//!
//! let result = outcome.as_single().expect("single replicate");
//! assert_eq!(result.k, 10);
//! assert!(result.cv_criterion >= result.full_data_criterion * 0.5);
//! ```
//!
//! # Modules
//!
//! - [`model_selection`]: fold and cluster partitioning
//! - [`estimate`]: bias adjustment and confidence intervals
//! - [`replicate`]: replicated runs and their summaries
//! - [`cv`]: case, cluster, selection and comparison orchestrators
//! - [`executor`]: sequential or worker-pool fold dispatch
//! - [`criterion`]: loss criteria with optional casewise decomposition
//! - [`traits`]: capability contracts for model adapters
//! - [`adapters`]: reference linear, mixed and selection adapters
//! - [`config`]: run options
//! - [`result`]: result records

pub mod adapters;
pub mod config;
pub mod criterion;
pub mod cv;
pub mod data;
pub mod error;
pub mod estimate;
pub mod executor;
pub mod model_selection;
pub mod prelude;
pub mod replicate;
pub mod result;
pub mod traits;

pub use error::{CvError, Result};
pub use result::{CvOutcome, CvResult};
