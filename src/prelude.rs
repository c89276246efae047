//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use crossfold::prelude::*;
//! ```

pub use crate::adapters::{Candidate, LinearModel, ModelListSelection, RandomInterceptModel};
pub use crate::config::CvConfig;
pub use crate::criterion::Criterion;
pub use crate::cv::{cv_cases, cv_clusters, cv_models, cv_select, ClusterSpec, ModelComparison};
pub use crate::data::{Column, DataFrame};
pub use crate::error::{CvError, Result};
pub use crate::model_selection::Folds;
pub use crate::result::{CvOutcome, CvResult, Diagnostic, ReplicatedCvResult};
pub use crate::traits::{
    CvModel, MixedModel, MixedPredictor, PredictionMode, Predictor, Response, ResponseExpr,
    ResponseProvider, SelectionProcedure,
};
