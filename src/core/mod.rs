pub mod corrections;
pub mod estimator;
pub mod evaluation;
pub mod fallback;
pub mod features;
pub mod model;
pub mod rules;
pub mod special_cases;
pub mod tree;

pub use crate::domain::model::{Estimate, EstimateSource, InputTriple};
pub use crate::domain::ports::{ModelSource, Predictor};
pub use crate::utils::error::Result;
