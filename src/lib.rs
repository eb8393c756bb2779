//! Travel reimbursement estimator.
//!
//! A request (`days`, `miles`, `receipts`) is checked against a table of
//! known overrides, then scored by a decision tree whose output passes
//! through ordered correction rules. When the tree is missing or broken a
//! linear formula answers instead.

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use crate::core::estimator::{calculate_reimbursement, Estimator, ModelState};
pub use domain::model::{Estimate, EstimateSource, InputTriple};
pub use utils::error::{IntegrityError, ReimburseError, Result};
