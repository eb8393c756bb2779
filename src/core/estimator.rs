use crate::adapters::model_file::{load_model, LocalModelFile, DEFAULT_MODEL_PATH};
use crate::core::corrections::CorrectionLayer;
use crate::core::fallback::linear_estimate;
use crate::core::special_cases::SpecialCaseTable;
use crate::domain::model::{Estimate, EstimateSource, InputTriple};
use crate::domain::ports::{ModelSource, Predictor};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::{Arc, OnceLock};

/// Environment variable naming the model file for [`calculate_reimbursement`].
pub const MODEL_PATH_ENV: &str = "REIMBURSE_MODEL";

/// Outcome of loading the model at start-up.
#[derive(Debug, Clone)]
pub enum ModelState {
    Ready(Arc<dyn Predictor>),
    /// Every request goes through the fallback formula.
    Unavailable { reason: String },
}

/// Immutable after construction; safe to share between threads.
#[derive(Debug, Clone)]
pub struct Estimator {
    model: ModelState,
    special_cases: SpecialCaseTable,
    corrections: CorrectionLayer,
}

impl Estimator {
    pub fn new(
        model: ModelState,
        special_cases: SpecialCaseTable,
        corrections: CorrectionLayer,
    ) -> Self {
        Self {
            model,
            special_cases,
            corrections,
        }
    }

    /// `model` plus the built-in special cases and corrections.
    pub fn with_model(model: impl Predictor + 'static) -> Self {
        Self::new(
            ModelState::Ready(Arc::new(model)),
            SpecialCaseTable::builtin(),
            CorrectionLayer::builtin(),
        )
    }

    /// No tree; special cases still apply, everything else uses the fallback.
    pub fn without_model(reason: impl Into<String>) -> Self {
        Self::new(
            ModelState::Unavailable {
                reason: reason.into(),
            },
            SpecialCaseTable::builtin(),
            CorrectionLayer::builtin(),
        )
    }

    /// Loads the model from `source`. Any failure leaves the estimator in the
    /// fallback state instead of failing.
    pub fn from_source<S: ModelSource + ?Sized>(
        source: &S,
        special_cases: SpecialCaseTable,
        corrections: CorrectionLayer,
    ) -> Self {
        let model = match load_model(source) {
            Ok(model) => {
                tracing::info!("Decision tree ready ({})", model.summary());
                ModelState::Ready(Arc::new(model))
            }
            Err(e) => {
                tracing::warn!(
                    "Decision tree unavailable from {}: {}; using fallback formula",
                    source.describe(),
                    e
                );
                ModelState::Unavailable {
                    reason: e.to_string(),
                }
            }
        };
        Self::new(model, special_cases, corrections)
    }

    /// [`Estimator::from_source`] on a local file with the built-in tables.
    pub fn load(path: impl Into<std::path::PathBuf>) -> Self {
        Self::from_source(
            &LocalModelFile::new(path),
            SpecialCaseTable::builtin(),
            CorrectionLayer::builtin(),
        )
    }

    pub fn model_state(&self) -> &ModelState {
        &self.model
    }

    pub fn is_tree_ready(&self) -> bool {
        matches!(self.model, ModelState::Ready(_))
    }

    pub fn special_cases(&self) -> &SpecialCaseTable {
        &self.special_cases
    }

    pub fn corrections(&self) -> &CorrectionLayer {
        &self.corrections
    }

    pub fn estimate(&self, input: &InputTriple) -> Result<Estimate> {
        input.validate()?;

        if let Some((index, entry)) = self.special_cases.lookup(input) {
            tracing::debug!(
                index,
                label = entry.label.as_deref().unwrap_or(""),
                "Special case matched"
            );
            // Same floor as the correction layer; NaN also lands on zero.
            return Ok(Estimate {
                amount: entry.amount.max(0.0),
                source: EstimateSource::SpecialCase(index),
            });
        }

        let model = match &self.model {
            ModelState::Ready(model) => model,
            ModelState::Unavailable { .. } => return Ok(self.fallback(input)),
        };

        match model.predict(input) {
            Ok(raw) => {
                let amount = self.corrections.apply(input, raw);
                tracing::debug!(raw, amount, "Tree prediction");
                Ok(Estimate {
                    amount,
                    source: EstimateSource::Tree,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "Tree evaluation failed for {:?}: {}; using fallback formula",
                    input,
                    e
                );
                Ok(self.fallback(input))
            }
        }
    }

    fn fallback(&self, input: &InputTriple) -> Estimate {
        let amount = linear_estimate(input);
        tracing::debug!(amount, "Fallback estimate");
        Estimate {
            amount,
            source: EstimateSource::Fallback,
        }
    }
}

fn shared_estimator() -> &'static Estimator {
    static ESTIMATOR: OnceLock<Estimator> = OnceLock::new();
    ESTIMATOR.get_or_init(|| {
        let path =
            std::env::var(MODEL_PATH_ENV).unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string());
        Estimator::load(path)
    })
}

/// Reimbursement for one trip, using a process-wide estimator loaded on
/// first use from `$REIMBURSE_MODEL` (or `decision_tree.json`).
pub fn calculate_reimbursement(days: u32, miles: f64, receipts: f64) -> Result<f64> {
    shared_estimator()
        .estimate(&InputTriple::new(days, miles, receipts))
        .map(|e| e.amount)
}
