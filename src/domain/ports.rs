use crate::domain::model::InputTriple;
use crate::utils::error::{IntegrityError, Result};

/// Where serialized model bytes come from.
pub trait ModelSource {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// Raw model bytes. A missing model is reported as
    /// [`IntegrityError::MissingModel`], other read failures as I/O errors.
    fn read_model(&self) -> Result<Vec<u8>>;
}

/// Raw prediction for one request, before corrections. An `Err` sends the
/// request to the fallback formula.
pub trait Predictor: Send + Sync + std::fmt::Debug {
    fn predict(&self, input: &InputTriple) -> std::result::Result<f64, IntegrityError>;

    /// One line for logs and summaries.
    fn describe(&self) -> String;
}
