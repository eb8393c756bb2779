use crate::utils::error::Result;
use crate::utils::validation::{validate_input_amount, Validate};
use serde::{Deserialize, Serialize};

/// The three raw request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputTriple {
    pub days: u32,
    pub miles: f64,
    pub receipts: f64,
}

impl InputTriple {
    pub fn new(days: u32, miles: f64, receipts: f64) -> Self {
        Self {
            days,
            miles,
            receipts,
        }
    }

    /// Miles per day, with a zero day count treated as one day.
    pub fn miles_per_day(&self) -> f64 {
        per_day(self.miles, self.days)
    }

    /// Receipts per day, with a zero day count treated as one day.
    pub fn receipts_per_day(&self) -> f64 {
        per_day(self.receipts, self.days)
    }
}

impl Validate for InputTriple {
    fn validate(&self) -> Result<()> {
        validate_input_amount("miles", self.miles)?;
        validate_input_amount("receipts", self.receipts)?;
        Ok(())
    }
}

fn per_day(amount: f64, days: u32) -> f64 {
    if days > 0 {
        amount / f64::from(days)
    } else {
        amount
    }
}

/// Which stage of the pipeline produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// Index into the special-case table that matched.
    SpecialCase(usize),
    Tree,
    Fallback,
}

impl std::fmt::Display for EstimateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SpecialCase(index) => write!(f, "special_case[{}]", index),
            Self::Tree => f.write_str("tree"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub amount: f64,
    pub source: EstimateSource,
}

impl Estimate {
    /// Amount rounded to the nearest cent.
    pub fn rounded(&self) -> f64 {
        (self.amount * 100.0).round() / 100.0
    }
}
