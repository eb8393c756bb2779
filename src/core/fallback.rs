use crate::domain::model::InputTriple;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCoefficients {
    pub base: f64,
    pub per_day: f64,
    pub per_mile: f64,
    pub per_receipt: f64,
}

pub const ONE_DAY: LinearCoefficients = LinearCoefficients {
    base: 135.0,
    per_day: 0.0,
    per_mile: 0.60,
    per_receipt: 0.39,
};

pub const MULTI_DAY: LinearCoefficients = LinearCoefficients {
    base: 281.0,
    per_day: 51.0,
    per_mile: 0.36,
    per_receipt: 0.40,
};

/// Closed-form estimate used when the tree cannot answer.
///
/// One-day trips use their own coefficients; every other day count,
/// including zero, uses the multi-day formula. No special cases or
/// corrections apply on this path.
pub fn linear_estimate(input: &InputTriple) -> f64 {
    let c = if input.days == 1 { ONE_DAY } else { MULTI_DAY };
    c.base
        + c.per_day * f64::from(input.days)
        + c.per_mile * input.miles
        + c.per_receipt * input.receipts
}
