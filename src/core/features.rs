//! Feature extraction for the decision tree.
//!
//! The tree's split indices refer to positions in the vector produced here,
//! so the order of every layout is fixed for the lifetime of a model file.
//!
//! Zero denominators never raise: `miles_per_day` and `receipts_per_day`
//! divide by one when `days` is zero, and `miles_per_receipt` is `0` when
//! `receipts` is zero.

use crate::domain::model::InputTriple;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Days,
    Miles,
    Receipts,
    MilesPerDay,
    ReceiptsPerDay,
    MilesPerReceipt,
    DaysTimesMiles,
    DaysTimesReceipts,
    MilesTimesReceipts,
    DaysSquared,
    MilesSquared,
    ReceiptsSquared,
    LogDays,
    LogMiles,
    LogReceipts,
}

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Miles => "miles",
            Self::Receipts => "receipts",
            Self::MilesPerDay => "miles_per_day",
            Self::ReceiptsPerDay => "receipts_per_day",
            Self::MilesPerReceipt => "miles_per_receipt",
            Self::DaysTimesMiles => "days_x_miles",
            Self::DaysTimesReceipts => "days_x_receipts",
            Self::MilesTimesReceipts => "miles_x_receipts",
            Self::DaysSquared => "days_squared",
            Self::MilesSquared => "miles_squared",
            Self::ReceiptsSquared => "receipts_squared",
            Self::LogDays => "log_days",
            Self::LogMiles => "log_miles",
            Self::LogReceipts => "log_receipts",
        }
    }

    pub fn compute(self, input: &InputTriple) -> f64 {
        let days = f64::from(input.days);
        let miles = input.miles;
        let receipts = input.receipts;

        match self {
            Self::Days => days,
            Self::Miles => miles,
            Self::Receipts => receipts,
            Self::MilesPerDay => input.miles_per_day(),
            Self::ReceiptsPerDay => input.receipts_per_day(),
            Self::MilesPerReceipt => {
                if receipts > 0.0 {
                    miles / receipts
                } else {
                    0.0
                }
            }
            Self::DaysTimesMiles => days * miles,
            Self::DaysTimesReceipts => days * receipts,
            Self::MilesTimesReceipts => miles * receipts,
            Self::DaysSquared => days * days,
            Self::MilesSquared => miles * miles,
            Self::ReceiptsSquared => receipts * receipts,
            // ln(x + 1) rather than ln_1p: thresholds were trained on this form.
            Self::LogDays => (days + 1.0).ln(),
            Self::LogMiles => (miles + 1.0).ln(),
            Self::LogReceipts => (receipts + 1.0).ln(),
        }
    }
}

const EXTENDED: [Feature; 15] = [
    Feature::Days,
    Feature::Miles,
    Feature::Receipts,
    Feature::MilesPerDay,
    Feature::ReceiptsPerDay,
    Feature::MilesPerReceipt,
    Feature::DaysTimesMiles,
    Feature::DaysTimesReceipts,
    Feature::MilesTimesReceipts,
    Feature::DaysSquared,
    Feature::MilesSquared,
    Feature::ReceiptsSquared,
    Feature::LogDays,
    Feature::LogMiles,
    Feature::LogReceipts,
];

const COMPACT: [Feature; 12] = [
    Feature::Days,
    Feature::Miles,
    Feature::Receipts,
    Feature::MilesPerDay,
    Feature::ReceiptsPerDay,
    Feature::MilesPerReceipt,
    Feature::DaysTimesMiles,
    Feature::DaysTimesReceipts,
    Feature::MilesTimesReceipts,
    Feature::LogDays,
    Feature::LogMiles,
    Feature::LogReceipts,
];

/// The ordered feature list a model was trained against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureLayout {
    /// Raw, ratios, interactions, squares, logs: 15 slots.
    #[default]
    Extended,
    /// Raw, ratios, interactions, logs: 12 slots, no squares.
    Compact,
}

impl FeatureLayout {
    pub fn features(self) -> &'static [Feature] {
        match self {
            Self::Extended => &EXTENDED,
            Self::Compact => &COMPACT,
        }
    }

    pub fn width(self) -> usize {
        self.features().len()
    }

    pub fn feature_name(self, index: usize) -> Option<&'static str> {
        self.features().get(index).map(|f| f.name())
    }
}

impl std::fmt::Display for FeatureLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extended => f.write_str("extended"),
            Self::Compact => f.write_str("compact"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    layout: FeatureLayout,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn extract(input: &InputTriple, layout: FeatureLayout) -> Self {
        let values = layout.features().iter().map(|f| f.compute(input)).collect();
        Self { layout, values }
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs, for debug logging.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.layout
            .features()
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.name(), *v))
    }
}
