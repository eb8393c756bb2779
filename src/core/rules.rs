use crate::utils::error::Result;
use crate::utils::validation::validate_finite;
use serde::{Deserialize, Serialize};

/// A numeric range built from optional bounds. An empty interval matches
/// everything.
///
/// In TOML: `miles = { ge = 200.0, le = 210.0 }`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Interval {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
}

impl Interval {
    pub const ANY: Interval = Interval {
        gt: None,
        ge: None,
        lt: None,
        le: None,
    };

    /// `lo <= x <= hi`
    pub const fn between(lo: f64, hi: f64) -> Self {
        Self {
            gt: None,
            ge: Some(lo),
            lt: None,
            le: Some(hi),
        }
    }

    /// `|x - center| < tolerance`
    pub fn around(center: f64, tolerance: f64) -> Self {
        Self {
            gt: Some(center - tolerance),
            ge: None,
            lt: Some(center + tolerance),
            le: None,
        }
    }

    pub const fn above(bound: f64) -> Self {
        Self {
            gt: Some(bound),
            ge: None,
            lt: None,
            le: None,
        }
    }

    pub const fn below(bound: f64) -> Self {
        Self {
            gt: None,
            ge: None,
            lt: Some(bound),
            le: None,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.gt.map_or(true, |b| x > b)
            && self.ge.map_or(true, |b| x >= b)
            && self.lt.map_or(true, |b| x < b)
            && self.le.map_or(true, |b| x <= b)
    }

    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }

    pub fn validate(&self, field_name: &str) -> Result<()> {
        for bound in [self.gt, self.ge, self.lt, self.le].into_iter().flatten() {
            validate_finite(field_name, bound)?;
        }
        Ok(())
    }
}
