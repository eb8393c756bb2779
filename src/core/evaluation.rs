//! Scoring an estimator against historical cases.

use crate::core::estimator::Estimator;
use crate::domain::model::{EstimateSource, InputTriple};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// Within a cent of the expected amount.
pub const EXACT_TOLERANCE: f64 = 0.01;
/// Within a dollar of the expected amount.
pub const CLOSE_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaseInput {
    pub trip_duration_days: u32,
    pub miles_traveled: f64,
    pub total_receipts_amount: f64,
}

impl From<CaseInput> for InputTriple {
    fn from(c: CaseInput) -> Self {
        InputTriple::new(c.trip_duration_days, c.miles_traveled, c.total_receipts_amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalCase {
    pub input: CaseInput,
    pub expected_output: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub case: usize,
    pub days: u32,
    pub miles: f64,
    pub receipts: f64,
    pub expected: f64,
    pub actual: f64,
    pub error: f64,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationSummary {
    pub cases: usize,
    pub exact: usize,
    pub close: usize,
    pub total_error: f64,
    pub max_error: f64,
    /// Position in the returned results of the case with `max_error`.
    pub worst_case: Option<usize>,
    pub special_case_hits: usize,
    pub tree_hits: usize,
    pub fallback_hits: usize,
    /// Cases with invalid input; not counted in `cases`.
    pub skipped: usize,
}

impl EvaluationSummary {
    pub fn average_error(&self) -> f64 {
        if self.cases == 0 {
            0.0
        } else {
            self.total_error / self.cases as f64
        }
    }

    fn record(&mut self, index: usize, error: f64, source: EstimateSource) {
        self.cases += 1;
        self.total_error += error;
        if error < EXACT_TOLERANCE {
            self.exact += 1;
        }
        if error < CLOSE_TOLERANCE {
            self.close += 1;
        }
        if self.worst_case.is_none() || error > self.max_error {
            self.max_error = error;
            self.worst_case = Some(index);
        }
        match source {
            EstimateSource::SpecialCase(_) => self.special_case_hits += 1,
            EstimateSource::Tree => self.tree_hits += 1,
            EstimateSource::Fallback => self.fallback_hits += 1,
        }
    }
}

/// Runs every case through `estimator`. Errors are compared on the amount
/// rounded to cents, as the command line prints it.
/// Cases the estimator rejects are logged and skipped.
pub fn evaluate(
    estimator: &Estimator,
    cases: &[HistoricalCase],
) -> Result<(Vec<CaseResult>, EvaluationSummary)> {
    let mut results = Vec::with_capacity(cases.len());
    let mut summary = EvaluationSummary::default();

    for (index, case) in cases.iter().enumerate() {
        let input = InputTriple::from(case.input);
        let estimate = match estimator.estimate(&input) {
            Ok(estimate) => estimate,
            Err(e) => {
                tracing::warn!("Skipping case {}: {}", index + 1, e);
                summary.skipped += 1;
                continue;
            }
        };
        let actual = estimate.rounded();
        let error = (actual - case.expected_output).abs();

        summary.record(results.len(), error, estimate.source);
        results.push(CaseResult {
            case: index + 1,
            days: input.days,
            miles: input.miles,
            receipts: input.receipts,
            expected: case.expected_output,
            actual,
            error,
            source: estimate.source.to_string(),
        });
    }

    Ok((results, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(days: u32, miles: f64, receipts: f64, expected: f64) -> HistoricalCase {
        HistoricalCase {
            input: CaseInput {
                trip_duration_days: days,
                miles_traveled: miles,
                total_receipts_amount: receipts,
            },
            expected_output: expected,
        }
    }

    #[test]
    fn test_parse_case_file_layout() {
        let json = r#"[{"input": {"trip_duration_days": 3, "miles_traveled": 93,
                                  "total_receipts_amount": 1.42}, "expected_output": 364.51}]"#;
        let cases: Vec<HistoricalCase> = serde_json::from_str(json).unwrap();
        assert_eq!(cases[0], case(3, 93.0, 1.42, 364.51));
    }

    #[test]
    fn test_summary_counts() {
        let estimator = Estimator::without_model("test");
        let cases = vec![
            // Fallback: 135 + 60 + 39 = 234
            case(1, 100.0, 100.0, 234.0),
            // Off by 0.5
            case(1, 100.0, 100.0, 234.5),
            // Special case 0
            case(1, 250.0, 1300.17, 1145.33),
            // Off by 66
            case(1, 100.0, 100.0, 300.0),
        ];

        let (results, summary) = evaluate(&estimator, &cases).unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[2].source, "special_case[0]");
        assert_eq!(summary.cases, 4);
        assert_eq!(summary.exact, 2);
        assert_eq!(summary.close, 3);
        assert_eq!(summary.worst_case, Some(3));
        assert!((summary.max_error - 66.0).abs() < 1e-9);
        assert!((summary.average_error() - 66.5 / 4.0).abs() < 1e-9);
        assert_eq!(summary.special_case_hits, 1);
        assert_eq!(summary.fallback_hits, 3);
        assert_eq!(summary.tree_hits, 0);
    }

    #[test]
    fn test_invalid_case_is_skipped() {
        let estimator = Estimator::without_model("test");
        let cases = vec![
            case(1, 100.0, 100.0, 234.0),
            case(2, -5.0, 10.0, 100.0),
            case(1, 100.0, 100.0, 234.0),
        ];

        let (results, summary) = evaluate(&estimator, &cases).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].case, 3);
        assert_eq!(summary.cases, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.exact, 2);
        assert_eq!(summary.worst_case, Some(0));
    }

    #[test]
    fn test_empty_case_list() {
        let (results, summary) = evaluate(&Estimator::without_model("test"), &[]).unwrap();
        assert!(results.is_empty());
        assert_eq!(summary.average_error(), 0.0);
        assert_eq!(summary.worst_case, None);
    }
}
