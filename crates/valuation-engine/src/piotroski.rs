//! Reduced Piotroski-style health score: four of the nine canonical tests.
//! Each test is worth one point; tests that lack data count as failures.

use serde::{Deserialize, Serialize};
use valuation_core::Metric;

use crate::ratios::Metrics;
use crate::series::StatementSeries;

pub const MAX_SCORE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiotroskiTest {
    pub name: String,
    /// `None` when the inputs were unavailable.
    pub passed: Option<bool>,
    pub annotation: String,
}

impl PiotroskiTest {
    fn new(name: &str, passed: Option<bool>, annotation: &str) -> Self {
        Self {
            name: name.to_string(),
            passed,
            annotation: annotation.to_string(),
        }
    }

    fn is_pass(&self) -> bool {
        self.passed == Some(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiotroskiResult {
    pub score: u32,
    pub tests: Vec<PiotroskiTest>,
}

impl PiotroskiResult {
    pub fn summary(&self) -> String {
        format!("Piotroski-like score: {} / {}", self.score, MAX_SCORE)
    }
}

pub fn score(series: &StatementSeries, metrics: &Metrics) -> PiotroskiResult {
    let mut tests = Vec::with_capacity(MAX_SCORE as usize);

    let roa_positive = metrics.roa.map(|roa| roa > 0.0);
    tests.push(PiotroskiTest::new(
        "roaPositive",
        roa_positive,
        if roa_positive == Some(true) {
            "✔ ROA positive"
        } else {
            "✖ ROA not positive or unavailable"
        },
    ));

    let cfo_positive = series.latest(Metric::OperatingCashFlow).map(|ocf| ocf > 0.0);
    tests.push(PiotroskiTest::new(
        "cfoPositive",
        cfo_positive,
        if cfo_positive == Some(true) {
            "✔ CFO positive"
        } else {
            "✖ CFO not positive or unavailable"
        },
    ));

    let profit_improved = metrics.profit_yoy.map(|g| g > 0.0);
    tests.push(PiotroskiTest::new(
        "profitImproved",
        profit_improved,
        if profit_improved == Some(true) {
            "✔ Profit improved YoY"
        } else {
            "✖ Profit not improved or unavailable"
        },
    ));

    tests.push(leverage_test(series));

    let score = tests.iter().filter(|t| t.is_pass()).count() as u32;
    PiotroskiResult { score, tests }
}

/// Passes when debt/equity fell from the prior period to the latest one.
fn leverage_test(series: &StatementSeries) -> PiotroskiTest {
    let attempted = series.debt(0).is_some()
        && series.at(Metric::TotalEquity, 0).is_some()
        && series.at(Metric::TotalEquity, 1).is_some();
    if !attempted {
        return PiotroskiTest::new("leverageImproved", None, "⚠ Leverage change unavailable");
    }

    match (series.debt_to_equity(0), series.debt_to_equity(1)) {
        (Some(current), Some(prior)) if current < prior => {
            PiotroskiTest::new("leverageImproved", Some(true), "✔ Leverage improved")
        }
        (Some(_), Some(_)) => PiotroskiTest::new(
            "leverageImproved",
            Some(false),
            "✖ Leverage not improved or insufficient data",
        ),
        _ => PiotroskiTest::new(
            "leverageImproved",
            None,
            "✖ Leverage not improved or insufficient data",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::compute_ratios;

    fn empty(n: usize) -> StatementSeries {
        StatementSeries {
            revenue: vec![None; n],
            net_income: vec![None; n],
            total_assets: vec![None; n],
            total_equity: vec![None; n],
            total_liabilities: vec![None; n],
            operating_cash_flow: vec![None; n],
            long_term_debt: vec![None; n],
            eps: vec![None; n],
            capex: vec![None; n],
        }
    }

    #[test]
    fn test_all_tests_pass() {
        let mut series = empty(2);
        series.net_income = vec![Some(120.0), Some(100.0)];
        series.total_assets = vec![Some(1000.0), Some(900.0)];
        series.operating_cash_flow = vec![Some(150.0), Some(110.0)];
        series.total_equity = vec![Some(500.0), Some(400.0)];
        series.long_term_debt = vec![Some(200.0), Some(300.0)];

        let metrics = compute_ratios(&series).metrics;
        let result = score(&series, &metrics);
        assert_eq!(result.score, 4);
        assert!(result.tests.iter().all(|t| t.passed == Some(true)));
        assert_eq!(result.summary(), "Piotroski-like score: 4 / 4");
    }

    #[test]
    fn test_missing_data_counts_as_fail() {
        let series = empty(1);
        let metrics = compute_ratios(&series).metrics;
        let result = score(&series, &metrics);
        assert_eq!(result.score, 0);
        assert_eq!(result.tests.len(), 4);
        assert!(result.tests.iter().all(|t| t.passed.is_none()));
        assert_eq!(result.tests[3].annotation, "⚠ Leverage change unavailable");
    }

    #[test]
    fn test_negative_values_fail() {
        let mut series = empty(2);
        series.net_income = vec![Some(-10.0), Some(5.0)];
        series.total_assets = vec![Some(100.0), Some(100.0)];
        series.operating_cash_flow = vec![Some(-1.0), None];
        let metrics = compute_ratios(&series).metrics;
        let result = score(&series, &metrics);
        assert_eq!(result.score, 0);
        assert_eq!(result.tests[0].passed, Some(false));
        assert_eq!(result.tests[1].passed, Some(false));
        assert_eq!(result.tests[2].passed, Some(false));
    }

    #[test]
    fn test_leverage_requires_strict_decrease() {
        let mut series = empty(2);
        series.total_equity = vec![Some(100.0), Some(100.0)];
        series.total_liabilities = vec![Some(50.0), Some(50.0)];
        let metrics = compute_ratios(&series).metrics;
        let result = score(&series, &metrics);
        assert_eq!(result.tests[3].passed, Some(false));
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_leverage_prior_debt_missing() {
        let mut series = empty(2);
        series.total_equity = vec![Some(100.0), Some(100.0)];
        series.total_liabilities = vec![Some(50.0), None];
        let metrics = compute_ratios(&series).metrics;
        let result = score(&series, &metrics);
        assert_eq!(result.tests[3].passed, None);
        assert_eq!(
            result.tests[3].annotation,
            "✖ Leverage not improved or insufficient data"
        );
    }

    #[test]
    fn test_tests_are_independent() {
        let mut series = empty(2);
        series.operating_cash_flow = vec![Some(10.0), None];
        let metrics = compute_ratios(&series).metrics;
        let result = score(&series, &metrics);
        assert_eq!(result.score, 1);
        assert_eq!(result.tests[1].passed, Some(true));
    }
}
