use valuation_core::{Metric, MetricLabels, Statement};

use crate::resolver::resolve;

/// One value per statement, index 0 = latest period. The index means
/// "periods ago" in the supplied order, not a calendar-aligned year.
pub type MetricSeries = Vec<Option<f64>>;

/// Resolve `candidates` against every statement, preserving statement order.
pub fn build_series<S: AsRef<str>>(statements: &[Statement], candidates: &[S]) -> MetricSeries {
    statements
        .iter()
        .map(|s| resolve(&s.line_items, candidates))
        .collect()
}

/// Aligned series for every metric the engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSeries {
    pub revenue: MetricSeries,
    pub net_income: MetricSeries,
    pub total_assets: MetricSeries,
    pub total_equity: MetricSeries,
    pub total_liabilities: MetricSeries,
    pub operating_cash_flow: MetricSeries,
    pub long_term_debt: MetricSeries,
    pub eps: MetricSeries,
    pub capex: MetricSeries,
}

impl StatementSeries {
    pub fn build(statements: &[Statement], labels: &MetricLabels) -> Self {
        let series = |metric| build_series(statements, labels.labels(metric));
        Self {
            revenue: series(Metric::Revenue),
            net_income: series(Metric::NetIncome),
            total_assets: series(Metric::TotalAssets),
            total_equity: series(Metric::TotalEquity),
            total_liabilities: series(Metric::TotalLiabilities),
            operating_cash_flow: series(Metric::OperatingCashFlow),
            long_term_debt: series(Metric::LongTermDebt),
            eps: series(Metric::Eps),
            capex: series(Metric::Capex),
        }
    }

    pub fn get(&self, metric: Metric) -> &MetricSeries {
        match metric {
            Metric::Revenue => &self.revenue,
            Metric::NetIncome => &self.net_income,
            Metric::TotalAssets => &self.total_assets,
            Metric::TotalEquity => &self.total_equity,
            Metric::TotalLiabilities => &self.total_liabilities,
            Metric::OperatingCashFlow => &self.operating_cash_flow,
            Metric::LongTermDebt => &self.long_term_debt,
            Metric::Eps => &self.eps,
            Metric::Capex => &self.capex,
        }
    }

    /// Value `periods_ago` entries back, `None` when missing or out of range.
    pub fn at(&self, metric: Metric, periods_ago: usize) -> Option<f64> {
        self.get(metric).get(periods_ago).copied().flatten()
    }

    pub fn latest(&self, metric: Metric) -> Option<f64> {
        self.at(metric, 0)
    }

    /// Debt used for leverage ratios: long-term debt, else total liabilities.
    pub fn debt(&self, periods_ago: usize) -> Option<f64> {
        self.at(Metric::LongTermDebt, periods_ago)
            .or_else(|| self.at(Metric::TotalLiabilities, periods_ago))
    }

    /// Debt-to-equity for one period; `None` when either side is missing or
    /// equity is zero.
    pub fn debt_to_equity(&self, periods_ago: usize) -> Option<f64> {
        let debt = self.debt(periods_ago)?;
        let equity = self.at(Metric::TotalEquity, periods_ago)?;
        if equity == 0.0 {
            return None;
        }
        Some(debt / equity)
    }

    pub fn periods(&self) -> usize {
        self.revenue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::{Category, LineItem, LineValue};

    fn statement(year: i64, items: &[(&str, f64)]) -> Statement {
        Statement::new(
            year,
            items
                .iter()
                .map(|(k, v)| LineItem::new(Category::Income, k, k, LineValue::Number(*v)))
                .collect(),
        )
    }

    #[test]
    fn test_series_length_matches_statements() {
        let statements = vec![
            statement(2024, &[("Total Revenue", 110.0)]),
            statement(2023, &[]),
            statement(2022, &[("Total Revenue", 90.0)]),
        ];
        let series = build_series(&statements, &["total revenue"]);
        assert_eq!(series, vec![Some(110.0), None, Some(90.0)]);
        assert!(build_series::<&str>(&[], &["total revenue"]).is_empty());
    }

    #[test]
    fn test_statement_series_all_metrics_aligned() {
        let labels = MetricLabels::builtin().unwrap();
        let statements = vec![
            statement(2024, &[("Total Revenue", 110.0), ("Net Income", 15.0)]),
            statement(2023, &[("Total Revenue", 100.0)]),
        ];
        let series = StatementSeries::build(&statements, &labels);
        assert_eq!(series.periods(), 2);
        for metric in Metric::ALL {
            assert_eq!(series.get(metric).len(), 2);
        }
        assert_eq!(series.latest(Metric::Revenue), Some(110.0));
        assert_eq!(series.at(Metric::Revenue, 1), Some(100.0));
        assert_eq!(series.at(Metric::Revenue, 5), None);
    }

    #[test]
    fn test_debt_prefers_long_term_debt() {
        let labels = MetricLabels::builtin().unwrap();
        let statements = vec![
            statement(
                2024,
                &[("Long Term Debt", 200.0), ("Total Liabilities", 900.0), ("Total Equity", 400.0)],
            ),
            statement(2023, &[("Total Liabilities", 600.0), ("Total Equity", 300.0)]),
        ];
        let series = StatementSeries::build(&statements, &labels);
        assert_eq!(series.debt(0), Some(200.0));
        assert_eq!(series.debt(1), Some(600.0));
        assert_eq!(series.debt_to_equity(0), Some(0.5));
        assert_eq!(series.debt_to_equity(1), Some(2.0));
    }
}
