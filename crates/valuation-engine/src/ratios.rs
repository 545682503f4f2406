use serde::{Deserialize, Serialize};
use valuation_core::Metric;

use crate::series::StatementSeries;

/// Point-in-time ratios and year-over-year growth, in percent where noted.
/// A metric that cannot be computed is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Net income / equity, percent
    pub roe: Option<f64>,
    /// Net income / assets, percent
    pub roa: Option<f64>,
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "revenueYoY")]
    pub revenue_yoy: Option<f64>,
    #[serde(rename = "profitYoY")]
    pub profit_yoy: Option<f64>,
    pub ocf_to_net_income: Option<f64>,
    pub eps_growth: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoeTier {
    Strong,
    Ok,
    Weak,
}

impl RoeTier {
    pub fn classify(roe: f64) -> Self {
        if roe > 15.0 {
            RoeTier::Strong
        } else if roe >= 10.0 {
            RoeTier::Ok
        } else {
            RoeTier::Weak
        }
    }

    fn note(&self) -> &'static str {
        match self {
            RoeTier::Strong => "✔ ROE > 15% (strong)",
            RoeTier::Ok => "= ROE 10-15% (ok)",
            RoeTier::Weak => "✖ ROE < 10% (weak)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeverageTier {
    Low,
    Moderate,
    High,
}

impl LeverageTier {
    pub fn classify(debt_to_equity: f64) -> Self {
        if debt_to_equity < 0.5 {
            LeverageTier::Low
        } else if debt_to_equity <= 1.5 {
            LeverageTier::Moderate
        } else {
            LeverageTier::High
        }
    }

    fn note(&self) -> &'static str {
        match self {
            LeverageTier::Low => "✔ Low debt relative to equity",
            LeverageTier::Moderate => "= Moderate debt",
            LeverageTier::High => "✖ High leverage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthTier {
    Strong,
    Stable,
    Declining,
}

impl GrowthTier {
    pub fn classify(growth_pct: f64) -> Self {
        if growth_pct > 10.0 {
            GrowthTier::Strong
        } else if growth_pct >= 0.0 {
            GrowthTier::Stable
        } else {
            GrowthTier::Declining
        }
    }

    fn note(&self, subject: &str) -> String {
        match self {
            GrowthTier::Strong => format!("✔ Strong {} growth", subject.to_lowercase()),
            GrowthTier::Stable => format!("= {} stable/slow growth", subject),
            GrowthTier::Declining => format!("✖ {} declining", subject),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CashFlowQuality {
    SupportsEarnings,
    WeakRelativeToEarnings,
}

impl CashFlowQuality {
    pub fn classify(ocf_to_net_income: f64) -> Self {
        if ocf_to_net_income > 0.8 {
            CashFlowQuality::SupportsEarnings
        } else {
            CashFlowQuality::WeakRelativeToEarnings
        }
    }

    fn note(&self) -> &'static str {
        match self {
            CashFlowQuality::SupportsEarnings => "✔ Operating cash flow supports earnings",
            CashFlowQuality::WeakRelativeToEarnings => "⚠ Operating cash flow weak relative to earnings",
        }
    }
}

/// Qualitative tier for each tiered metric, `None` when the metric is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTiers {
    pub roe: Option<RoeTier>,
    pub debt_to_equity: Option<LeverageTier>,
    #[serde(rename = "revenueYoY")]
    pub revenue_yoy: Option<GrowthTier>,
    #[serde(rename = "profitYoY")]
    pub profit_yoy: Option<GrowthTier>,
    pub ocf_to_net_income: Option<CashFlowQuality>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioReport {
    pub metrics: Metrics,
    pub tiers: MetricTiers,
    pub checklist: Vec<String>,
}

/// `(a - b) / |b| * 100`; `None` when either side is missing or `b` is zero.
pub fn percent_change(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) if b != 0.0 => Some((a - b) / b.abs() * 100.0),
        _ => None,
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Ratios from the latest period and growth against the prior one.
pub fn compute_ratios(series: &StatementSeries) -> RatioReport {
    let mut report = RatioReport::default();
    let checklist = &mut report.checklist;

    let net_income = series.latest(Metric::NetIncome);
    let equity = series.latest(Metric::TotalEquity);
    let assets = series.latest(Metric::TotalAssets);
    let ocf = series.latest(Metric::OperatingCashFlow);

    report.metrics.roe = ratio(net_income, equity).map(|r| r * 100.0);
    match report.metrics.roe {
        Some(roe) => {
            let tier = RoeTier::classify(roe);
            checklist.push(format!("ROE: {:.2}%", roe));
            checklist.push(tier.note().to_string());
            report.tiers.roe = Some(tier);
        }
        None => checklist
            .push("⚠ ROE could not be computed (missing Net Income or Equity).".to_string()),
    }

    report.metrics.roa = ratio(net_income, assets).map(|r| r * 100.0);
    match report.metrics.roa {
        Some(roa) => checklist.push(format!("ROA: {:.2}%", roa)),
        None => checklist
            .push("⚠ ROA could not be computed (missing Net Income or Assets).".to_string()),
    }

    report.metrics.debt_to_equity = series.debt_to_equity(0);
    match report.metrics.debt_to_equity {
        Some(de) => {
            let tier = LeverageTier::classify(de);
            checklist.push(format!("Debt-to-Equity: {:.2}", de));
            checklist.push(tier.note().to_string());
            report.tiers.debt_to_equity = Some(tier);
        }
        None => checklist
            .push("⚠ Debt/Equity could not be computed (missing debt or equity).".to_string()),
    }

    report.metrics.revenue_yoy = percent_change(
        series.latest(Metric::Revenue),
        series.at(Metric::Revenue, 1),
    );
    report.tiers.revenue_yoy = growth_entry(checklist, "Revenue", report.metrics.revenue_yoy);

    report.metrics.profit_yoy = percent_change(net_income, series.at(Metric::NetIncome, 1));
    report.tiers.profit_yoy = growth_entry(checklist, "Profit", report.metrics.profit_yoy);

    report.metrics.ocf_to_net_income = ratio(ocf, net_income);
    match report.metrics.ocf_to_net_income {
        Some(q) => {
            let tier = CashFlowQuality::classify(q);
            checklist.push(format!("OCF/NetIncome: {:.2}", q));
            checklist.push(tier.note().to_string());
            report.tiers.ocf_to_net_income = Some(tier);
        }
        None => checklist.push("⚠ OCF to Net Income ratio not available.".to_string()),
    }

    report.metrics.eps_growth =
        percent_change(series.latest(Metric::Eps), series.at(Metric::Eps, 1));
    match report.metrics.eps_growth {
        Some(g) => checklist.push(format!("EPS YoY: {:.2}%", g)),
        None => checklist.push("⚠ EPS growth not available.".to_string()),
    }

    report
}

fn growth_entry(checklist: &mut Vec<String>, subject: &str, growth: Option<f64>) -> Option<GrowthTier> {
    match growth {
        Some(g) => {
            let tier = GrowthTier::classify(g);
            checklist.push(format!("{} YoY: {:.2}%", subject, g));
            checklist.push(tier.note(subject));
            Some(tier)
        }
        None => {
            checklist.push(format!("⚠ {} YoY not available.", subject));
            None
        }
    }
}
