//! Discounted-cash-flow projection on an OCF-minus-capex free-cash-flow proxy.
//!
//! Growth is estimated from the retained history (CAGR when the oldest value
//! is positive, mean period-over-period change otherwise), clamped, then the
//! newest value is compounded forward and discounted. A Gordon-growth
//! terminal value closes the projection.

use serde::{Deserialize, Serialize};
use valuation_core::DcfAssumptions;

use crate::series::MetricSeries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAssumptions {
    pub historical_years: usize,
    pub fcf_growth: f64,
    pub discount_rate: f64,
    pub terminal_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedCashFlow {
    pub year: u32,
    pub fcf: f64,
    pub pv_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfValuation {
    pub assumptions: AppliedAssumptions,
    pub projections: Vec<ProjectedCashFlow>,
    /// Sum of the discounted projections.
    pub pv: f64,
    pub pv_terminal: f64,
    pub intrinsic_total: f64,
    pub intrinsic_per_share: Option<f64>,
}

/// `{"possible": false}` when the history is too short, otherwise the full
/// valuation flattened next to `possible`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfResult {
    pub possible: bool,
    #[serde(flatten)]
    pub valuation: Option<DcfValuation>,
}

impl DcfResult {
    pub fn not_possible() -> Self {
        Self { possible: false, valuation: None }
    }

    pub fn intrinsic_per_share(&self) -> Option<f64> {
        self.valuation.as_ref().and_then(|v| v.intrinsic_per_share)
    }
}

/// OCF minus capex per period (missing capex counts as zero); periods
/// without OCF are dropped. Order is preserved, newest first.
pub fn fcf_proxy(ocf: &MetricSeries, capex: &MetricSeries) -> Vec<f64> {
    ocf.iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let cap = capex.get(i).copied().flatten().unwrap_or(0.0);
            v.map(|v| v - cap)
        })
        .collect()
}

/// Unclamped growth estimate from a newest-first history of at least two values.
pub fn estimate_growth(fcf: &[f64]) -> f64 {
    let n = fcf.len();
    if n < 2 {
        return 0.0;
    }
    let newest = fcf[0];
    let oldest = fcf[n - 1];

    let growth = if oldest > 0.0 {
        let g = (newest / oldest).abs().powf(1.0 / (n - 1) as f64) - 1.0;
        // The absolute value hides shrinkage; restore the sign.
        if newest < oldest {
            -g.abs()
        } else {
            g
        }
    } else {
        let changes: Vec<f64> = fcf
            .windows(2)
            .filter(|w| w[1] != 0.0)
            .map(|w| (w[0] - w[1]) / w[1].abs())
            .collect();
        if changes.is_empty() {
            0.0
        } else {
            changes.iter().sum::<f64>() / changes.len() as f64
        }
    };

    if growth.is_finite() {
        growth
    } else {
        0.0
    }
}

pub fn clamp_growth(growth: f64, assumptions: &DcfAssumptions) -> f64 {
    let growth = if growth.is_finite() { growth } else { 0.0 };
    growth.max(assumptions.min_growth).min(assumptions.max_growth)
}

/// Project the newest value forward at `growth` and discount it.
pub fn project(
    newest: f64,
    growth: f64,
    historical_years: usize,
    shares_outstanding: Option<f64>,
    assumptions: &DcfAssumptions,
) -> DcfValuation {
    let rate = assumptions.discount_rate;
    let years = assumptions.projection_years;

    let mut fcf = newest;
    let mut pv = 0.0;
    let mut projections = Vec::with_capacity(years as usize);
    for year in 1..=years {
        fcf *= 1.0 + growth;
        let pv_year = fcf / (1.0 + rate).powi(year as i32);
        pv += pv_year;
        projections.push(ProjectedCashFlow { year, fcf, pv_year });
    }

    let terminal = fcf * (1.0 + assumptions.terminal_growth) / (rate - assumptions.terminal_growth);
    let pv_terminal = terminal / (1.0 + rate).powi(years as i32);
    let intrinsic_total = pv + pv_terminal;
    let intrinsic_per_share = shares_outstanding
        .filter(|s| *s > 0.0)
        .map(|s| intrinsic_total / s);

    DcfValuation {
        assumptions: AppliedAssumptions {
            historical_years,
            fcf_growth: growth,
            discount_rate: rate,
            terminal_growth: assumptions.terminal_growth,
        },
        projections,
        pv,
        pv_terminal,
        intrinsic_total,
        intrinsic_per_share,
    }
}

/// Full DCF over the OCF and capex series.
pub fn run(
    ocf: &MetricSeries,
    capex: &MetricSeries,
    shares_outstanding: Option<f64>,
    assumptions: &DcfAssumptions,
) -> DcfResult {
    let fcf = fcf_proxy(ocf, capex);
    if fcf.len() < assumptions.min_history.max(2) {
        tracing::debug!(
            "DCF skipped: {} cash-flow values, need {}",
            fcf.len(),
            assumptions.min_history
        );
        return DcfResult::not_possible();
    }

    let raw_growth = estimate_growth(&fcf);
    let growth = clamp_growth(raw_growth, assumptions);
    tracing::debug!(
        "DCF growth estimate {:.4} (clamped {:.4}) over {} values",
        raw_growth,
        growth,
        fcf.len()
    );

    DcfResult {
        possible: true,
        valuation: Some(project(fcf[0], growth, fcf.len(), shares_outstanding, assumptions)),
    }
}
