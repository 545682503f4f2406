//! Peer-table valuation scorecard.
//!
//! Six independent checks, each worth at most one point. A check whose
//! source data is absent (missing or zero) is skipped without penalty.
//! Verdict thresholds sit on a 7-point scale while the checks award at most
//! 6 points, so this scorecard never reaches "Undervalued".

use serde::{Deserialize, Serialize};
use valuation_core::{CompanySnapshot, PeerComparison};

pub const UNDERVALUED_SCORE: u32 = 7;
pub const FAIRLY_VALUED_SCORE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScorecardVerdict {
    #[serde(rename = "Undervalued")]
    Undervalued,
    #[serde(rename = "Fairly Valued")]
    FairlyValued,
    #[serde(rename = "Overvalued")]
    Overvalued,
}

impl ScorecardVerdict {
    pub fn from_score(score: u32) -> Self {
        if score >= UNDERVALUED_SCORE {
            ScorecardVerdict::Undervalued
        } else if score >= FAIRLY_VALUED_SCORE {
            ScorecardVerdict::FairlyValued
        } else {
            ScorecardVerdict::Overvalued
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub score: u32,
    pub verdict: ScorecardVerdict,
    pub checklist: Vec<String>,
}

/// Scorecard payload for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockValuation {
    pub company: String,
    pub latest_price: Option<f64>,
    pub valuation: ScorecardVerdict,
    pub score: u32,
    pub checklist: Vec<String>,
}

/// Upstream zeroes mean "not reported".
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

/// Position of `price` within the yearly range: 0 at the low, 1 at the high.
/// `None` when any input is absent or the range is empty.
pub fn range_position(price: Option<f64>, high: Option<f64>, low: Option<f64>) -> Option<f64> {
    let (price, high, low) = (present(price)?, present(high)?, present(low)?);
    if high == low {
        return None;
    }
    Some((price - low) / (high - low))
}

pub fn evaluate(
    peer: Option<&PeerComparison>,
    price: Option<f64>,
    year_high: Option<f64>,
    year_low: Option<f64>,
) -> Scorecard {
    let default_peer = PeerComparison::default();
    let peer = peer.unwrap_or(&default_peer);
    let mut score = 0;
    let mut checklist = Vec::new();

    if let Some(pe) = present(peer.pe_ratio) {
        if pe < 15.0 {
            score += 1;
            checklist.push("✔ PE ratio indicates the stock may be undervalued.");
        } else if pe <= 25.0 {
            checklist.push("= PE ratio is within fair valuation range.");
        } else {
            checklist.push("✖ PE ratio indicates the stock may be overvalued.");
        }
    }

    if let Some(pb) = present(peer.pb_ratio) {
        if pb < 1.0 {
            score += 1;
            checklist.push("✔ PB ratio < 1: Stock appears undervalued.");
        } else if pb <= 3.0 {
            checklist.push("= PB ratio indicates fair valuation.");
        } else {
            checklist.push("✖ PB ratio > 3: Stock might be overvalued.");
        }
    }

    if let Some(roe) = present(peer.roe_ttm) {
        if roe > 15.0 {
            score += 1;
            checklist.push("✔ ROE > 15%: Strong profitability.");
        } else if roe >= 10.0 {
            checklist.push("= ROE is acceptable.");
        } else {
            checklist.push("✖ ROE < 10%: Weak profitability.");
        }
    }

    if let Some(de) = present(peer.debt_to_equity) {
        if de < 0.5 {
            score += 1;
            checklist.push("✔ Low debt: Very safe company.");
        } else if de <= 1.5 {
            checklist.push("= Debt level is acceptable.");
        } else {
            checklist.push("✖ High debt: Risky company.");
        }
    }

    if let (Some(ttm), Some(five_year)) = (
        present(peer.net_profit_margin_ttm),
        present(peer.net_profit_margin_5yr),
    ) {
        if ttm > five_year {
            score += 1;
            checklist.push("✔ Profit margin improving YoY.");
        } else {
            checklist.push("✖ Profit margin declining.");
        }
    }

    // An empty yearly range (high == low) skips the check instead of dividing by zero.
    if let Some(position) = range_position(price, year_high, year_low) {
        if position < 0.3 {
            score += 1;
            checklist.push("✔ Stock is trading near year low (undervalued zone).");
        } else if position < 0.7 {
            checklist.push("= Stock is fairly priced within its range.");
        } else {
            checklist.push("✖ Near year high: potentially overvalued.");
        }
    }

    Scorecard {
        score,
        verdict: ScorecardVerdict::from_score(score),
        checklist: checklist.into_iter().map(String::from).collect(),
    }
}

pub fn stock_valuation(snapshot: &CompanySnapshot) -> StockValuation {
    let card = evaluate(
        snapshot.peer.as_ref(),
        snapshot.latest_price,
        snapshot.company.year_high,
        snapshot.company.year_low,
    );
    StockValuation {
        company: snapshot.company.name.clone(),
        latest_price: snapshot.latest_price,
        valuation: card.verdict,
        score: card.score,
        checklist: card.checklist,
    }
}
