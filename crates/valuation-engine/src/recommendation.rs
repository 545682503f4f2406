//! Final verdict: intrinsic-vs-market ratio when the DCF produced a usable
//! per-share value, otherwise a qualitative score over the computed metrics.

use serde::{Deserialize, Serialize};

use crate::dcf::DcfResult;
use crate::ratios::Metrics;

pub const UNDERVALUED_RATIO: f64 = 1.2;
pub const FAIRLY_VALUED_RATIO: f64 = 0.9;

pub const LIKELY_UNDERVALUED_SCORE: u32 = 5;
pub const POSSIBLY_FAIR_SCORE: u32 = 2;

pub const FALLBACK_NOTE: &str =
    "Fallback qualitative opinion, not DCF-derived. Use DCF for a definitive intrinsic price.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Undervalued")]
    Undervalued,
    #[serde(rename = "Fairly valued")]
    FairlyValued,
    #[serde(rename = "Overvalued")]
    Overvalued,
    #[serde(rename = "Likely Undervalued")]
    LikelyUndervalued,
    #[serde(rename = "Possibly Fairly Valued")]
    PossiblyFairlyValued,
    #[serde(rename = "Possibly Overvalued")]
    PossiblyOvervalued,
    /// Not produced by [`select_recommendation`].
    #[serde(rename = "Insufficient data")]
    InsufficientData,
}

impl Verdict {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= UNDERVALUED_RATIO {
            Verdict::Undervalued
        } else if ratio >= FAIRLY_VALUED_RATIO {
            Verdict::FairlyValued
        } else {
            Verdict::Overvalued
        }
    }

    pub fn from_qualitative_score(score: u32) -> Self {
        if score >= LIKELY_UNDERVALUED_SCORE {
            Verdict::LikelyUndervalued
        } else if score >= POSSIBLY_FAIR_SCORE {
            Verdict::PossiblyFairlyValued
        } else {
            Verdict::PossiblyOvervalued
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRecommendation {
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intrinsic_per_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    pub reasons: Vec<String>,
}

/// 0-6 points from ROE, leverage, growth and cash-flow quality.
/// Missing metrics earn nothing.
pub fn qualitative_score(metrics: &Metrics) -> u32 {
    let mut score = 0;
    match metrics.roe {
        Some(roe) if roe > 15.0 => score += 2,
        Some(roe) if roe >= 10.0 => score += 1,
        _ => {}
    }
    if metrics.debt_to_equity.is_some_and(|de| de < 1.0) {
        score += 1;
    }
    if metrics.revenue_yoy.is_some_and(|g| g > 5.0) {
        score += 1;
    }
    if metrics.profit_yoy.is_some_and(|g| g > 5.0) {
        score += 1;
    }
    if metrics.ocf_to_net_income.is_some_and(|r| r > 0.7) {
        score += 1;
    }
    score
}

pub fn select_recommendation(
    dcf: &DcfResult,
    market_price: Option<f64>,
    metrics: &Metrics,
) -> ValuationRecommendation {
    let intrinsic = dcf.intrinsic_per_share();
    let usable_intrinsic = intrinsic.filter(|v| v.is_finite() && *v > 0.0);
    let usable_market = market_price.filter(|p| p.is_finite() && *p > 0.0);

    if dcf.possible {
        if let (Some(intrinsic), Some(market)) = (usable_intrinsic, usable_market) {
            let ratio = intrinsic / market;
            return ValuationRecommendation {
                verdict: Verdict::from_ratio(ratio),
                ratio: Some(ratio),
                intrinsic_per_share: Some(intrinsic),
                market_price: Some(market),
                score: None,
                reasons: vec![format!(
                    "Intrinsic value per share {:.2} vs market price {:.2} (ratio {:.2}).",
                    intrinsic, market, ratio
                )],
            };
        }
    }

    let mut reasons = Vec::new();
    if !dcf.possible {
        reasons.push("DCF not possible.".to_string());
    } else if intrinsic.is_none() {
        reasons.push("DCF has no per-share value (shares outstanding unknown).".to_string());
    } else if usable_intrinsic.is_none() {
        reasons.push("DCF produced invalid intrinsic price.".to_string());
    } else {
        reasons.push("Market price unavailable.".to_string());
    }

    let score = qualitative_score(metrics);
    reasons.push(FALLBACK_NOTE.to_string());
    ValuationRecommendation {
        verdict: Verdict::from_qualitative_score(score),
        ratio: None,
        intrinsic_per_share: None,
        market_price: None,
        score: Some(score),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcf;
    use valuation_core::DcfAssumptions;

    fn dcf_with_per_share(per_share: Option<f64>) -> DcfResult {
        let mut valuation = dcf::project(100.0, 0.0, 3, None, &DcfAssumptions::default());
        valuation.intrinsic_per_share = per_share;
        DcfResult { possible: true, valuation: Some(valuation) }
    }

    fn healthy_metrics() -> Metrics {
        Metrics {
            roe: Some(20.0),
            roa: Some(8.0),
            debt_to_equity: Some(0.4),
            revenue_yoy: Some(12.0),
            profit_yoy: Some(9.0),
            ocf_to_net_income: Some(1.1),
            eps_growth: None,
        }
    }

    #[test]
    fn test_ratio_boundary_is_inclusive() {
        let rec = select_recommendation(&dcf_with_per_share(Some(120.0)), Some(100.0), &Metrics::default());
        assert_eq!(rec.verdict, Verdict::Undervalued);
        assert_eq!(rec.ratio, Some(1.2));
        assert_eq!(rec.intrinsic_per_share, Some(120.0));
        assert_eq!(rec.market_price, Some(100.0));
        assert_eq!(rec.score, None);
    }

    #[test]
    fn test_ratio_bands() {
        let fair = select_recommendation(&dcf_with_per_share(Some(90.0)), Some(100.0), &Metrics::default());
        assert_eq!(fair.verdict, Verdict::FairlyValued);

        let over = select_recommendation(&dcf_with_per_share(Some(50.0)), Some(100.0), &Metrics::default());
        assert_eq!(over.verdict, Verdict::Overvalued);
    }

    #[test]
    fn test_dcf_not_possible_falls_back() {
        let rec = select_recommendation(&DcfResult::not_possible(), Some(100.0), &healthy_metrics());
        assert_eq!(rec.score, Some(6));
        assert_eq!(rec.verdict, Verdict::LikelyUndervalued);
        assert!(rec.ratio.is_none());
        assert!(rec.reasons.iter().any(|r| r == FALLBACK_NOTE));
    }

    #[test]
    fn test_invalid_intrinsic_falls_back() {
        let metrics = Metrics {
            roe: Some(12.0),
            debt_to_equity: Some(0.8),
            ..Default::default()
        };
        let rec = select_recommendation(&dcf_with_per_share(Some(-5.0)), Some(100.0), &metrics);
        assert_eq!(rec.score, Some(2));
        assert_eq!(rec.verdict, Verdict::PossiblyFairlyValued);
        assert_eq!(rec.reasons[0], "DCF produced invalid intrinsic price.");
    }

    #[test]
    fn test_missing_market_price_falls_back() {
        let metrics = Metrics { roe: Some(4.0), ..Default::default() };
        let rec = select_recommendation(&dcf_with_per_share(Some(120.0)), None, &metrics);
        assert_eq!(rec.score, Some(0));
        assert_eq!(rec.verdict, Verdict::PossiblyOvervalued);
    }

    #[test]
    fn test_no_metrics_scores_zero() {
        let rec = select_recommendation(&DcfResult::not_possible(), Some(100.0), &Metrics::default());
        assert_eq!(rec.verdict, Verdict::PossiblyOvervalued);
        assert_eq!(rec.score, Some(0));
        assert!(rec.reasons.iter().any(|r| r == FALLBACK_NOTE));
        assert_eq!(qualitative_score(&Metrics::default()), 0);
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let rec = select_recommendation(&DcfResult::not_possible(), None, &healthy_metrics());
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["verdict"], "Likely Undervalued");
        assert_eq!(json["score"], 6);
        assert!(json.get("ratio").is_none());
        assert!(json.get("marketPrice").is_none());
        assert_eq!(
            serde_json::to_value(Verdict::InsufficientData).unwrap(),
            "Insufficient data"
        );
    }
}
