pub mod dcf;
pub mod piotroski;
pub mod ratios;
pub mod recommendation;
pub mod resolver;
pub mod scorecard;
pub mod series;

use serde::{Deserialize, Serialize};
use valuation_core::{CompanyDataSource, CompanySnapshot, Metric, ValuationConfig, ValuationError};

use crate::dcf::DcfResult;
use crate::piotroski::PiotroskiResult;
use crate::ratios::{MetricTiers, Metrics};
use crate::recommendation::ValuationRecommendation;
use crate::series::{MetricSeries, StatementSeries};

pub use crate::scorecard::{ScorecardVerdict, StockValuation};

pub const DCF_COMPUTED_NOTE: &str =
    "DCF computed (using OCF-based FCF proxy). Review assumptions (growth/discount).";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRef {
    pub name: String,
    pub company_id: Option<i64>,
}

/// Full fundamental valuation of one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertValuation {
    pub company: CompanyRef,
    pub latest_price: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub metrics: Metrics,
    pub tiers: MetricTiers,
    pub revenue_series: MetricSeries,
    pub net_income_series: MetricSeries,
    pub eps_series: MetricSeries,
    pub ocf_series: MetricSeries,
    pub piotroski: PiotroskiResult,
    pub dcf: DcfResult,
    pub checklist: Vec<String>,
    pub valuation_recommendation: ValuationRecommendation,
}

/// Stateless valuation pipeline. Safe to share across concurrent callers.
pub struct ValuationEngine {
    config: ValuationConfig,
}

impl ValuationEngine {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    /// Resolver, series, ratios, Piotroski, DCF and recommendation over one snapshot.
    pub fn expert_valuation(&self, snapshot: &CompanySnapshot) -> Result<ExpertValuation, ValuationError> {
        let name = &snapshot.company.name;
        if snapshot.statements.is_empty() {
            return Err(ValuationError::NoStatements(name.clone()));
        }
        tracing::debug!(
            "Expert valuation for {} over {} statements",
            name,
            snapshot.statements.len()
        );

        let series = StatementSeries::build(&snapshot.statements, &self.config.labels);
        let report = ratios::compute_ratios(&series);
        let piotroski = piotroski::score(&series, &report.metrics);

        let shares_outstanding = snapshot.shares_outstanding();
        let dcf = dcf::run(
            series.get(Metric::OperatingCashFlow),
            series.get(Metric::Capex),
            shares_outstanding,
            &self.config.dcf,
        );

        let mut checklist = report.checklist;
        checklist.push(piotroski.summary());
        if dcf.possible {
            checklist.push(DCF_COMPUTED_NOTE.to_string());
        } else {
            checklist.push(format!(
                "⚠ Not enough cash-flow history to run meaningful DCF (need >= {} yrs).",
                self.config.dcf.min_history
            ));
        }

        let valuation_recommendation =
            recommendation::select_recommendation(&dcf, snapshot.latest_price, &report.metrics);
        tracing::info!(
            "{}: piotroski {}/{}, dcf possible={}, verdict {:?}",
            name,
            piotroski.score,
            piotroski::MAX_SCORE,
            dcf.possible,
            valuation_recommendation.verdict
        );

        Ok(ExpertValuation {
            company: CompanyRef {
                name: name.clone(),
                company_id: snapshot.company.company_id,
            },
            latest_price: snapshot.latest_price,
            shares_outstanding,
            metrics: report.metrics,
            tiers: report.tiers,
            revenue_series: series.revenue,
            net_income_series: series.net_income,
            eps_series: series.eps,
            ocf_series: series.operating_cash_flow,
            piotroski,
            dcf,
            checklist,
            valuation_recommendation,
        })
    }

    pub fn stock_valuation(&self, snapshot: &CompanySnapshot) -> StockValuation {
        scorecard::stock_valuation(snapshot)
    }

    pub async fn expert_valuation_for(
        &self,
        source: &dyn CompanyDataSource,
        name: &str,
    ) -> Result<ExpertValuation, ValuationError> {
        let snapshot = source.company_snapshot(name, self.config.statement_limit).await?;
        self.expert_valuation(&snapshot)
    }

    pub async fn stock_valuation_for(
        &self,
        source: &dyn CompanyDataSource,
        name: &str,
    ) -> Result<StockValuation, ValuationError> {
        let snapshot = source.company_snapshot(name, self.config.statement_limit).await?;
        Ok(self.stock_valuation(&snapshot))
    }
}
