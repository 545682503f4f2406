use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ValuationError;

/// Built-in label vocabulary, shipped as data so new statement vocabularies
/// can be added without touching the resolver.
const DEFAULT_METRIC_LABELS: &str = include_str!("../config/metric_labels.json");

/// Financial-statement figures the engine resolves from line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Revenue,
    NetIncome,
    TotalAssets,
    TotalEquity,
    TotalLiabilities,
    OperatingCashFlow,
    LongTermDebt,
    Eps,
    Capex,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Revenue,
        Metric::NetIncome,
        Metric::TotalAssets,
        Metric::TotalEquity,
        Metric::TotalLiabilities,
        Metric::OperatingCashFlow,
        Metric::LongTermDebt,
        Metric::Eps,
        Metric::Capex,
    ];
}

/// Candidate labels per metric, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricLabels(BTreeMap<Metric, Vec<String>>);

impl MetricLabels {
    pub fn builtin() -> Result<Self, ValuationError> {
        Self::from_json(DEFAULT_METRIC_LABELS)
    }

    pub fn from_json(json: &str) -> Result<Self, ValuationError> {
        let labels: MetricLabels = serde_json::from_str(json)
            .map_err(|e| ValuationError::InvalidConfig(format!("metric labels: {}", e)))?;
        labels.validate()?;
        Ok(labels)
    }

    pub fn from_file(path: &str) -> Result<Self, ValuationError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ValuationError::InvalidConfig(format!("{}: {}", path, e)))?;
        Self::from_json(&json)
    }

    pub fn labels(&self, metric: Metric) -> &[String] {
        self.0.get(&metric).map(|v| v.as_slice()).unwrap_or(&[])
    }

    fn validate(&self) -> Result<(), ValuationError> {
        for metric in Metric::ALL {
            let labels = self.labels(metric);
            if labels.is_empty() || labels.iter().all(|l| l.trim().is_empty()) {
                return Err(ValuationError::InvalidConfig(format!(
                    "no candidate labels for {:?}",
                    metric
                )));
            }
        }
        Ok(())
    }
}

/// Fixed assumptions of the discounted-cash-flow projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    /// Annual discount rate (WACC stand-in).
    pub discount_rate: f64,
    /// Perpetual growth used by the Gordon terminal value.
    pub terminal_growth: f64,
    /// Lower clamp for the estimated growth rate.
    pub min_growth: f64,
    /// Upper clamp for the estimated growth rate.
    pub max_growth: f64,
    pub projection_years: u32,
    /// Minimum number of cash-flow values before a projection is attempted.
    pub min_history: usize,
}

impl Default for DcfAssumptions {
    fn default() -> Self {
        Self {
            discount_rate: 0.10,
            terminal_growth: 0.03,
            min_growth: -0.20,
            max_growth: 0.30,
            projection_years: 5,
            min_history: 3,
        }
    }
}

impl DcfAssumptions {
    pub fn validate(&self) -> Result<(), ValuationError> {
        if !self.discount_rate.is_finite() || !self.terminal_growth.is_finite() {
            return Err(ValuationError::InvalidConfig(
                "discount rate and terminal growth must be finite".to_string(),
            ));
        }
        if self.discount_rate <= self.terminal_growth {
            return Err(ValuationError::InvalidConfig(format!(
                "discount rate {} must exceed terminal growth {}",
                self.discount_rate, self.terminal_growth
            )));
        }
        if self.discount_rate <= -1.0 {
            return Err(ValuationError::InvalidConfig(format!(
                "discount rate {} must be greater than -1",
                self.discount_rate
            )));
        }
        if !(self.min_growth <= self.max_growth) {
            return Err(ValuationError::InvalidConfig(format!(
                "growth clamp [{}, {}] is empty",
                self.min_growth, self.max_growth
            )));
        }
        if self.projection_years == 0 {
            return Err(ValuationError::InvalidConfig(
                "projection years must be at least 1".to_string(),
            ));
        }
        if self.min_history < 2 {
            return Err(ValuationError::InvalidConfig(
                "growth estimation needs at least 2 historical values".to_string(),
            ));
        }
        Ok(())
    }
}

/// Engine configuration: DCF assumptions, label vocabulary and how many
/// statements to load per company.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationConfig {
    pub dcf: DcfAssumptions,
    pub labels: MetricLabels,
    pub statement_limit: usize,
}

impl ValuationConfig {
    pub const DEFAULT_STATEMENT_LIMIT: usize = 6;

    pub fn builtin() -> Result<Self, ValuationError> {
        Ok(Self {
            dcf: DcfAssumptions::default(),
            labels: MetricLabels::builtin()?,
            statement_limit: Self::DEFAULT_STATEMENT_LIMIT,
        })
    }

    /// Built-in defaults overridden by `VALUATION_*` environment variables.
    pub fn from_env() -> Result<Self, ValuationError> {
        let labels = match std::env::var("VALUATION_LABELS_PATH") {
            Ok(path) => {
                tracing::info!("Loading metric labels from {}", path);
                MetricLabels::from_file(&path)?
            }
            Err(_) => MetricLabels::builtin()?,
        };

        let defaults = DcfAssumptions::default();
        let dcf = DcfAssumptions {
            discount_rate: env_parse("VALUATION_DISCOUNT_RATE").unwrap_or(defaults.discount_rate),
            terminal_growth: env_parse("VALUATION_TERMINAL_GROWTH").unwrap_or(defaults.terminal_growth),
            min_growth: env_parse("VALUATION_MIN_GROWTH").unwrap_or(defaults.min_growth),
            max_growth: env_parse("VALUATION_MAX_GROWTH").unwrap_or(defaults.max_growth),
            ..defaults
        };

        let config = Self {
            dcf,
            labels,
            statement_limit: env_parse("VALUATION_STATEMENT_LIMIT")
                .unwrap_or(Self::DEFAULT_STATEMENT_LIMIT),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValuationError> {
        self.dcf.validate()?;
        self.labels.validate()?;
        if self.statement_limit == 0 {
            return Err(ValuationError::InvalidConfig(
                "statement limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}
