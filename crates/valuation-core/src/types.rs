use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValuationError;

/// Statement section a line item was reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Cash-flow statement
    #[serde(rename = "CAS")]
    CashFlow,
    /// Balance sheet
    #[serde(rename = "BAL")]
    Balance,
    /// Income statement
    #[serde(rename = "INC")]
    Income,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CashFlow => "CAS",
            Category::Balance => "BAL",
            Category::Income => "INC",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAS" => Ok(Category::CashFlow),
            "BAL" => Ok(Category::Balance),
            "INC" => Ok(Category::Income),
            other => Err(ValuationError::InvalidData(format!(
                "unknown line item category '{}'",
                other
            ))),
        }
    }
}

/// Raw value of a line item. Upstream values are either numbers or free text
/// such as "₹1,234.5cr".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineValue {
    Number(f64),
    Text(String),
}

impl From<f64> for LineValue {
    fn from(v: f64) -> Self {
        LineValue::Number(v)
    }
}

impl From<&str> for LineValue {
    fn from(v: &str) -> Self {
        LineValue::Text(v.to_string())
    }
}

/// One labeled figure from a financial statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub category: Category,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub value: Option<LineValue>,
}

impl LineItem {
    pub fn new(
        category: Category,
        key_name: &str,
        display_name: &str,
        value: impl Into<LineValue>,
    ) -> Self {
        Self {
            category,
            display_name: Some(display_name.to_string()),
            key_name: Some(key_name.to_string()),
            value: Some(value.into()),
        }
    }
}

/// Financial statement for one fiscal period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default)]
    pub fiscal_year: Option<i64>,
    #[serde(default)]
    pub end_year: Option<i64>,
    #[serde(default)]
    pub period_type: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Statement {
    pub fn new(fiscal_year: i64, line_items: Vec<LineItem>) -> Self {
        Self {
            fiscal_year: Some(fiscal_year),
            line_items,
            ..Default::default()
        }
    }
}

/// Peer-comparison row stored for a company. The first row is the company's
/// own comparison entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerComparison {
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub pb_ratio: Option<f64>,
    #[serde(default)]
    pub roe_ttm: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub net_profit_margin_ttm: Option<f64>,
    #[serde(default)]
    pub net_profit_margin_5yr: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub company_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub year_high: Option<f64>,
    #[serde(default)]
    pub year_low: Option<f64>,
}

/// Everything the engine needs about one company, already fetched.
/// Statements are ordered most-recent-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanySnapshot {
    pub company: CompanyProfile,
    #[serde(default)]
    pub peer: Option<PeerComparison>,
    #[serde(default)]
    pub latest_price: Option<f64>,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl CompanySnapshot {
    /// Shares outstanding comes from the peer-comparison row; zero counts as unknown.
    pub fn shares_outstanding(&self) -> Option<f64> {
        self.peer
            .as_ref()
            .and_then(|p| p.shares_outstanding)
            .filter(|s| *s != 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_db_code() {
        for c in [Category::CashFlow, Category::Balance, Category::Income] {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("XYZ".parse::<Category>().is_err());
    }

    #[test]
    fn test_line_value_accepts_number_or_text() {
        let item: LineItem = serde_json::from_str(
            r#"{"category":"INC","display_name":"Revenue","key_name":"TotalRevenue","value":"1,200"}"#,
        )
        .unwrap();
        assert_eq!(item.value, Some(LineValue::Text("1,200".to_string())));

        let item: LineItem =
            serde_json::from_str(r#"{"category":"BAL","key_name":"TotalAssets","value":5.5}"#).unwrap();
        assert_eq!(item.value, Some(LineValue::Number(5.5)));
        assert!(item.display_name.is_none());
    }

    #[test]
    fn test_shares_outstanding_ignores_zero() {
        let mut snap = CompanySnapshot::default();
        assert_eq!(snap.shares_outstanding(), None);
        snap.peer = Some(PeerComparison { shares_outstanding: Some(0.0), ..Default::default() });
        assert_eq!(snap.shares_outstanding(), None);
        snap.peer = Some(PeerComparison { shares_outstanding: Some(42.0), ..Default::default() });
        assert_eq!(snap.shares_outstanding(), Some(42.0));
    }
}
