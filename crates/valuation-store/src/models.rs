use serde::{Deserialize, Serialize};
use valuation_core::{Category, CompanyProfile, LineItem, LineValue, PeerComparison, Statement};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompanyRow {
    pub company_id: i64,
    pub name: String,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub isin: Option<String>,
    pub bse_code: Option<String>,
    pub nse_code: Option<String>,
    pub year_high: Option<f64>,
    pub year_low: Option<f64>,
    pub percent_change: Option<f64>,
    pub created_at: Option<String>,
}

impl CompanyRow {
    pub fn profile(&self) -> CompanyProfile {
        CompanyProfile {
            company_id: Some(self.company_id),
            name: self.name.clone(),
            industry: self.industry.clone(),
            year_high: self.year_high,
            year_low: self.year_low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OfficerRow {
    pub officer_id: i64,
    pub company_id: i64,
    pub rank: Option<f64>,
    pub since: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<f64>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PeerRow {
    pub peer_id: i64,
    pub company_id: i64,
    pub ticker_id: Option<String>,
    pub name: Option<String>,
    pub pb_ratio: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub price: Option<f64>,
    pub percent_change: Option<f64>,
    pub net_change: Option<f64>,
    pub roe_5yr: Option<f64>,
    pub roe_ttm: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub net_profit_margin_5yr: Option<f64>,
    pub net_profit_margin_ttm: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub rating: Option<String>,
    pub year_high: Option<f64>,
    pub year_low: Option<f64>,
}

impl PeerRow {
    pub fn comparison(&self) -> PeerComparison {
        PeerComparison {
            pe_ratio: self.pe_ratio,
            pb_ratio: self.pb_ratio,
            roe_ttm: self.roe_ttm,
            debt_to_equity: self.debt_to_equity,
            net_profit_margin_ttm: self.net_profit_margin_ttm,
            net_profit_margin_5yr: self.net_profit_margin_5yr,
            shares_outstanding: self.shares_outstanding,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriceRow {
    pub price_id: i64,
    pub company_id: i64,
    pub exchange: String, // "BSE" or "NSE"
    pub price: Option<f64>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TechnicalRow {
    pub technical_id: i64,
    pub company_id: i64,
    pub days: Option<f64>,
    pub bse_price: Option<f64>,
    pub nse_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatementRow {
    pub statement_id: i64,
    pub company_id: i64,
    pub fiscal_year: Option<i64>,
    pub period_type: Option<String>,
    pub report_type: Option<String>,
    pub end_date: Option<String>,
    pub end_year: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LineItemRow {
    pub category: String,
    pub display_name: Option<String>,
    pub key_name: Option<String>,
    pub value: Option<f64>,
}

impl LineItemRow {
    pub fn to_line_item(&self) -> anyhow::Result<LineItem> {
        Ok(LineItem {
            category: self.category.parse::<Category>()?,
            display_name: self.display_name.clone(),
            key_name: self.key_name.clone(),
            value: self.value.map(LineValue::Number),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementWithItems {
    #[serde(flatten)]
    pub statement: StatementRow,
    pub line_items: Vec<LineItemRow>,
}

impl StatementWithItems {
    pub fn to_statement(&self) -> anyhow::Result<Statement> {
        Ok(Statement {
            fiscal_year: self.statement.fiscal_year,
            end_year: self.statement.end_year,
            period_type: self.statement.period_type.clone(),
            report_type: self.statement.report_type.clone(),
            line_items: self
                .line_items
                .iter()
                .map(LineItemRow::to_line_item)
                .collect::<anyhow::Result<Vec<_>>>()?,
        })
    }
}

/// Everything stored for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFullData {
    pub company: CompanyRow,
    pub officers: Vec<OfficerRow>,
    pub peers: Vec<PeerRow>,
    /// Newest first
    pub prices: Vec<PriceRow>,
    pub technical: Vec<TechnicalRow>,
    pub financial_statements: Vec<StatementWithItems>,
}
