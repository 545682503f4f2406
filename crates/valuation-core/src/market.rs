//! Payload returned by the upstream stock-data API.
//!
//! Upstream numbers arrive as JSON numbers, numeric strings or null, so every
//! numeric field goes through [`lenient_f64`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Category;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub industry: Option<String>,
    #[serde(default)]
    pub company_profile: CompanyProfileData,
    #[serde(default, deserialize_with = "lenient_string")]
    pub exchange_code_bse: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub exchange_code_nse: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub year_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub year_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percent_change: Option<f64>,
    #[serde(default)]
    pub peer_company_list: Option<PeerCompanyList>,
    #[serde(default)]
    pub current_price: Option<CurrentPrice>,
    #[serde(default)]
    pub stock_technical_data: Vec<TechnicalPoint>,
    #[serde(default)]
    pub financials: Vec<FinancialReport>,
}

impl MarketData {
    pub fn peers(&self) -> &[PeerCompany] {
        self.peer_company_list
            .as_ref()
            .map(|l| l.peer_company.as_slice())
            .unwrap_or(&[])
    }

    pub fn officers(&self) -> &[Officer] {
        self.company_profile
            .officers
            .as_ref()
            .map(|o| o.officer.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfileData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_description: Option<String>,
    #[serde(rename = "isInId", default, deserialize_with = "lenient_string")]
    pub isin: Option<String>,
    #[serde(default)]
    pub officers: Option<Officers>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Officers {
    #[serde(default)]
    pub officer: Vec<Officer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Officer {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rank: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub since: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(rename = "mI", default, deserialize_with = "lenient_string")]
    pub middle_initial: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub age: Option<f64>,
    #[serde(default)]
    pub title: Option<OfficerTitle>,
}

impl Officer {
    /// `since` is only kept when it looks like a date.
    pub fn since_date(&self) -> Option<&str> {
        self.since.as_deref().filter(|s| s.contains('-'))
    }

    pub fn title_text(&self) -> Option<&str> {
        self.title.as_ref().and_then(|t| t.value.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfficerTitle {
    #[serde(rename = "Value", default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerCompanyList {
    #[serde(default)]
    pub peer_company: Vec<PeerCompany>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerCompany {
    #[serde(default, deserialize_with = "lenient_string")]
    pub ticker_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: Option<String>,
    #[serde(rename = "priceToBookValueRatio", default, deserialize_with = "lenient_f64")]
    pub pb_ratio: Option<f64>,
    #[serde(rename = "priceToEarningsValueRatio", default, deserialize_with = "lenient_f64")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percent_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_change: Option<f64>,
    #[serde(rename = "returnOnAverageEquity5YearAverage", default, deserialize_with = "lenient_f64")]
    pub roe_5yr: Option<f64>,
    #[serde(rename = "returnOnAverageEquityTrailing12Month", default, deserialize_with = "lenient_f64")]
    pub roe_ttm: Option<f64>,
    #[serde(rename = "ltDebtPerEquityMostRecentFiscalYear", default, deserialize_with = "lenient_f64")]
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "netProfitMargin5YearAverage", default, deserialize_with = "lenient_f64")]
    pub net_profit_margin_5yr: Option<f64>,
    #[serde(rename = "netProfitMarginPercentTrailing12Month", default, deserialize_with = "lenient_f64")]
    pub net_profit_margin_ttm: Option<f64>,
    #[serde(rename = "dividendYieldIndicatedAnnualDividend", default, deserialize_with = "lenient_f64")]
    pub dividend_yield: Option<f64>,
    #[serde(rename = "totalSharesOutstanding", default, deserialize_with = "lenient_f64")]
    pub shares_outstanding: Option<f64>,
    #[serde(rename = "overallRating", default, deserialize_with = "lenient_string")]
    pub rating: Option<String>,
    #[serde(rename = "yhigh", default, deserialize_with = "lenient_f64")]
    pub year_high: Option<f64>,
    #[serde(rename = "ylow", default, deserialize_with = "lenient_f64")]
    pub year_low: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentPrice {
    #[serde(rename = "BSE", default, deserialize_with = "lenient_f64")]
    pub bse: Option<f64>,
    #[serde(rename = "NSE", default, deserialize_with = "lenient_f64")]
    pub nse: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalPoint {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub days: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bse_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub nse_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialReport {
    #[serde(rename = "FiscalYear", default, deserialize_with = "lenient_string")]
    pub fiscal_year: Option<String>,
    #[serde(rename = "EndDate", default, deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "lenient_string")]
    pub report_type: Option<String>,
    #[serde(rename = "stockFinancialMap", default)]
    pub statement: StockFinancialMap,
}

impl FinancialReport {
    pub fn fiscal_year(&self) -> Option<i64> {
        self.fiscal_year.as_deref().and_then(leading_int)
    }

    /// Year taken from the leading digits of the end date ("2024-03-31" -> 2024).
    pub fn end_year(&self) -> Option<i64> {
        self.end_date.as_deref().and_then(leading_int)
    }

    pub fn report_type(&self) -> String {
        self.report_type.as_deref().unwrap_or("").trim().to_string()
    }

    /// Period type is reported on the cash-flow items only.
    pub fn period_type(&self) -> Option<&str> {
        self.statement
            .cas
            .first()
            .and_then(|item| item.period_type.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockFinancialMap {
    #[serde(rename = "CAS", default)]
    pub cas: Vec<RawLineItem>,
    #[serde(rename = "BAL", default)]
    pub bal: Vec<RawLineItem>,
    #[serde(rename = "INC", default)]
    pub inc: Vec<RawLineItem>,
}

impl StockFinancialMap {
    /// All items tagged with their statement section, cash flow first.
    pub fn items(&self) -> impl Iterator<Item = (Category, &RawLineItem)> {
        self.cas
            .iter()
            .map(|i| (Category::CashFlow, i))
            .chain(self.bal.iter().map(|i| (Category::Balance, i)))
            .chain(self.inc.iter().map(|i| (Category::Income, i)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub period_type: Option<String>,
}

impl RawLineItem {
    /// Stored value: non-numeric input becomes null.
    pub fn numeric_value(&self) -> Option<f64> {
        value_to_f64(&self.value)
    }
}

/// Accepts a JSON number, a numeric string or null.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// Accepts a JSON string or number; empty strings become null.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Leading integer of a string, ignoring anything after the digits.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "companyName": "Tata Steel",
        "industry": "Iron & Steel",
        "companyProfile": {
            "companyDescription": "Steel maker",
            "isInId": "INE081A01020",
            "officers": {"officer": [
                {"rank": 1, "since": "2017", "firstName": "N", "mI": "", "lastName": "C", "age": "61", "title": {"Value": "Chairman"}},
                {"rank": "2", "since": "2019-02-01", "firstName": "T", "lastName": "N", "title": {"Value": "CEO"}}
            ]}
        },
        "exchangeCodeBse": 500470,
        "exchangeCodeNse": "TATASTEEL",
        "yearHigh": "184.60",
        "yearLow": 128.2,
        "percentChange": null,
        "peerCompanyList": {"peerCompany": [
            {"tickerId": "TISC", "companyName": "Tata Steel", "priceToBookValueRatio": 2.1,
             "priceToEarningsValueRatio": "55.3", "totalSharesOutstanding": 12480000000,
             "ltDebtPerEquityMostRecentFiscalYear": 0.9, "yhigh": 184.6, "ylow": 128.2}
        ]},
        "currentPrice": {"BSE": "150.10", "NSE": 150.2},
        "stockTechnicalData": [{"days": 5, "bsePrice": "149", "nsePrice": 149.1}],
        "financials": [
            {"FiscalYear": "2024", "EndDate": "2024-03-31", "Type": " Annual ",
             "stockFinancialMap": {
                "CAS": [{"displayName": "Cash from Operations", "key": "CashfromOperatingActivities", "value": "2000", "periodType": "12M"}],
                "BAL": [{"displayName": "Total Assets", "key": "TotalAssets", "value": 5000}],
                "INC": [{"displayName": "Revenue", "key": "TotalRevenue", "value": "n/a"}]
             }}
        ]
    }"#;

    #[test]
    fn test_parses_upstream_payload() {
        let data: MarketData = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(data.company_name, "Tata Steel");
        assert_eq!(data.exchange_code_bse.as_deref(), Some("500470"));
        assert_eq!(data.year_high, Some(184.6));
        assert_eq!(data.percent_change, None);
        assert_eq!(data.officers().len(), 2);
        assert_eq!(data.peers()[0].pe_ratio, Some(55.3));
        assert_eq!(data.current_price.as_ref().unwrap().bse, Some(150.10));
        assert_eq!(data.stock_technical_data[0].bse_price, Some(149.0));
    }

    #[test]
    fn test_officer_since_requires_date() {
        let data: MarketData = serde_json::from_str(SAMPLE).unwrap();
        let officers = data.officers();
        assert_eq!(officers[0].since_date(), None);
        assert_eq!(officers[1].since_date(), Some("2019-02-01"));
        assert_eq!(officers[0].middle_initial, None);
        assert_eq!(officers[0].title_text(), Some("Chairman"));
    }

    #[test]
    fn test_report_period_fields() {
        let data: MarketData = serde_json::from_str(SAMPLE).unwrap();
        let report = &data.financials[0];
        assert_eq!(report.fiscal_year(), Some(2024));
        assert_eq!(report.end_year(), Some(2024));
        assert_eq!(report.report_type(), "Annual");
        assert_eq!(report.period_type(), Some("12M"));

        let items: Vec<_> = report.statement.items().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].0, Category::CashFlow);
        assert_eq!(items[0].1.numeric_value(), Some(2000.0));
        assert_eq!(items[2].1.numeric_value(), None);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("2023-12-31"), Some(2023));
        assert_eq!(leading_int(" 2021 "), Some(2021));
        assert_eq!(leading_int("FY"), None);
    }
}
