use crate::db::ValuationDb;
use crate::models::*;
use anyhow::Result;
use async_trait::async_trait;
use valuation_core::market::MarketData;
use valuation_core::{CompanyDataSource, CompanySnapshot, ValuationError};

pub struct CompanyStore {
    db: ValuationDb,
}

impl CompanyStore {
    pub fn new(db: ValuationDb) -> Self {
        Self { db }
    }

    /// Persist one upstream payload in a single transaction and return the
    /// new company id. Nothing is written if any insert fails.
    pub async fn save_market_data(&self, data: &MarketData) -> Result<i64> {
        let mut tx = self.db.pool().begin().await?;

        let company_id = sqlx::query(
            r#"
            INSERT INTO company
            (name, industry, description, isin, bse_code, nse_code, year_high, year_low, percent_change)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.company_name)
        .bind(&data.industry)
        .bind(&data.company_profile.company_description)
        .bind(&data.company_profile.isin)
        .bind(&data.exchange_code_bse)
        .bind(&data.exchange_code_nse)
        .bind(data.year_high)
        .bind(data.year_low)
        .bind(data.percent_change)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for officer in data.officers() {
            sqlx::query(
                r#"
                INSERT INTO officers
                (company_id, rank, since, first_name, middle_name, last_name, age, title)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(company_id)
            .bind(officer.rank)
            .bind(officer.since_date())
            .bind(&officer.first_name)
            .bind(&officer.middle_initial)
            .bind(&officer.last_name)
            .bind(officer.age)
            .bind(officer.title_text())
            .execute(&mut *tx)
            .await?;
        }

        for peer in data.peers() {
            sqlx::query(
                r#"
                INSERT INTO peer_companies
                (company_id, ticker_id, name, pb_ratio, pe_ratio, market_cap, price, percent_change,
                 net_change, roe_5yr, roe_ttm, debt_to_equity, net_profit_margin_5yr,
                 net_profit_margin_ttm, dividend_yield, shares_outstanding, rating, year_high, year_low)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(company_id)
            .bind(&peer.ticker_id)
            .bind(&peer.company_name)
            .bind(peer.pb_ratio)
            .bind(peer.pe_ratio)
            .bind(peer.market_cap)
            .bind(peer.price)
            .bind(peer.percent_change)
            .bind(peer.net_change)
            .bind(peer.roe_5yr)
            .bind(peer.roe_ttm)
            .bind(peer.debt_to_equity)
            .bind(peer.net_profit_margin_5yr)
            .bind(peer.net_profit_margin_ttm)
            .bind(peer.dividend_yield)
            .bind(peer.shares_outstanding)
            .bind(&peer.rating)
            .bind(peer.year_high)
            .bind(peer.year_low)
            .execute(&mut *tx)
            .await?;
        }

        let current = data.current_price.clone().unwrap_or_default();
        for (exchange, price) in [("BSE", current.bse), ("NSE", current.nse)] {
            sqlx::query("INSERT INTO stock_price (company_id, exchange, price) VALUES (?, ?, ?)")
                .bind(company_id)
                .bind(exchange)
                .bind(price)
                .execute(&mut *tx)
                .await?;
        }

        for point in &data.stock_technical_data {
            sqlx::query(
                "INSERT INTO stock_technical_data (company_id, days, bse_price, nse_price) VALUES (?, ?, ?, ?)",
            )
            .bind(company_id)
            .bind(point.days)
            .bind(point.bse_price)
            .bind(point.nse_price)
            .execute(&mut *tx)
            .await?;
        }

        let mut line_items = 0usize;
        for report in &data.financials {
            let statement_id = sqlx::query(
                r#"
                INSERT INTO financial_statements
                (company_id, fiscal_year, period_type, report_type, end_date, end_year)
                VALUES (?, ?, ?, ?, NULL, ?)
                "#,
            )
            .bind(company_id)
            .bind(report.fiscal_year())
            .bind(report.period_type())
            .bind(report.report_type())
            .bind(report.end_year())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            for (category, item) in report.statement.items() {
                sqlx::query(
                    r#"
                    INSERT INTO financial_line_items (statement_id, category, display_name, key_name, value)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(statement_id)
                .bind(category.as_str())
                .bind(&item.display_name)
                .bind(&item.key)
                .bind(item.numeric_value())
                .execute(&mut *tx)
                .await?;
                line_items += 1;
            }
        }

        tx.commit().await?;
        tracing::info!(
            "Saved market data for {} (company_id={}, {} statements, {} line items)",
            data.company_name,
            company_id,
            data.financials.len(),
            line_items
        );

        Ok(company_id)
    }

    /// First company whose name contains `name`, ignoring case.
    pub async fn find_company(&self, name: &str) -> Result<Option<CompanyRow>> {
        let company = sqlx::query_as::<_, CompanyRow>(
            "SELECT * FROM company WHERE LOWER(name) LIKE LOWER(?) ORDER BY company_id LIMIT 1",
        )
        .bind(format!("%{}%", name))
        .fetch_optional(self.db.pool())
        .await?;

        Ok(company)
    }

    pub async fn latest_price(&self, company_id: i64) -> Result<Option<f64>> {
        let price = sqlx::query_as::<_, PriceRow>(
            "SELECT * FROM stock_price WHERE company_id = ? ORDER BY created_at DESC, price_id DESC LIMIT 1",
        )
        .bind(company_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(price.and_then(|p| p.price))
    }

    async fn line_items(&self, statement_id: i64) -> Result<Vec<LineItemRow>> {
        let items = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT category, display_name, key_name, value
            FROM financial_line_items
            WHERE statement_id = ?
            ORDER BY line_item_id
            "#,
        )
        .bind(statement_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(items)
    }

    async fn with_line_items(&self, statements: Vec<StatementRow>) -> Result<Vec<StatementWithItems>> {
        let mut result = Vec::with_capacity(statements.len());
        for statement in statements {
            let line_items = self.line_items(statement.statement_id).await?;
            result.push(StatementWithItems { statement, line_items });
        }
        Ok(result)
    }

    /// Most recent statements first, at most `limit`.
    pub async fn recent_statements(&self, company_id: i64, limit: usize) -> Result<Vec<StatementWithItems>> {
        let statements = sqlx::query_as::<_, StatementRow>(
            r#"
            SELECT * FROM financial_statements
            WHERE company_id = ?
            ORDER BY fiscal_year DESC NULLS LAST, statement_id
            LIMIT ?
            "#,
        )
        .bind(company_id)
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        self.with_line_items(statements).await
    }

    /// Engine input for one company, or `None` when no company matches.
    pub async fn company_snapshot(&self, name: &str, statement_limit: usize) -> Result<Option<CompanySnapshot>> {
        let Some(company) = self.find_company(name).await? else {
            return Ok(None);
        };

        let peer = sqlx::query_as::<_, PeerRow>(
            "SELECT * FROM peer_companies WHERE company_id = ? ORDER BY peer_id LIMIT 1",
        )
        .bind(company.company_id)
        .fetch_optional(self.db.pool())
        .await?;

        let latest_price = self.latest_price(company.company_id).await?;

        let statements = self
            .recent_statements(company.company_id, statement_limit)
            .await?
            .iter()
            .map(StatementWithItems::to_statement)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Loaded snapshot for {} with {} statements",
            company.name,
            statements.len()
        );

        Ok(Some(CompanySnapshot {
            company: company.profile(),
            peer: peer.map(|p| p.comparison()),
            latest_price,
            statements,
        }))
    }

    pub async fn company_full_data(&self, name: &str) -> Result<Option<CompanyFullData>> {
        let Some(company) = self.find_company(name).await? else {
            return Ok(None);
        };
        let id = company.company_id;

        let officers = sqlx::query_as::<_, OfficerRow>(
            "SELECT * FROM officers WHERE company_id = ? ORDER BY officer_id",
        )
        .bind(id)
        .fetch_all(self.db.pool())
        .await?;

        let peers = sqlx::query_as::<_, PeerRow>(
            "SELECT * FROM peer_companies WHERE company_id = ? ORDER BY peer_id",
        )
        .bind(id)
        .fetch_all(self.db.pool())
        .await?;

        let prices = sqlx::query_as::<_, PriceRow>(
            "SELECT * FROM stock_price WHERE company_id = ? ORDER BY created_at DESC, price_id DESC",
        )
        .bind(id)
        .fetch_all(self.db.pool())
        .await?;

        let technical = sqlx::query_as::<_, TechnicalRow>(
            "SELECT * FROM stock_technical_data WHERE company_id = ? ORDER BY technical_id",
        )
        .bind(id)
        .fetch_all(self.db.pool())
        .await?;

        let statements = sqlx::query_as::<_, StatementRow>(
            "SELECT * FROM financial_statements WHERE company_id = ? ORDER BY statement_id",
        )
        .bind(id)
        .fetch_all(self.db.pool())
        .await?;
        let financial_statements = self.with_line_items(statements).await?;

        Ok(Some(CompanyFullData {
            company,
            officers,
            peers,
            prices,
            technical,
            financial_statements,
        }))
    }
}

#[async_trait]
impl CompanyDataSource for CompanyStore {
    async fn company_snapshot(
        &self,
        name: &str,
        statement_limit: usize,
    ) -> Result<CompanySnapshot, ValuationError> {
        CompanyStore::company_snapshot(self, name, statement_limit)
            .await
            .map_err(|e| ValuationError::DatabaseError(e.to_string()))?
            .ok_or_else(|| ValuationError::CompanyNotFound(name.to_string()))
    }
}
