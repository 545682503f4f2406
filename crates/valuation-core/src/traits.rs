use async_trait::async_trait;
use crate::{CompanySnapshot, ValuationError};

/// Data-access seam the valuation engine reads from.
///
/// Implementations return `ValuationError::CompanyNotFound` when no company
/// matches `name`.
#[async_trait]
pub trait CompanyDataSource: Send + Sync {
    async fn company_snapshot(
        &self,
        name: &str,
        statement_limit: usize,
    ) -> Result<CompanySnapshot, ValuationError>;
}
