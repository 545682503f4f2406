use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("No financial statements for {0}")]
    NoStatements(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ValuationError {
    /// Missing company or missing statements: the caller should answer "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ValuationError::CompanyNotFound(_) | ValuationError::NoStatements(_)
        )
    }
}
