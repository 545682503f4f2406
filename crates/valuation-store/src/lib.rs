pub mod db;
pub mod models;
pub mod store;

pub use db::ValuationDb;
pub use models::*;
pub use store::CompanyStore;
