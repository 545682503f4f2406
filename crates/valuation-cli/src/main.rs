//! valuation-cli: import upstream market data into SQLite and value companies.
//!
//! Usage:
//!   valuation-cli import data/tata_steel.json
//!   valuation-cli fetch "Tata Steel"
//!   valuation-cli company tata
//!   valuation-cli valuation tata
//!   valuation-cli expert-valuation tata
//!   valuation-cli evaluate snapshot.json       # no database needed
//!   valuation-cli --db sqlite:other.db company tata
//!
//! Every command prints `{"success": .., "data": .., "error": ..}` to stdout.

use anyhow::Context;
use market_client::MarketApiClient;
use serde::Serialize;
use serde_json::Value;
use valuation_core::market::MarketData;
use valuation_core::{CompanySnapshot, ValuationConfig, ValuationError};
use valuation_engine::ValuationEngine;
use valuation_store::{CompanyStore, ValuationDb};

const DEFAULT_DATABASE_URL: &str = "sqlite:valuation.db";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Import(String),
    Fetch(String),
    Company(String),
    Valuation(String),
    ExpertValuation(String),
    Evaluate(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Args {
    db_url: Option<String>,
    command: Command,
}

const USAGE: &str = "usage: valuation-cli [--db URL] <import FILE | fetch NAME | company NAME | valuation NAME | expert-valuation NAME | evaluate FILE>";

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut db_url = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--db" {
            db_url = Some(iter.next().ok_or("--db needs a value")?.clone());
        } else {
            rest.push(arg.as_str());
        }
    }

    let (name, target) = match rest.as_slice() {
        [name, target @ ..] if !target.is_empty() => (*name, target.join(" ")),
        _ => return Err(USAGE.to_string()),
    };

    let command = match name {
        "import" => Command::Import(target),
        "fetch" => Command::Fetch(target),
        "company" => Command::Company(target),
        "valuation" => Command::Valuation(target),
        "expert-valuation" => Command::ExpertValuation(target),
        "evaluate" => Command::Evaluate(target),
        other => return Err(format!("unknown command '{}'\n{}", other, USAGE)),
    };

    Ok(Args { db_url, command })
}

#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }
}

impl ApiResponse<Value> {
    fn error(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

/// Failure that should still produce an envelope: "not found" vs anything else.
#[derive(Debug)]
enum Failure {
    NotFound(String),
    Other(anyhow::Error),
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Other(err)
    }
}

impl From<ValuationError> for Failure {
    fn from(err: ValuationError) -> Self {
        if err.is_not_found() {
            Failure::NotFound(err.to_string())
        } else {
            Failure::Other(err.into())
        }
    }
}

async fn open_store(db_url: &str) -> anyhow::Result<CompanyStore> {
    let db = ValuationDb::new(db_url)
        .await
        .with_context(|| format!("opening database {}", db_url))?;
    Ok(CompanyStore::new(db))
}

async fn run(args: Args, config: ValuationConfig) -> Result<Value, Failure> {
    let db_url = args
        .db_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let engine = ValuationEngine::new(config);

    let data = match args.command {
        Command::Import(path) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            let market: MarketData =
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;
            let company_id = open_store(&db_url).await?.save_market_data(&market).await?;
            serde_json::json!({ "companyId": company_id })
        }
        Command::Fetch(name) => {
            let client = MarketApiClient::from_env()?;
            let market = client.fetch_stock(&name).await?;
            let company_id = open_store(&db_url).await?.save_market_data(&market).await?;
            serde_json::json!({ "companyId": company_id })
        }
        Command::Company(name) => {
            let full = open_store(&db_url)
                .await?
                .company_full_data(&name)
                .await?
                .ok_or_else(|| Failure::NotFound(format!("Company not found: {}", name)))?;
            serde_json::to_value(full).map_err(anyhow::Error::from)?
        }
        Command::Valuation(name) => {
            let store = open_store(&db_url).await?;
            let result = engine.stock_valuation_for(&store, &name).await?;
            serde_json::to_value(result).map_err(anyhow::Error::from)?
        }
        Command::ExpertValuation(name) => {
            let store = open_store(&db_url).await?;
            let result = engine.expert_valuation_for(&store, &name).await?;
            serde_json::to_value(result).map_err(anyhow::Error::from)?
        }
        Command::Evaluate(path) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            let snapshot: CompanySnapshot =
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;
            let result = engine.expert_valuation(&snapshot)?;
            serde_json::to_value(result).map_err(anyhow::Error::from)?
        }
    };

    Ok(data)
}

fn print_json<T: Serialize>(response: &ApiResponse<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "valuation_cli=info,valuation_engine=info,valuation_store=info,market_client=warn".into()
            }),
        )
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(usage) => {
            eprintln!("{}", usage);
            std::process::exit(2);
        }
    };

    let config = ValuationConfig::from_env()?;
    tracing::debug!(
        "Discount rate {}, terminal growth {}, statement limit {}",
        config.dcf.discount_rate,
        config.dcf.terminal_growth,
        config.statement_limit
    );

    match run(args, config).await {
        Ok(data) => print_json(&ApiResponse::success(data)),
        Err(Failure::NotFound(message)) => {
            tracing::warn!("{}", message);
            print_json(&ApiResponse::error(message))?;
            std::process::exit(1);
        }
        Err(Failure::Other(err)) => {
            tracing::error!("{:#}", err);
            print_json(&ApiResponse::error(format!("{:#}", err)))?;
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        let parsed = parse_args(&args(&["expert-valuation", "tata"])).unwrap();
        assert_eq!(parsed.command, Command::ExpertValuation("tata".to_string()));
        assert_eq!(parsed.db_url, None);

        let parsed = parse_args(&args(&["--db", "sqlite::memory:", "fetch", "Tata", "Steel"])).unwrap();
        assert_eq!(parsed.command, Command::Fetch("Tata Steel".to_string()));
        assert_eq!(parsed.db_url.as_deref(), Some("sqlite::memory:"));

        let parsed = parse_args(&args(&["company", "tata", "--db", "sqlite:x.db"])).unwrap();
        assert_eq!(parsed.command, Command::Company("tata".to_string()));
        assert_eq!(parsed.db_url.as_deref(), Some("sqlite:x.db"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["valuation"])).is_err());
        assert!(parse_args(&args(&["delete", "tata"])).is_err());
        assert!(parse_args(&args(&["company", "tata", "--db"])).is_err());
    }

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(ApiResponse::success(serde_json::json!({"companyId": 1}))).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["companyId"], 1);
        assert!(ok["error"].is_null());

        let err = serde_json::to_value(ApiResponse::error("Company not found: x")).unwrap();
        assert_eq!(err["success"], false);
        assert!(err["data"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_company_is_not_found() {
        let parsed = parse_args(&args(&["--db", "sqlite::memory:", "expert-valuation", "nobody"])).unwrap();
        let result = run(parsed, ValuationConfig::builtin().unwrap()).await;
        assert!(matches!(result, Err(Failure::NotFound(_))));

        let parsed = parse_args(&args(&["--db", "sqlite::memory:", "company", "nobody"])).unwrap();
        let result = run(parsed, ValuationConfig::builtin().unwrap()).await;
        assert!(matches!(result, Err(Failure::NotFound(_))));
    }
}
