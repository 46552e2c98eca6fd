//! Configuration module for recon-service.

use rust_decimal::Decimal;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ReconConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Tunables for the candidate search and confidence scoring.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Ledger account code the statement rows are matched against.
    pub cash_account_code: String,
    /// Calendar days searched on each side of the statement date.
    pub window_days: i64,
    /// Absolute amount tolerance applied on both sides of the candidate band.
    pub amount_tolerance: Decimal,
    /// Upper bound on concurrent candidate lookups within one batch.
    pub max_concurrency: usize,
    /// Per-transaction candidate lookup timeout.
    pub query_timeout_ms: u64,
}

impl ReconConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "recon-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            matching: MatchingConfig {
                cash_account_code: env::var("CASH_ACCOUNT_CODE")
                    .unwrap_or_else(|_| "1000".to_string()),
                window_days: env::var("MATCH_WINDOW_DAYS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(|d: i64| d.max(0))
                    .unwrap_or(5),
                amount_tolerance: env::var("MATCH_AMOUNT_TOLERANCE")
                    .ok()
                    .and_then(|s| Decimal::from_str(&s).ok())
                    .map(|t: Decimal| t.abs())
                    .unwrap_or_else(|| Decimal::new(10, 2)),
                max_concurrency: env::var("MATCH_MAX_CONCURRENCY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(|c: usize| c.max(1))
                    .unwrap_or(8),
                query_timeout_ms: env::var("MATCH_QUERY_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5_000),
            },
        })
    }
}
