//! Common test utilities for recon-service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use recon_service::config::{DatabaseConfig, MatchingConfig, ReconConfig};
use recon_service::models::{Account, Direction, EntryStatus, JournalEntry, JournalLine};
use recon_service::services::ledger::{CandidateQuery, LedgerCandidate, LedgerStore};
use recon_service::startup::{api_router, AppState};
use rust_decimal::Decimal;
use serde_json::Value;
use service_core::config::Config as CommonConfig;
use service_core::error::AppError;
use std::str::FromStr;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

static INIT: Once = Once::new();

/// User id carried in the X-User-ID header for authenticated test calls.
pub const TEST_USER: &str = "test-user";

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,recon_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// In-memory `LedgerStore` used instead of Postgres.
///
/// `fail_candidate_queries` and `candidate_delay` exist to provoke the
/// per-row error paths (store failure, query timeout).
#[derive(Default)]
pub struct InMemoryLedger {
    pub accounts: Vec<Account>,
    pub entries: Mutex<Vec<JournalEntry>>,
    pub lines: Vec<JournalLine>,
    pub fail_candidate_queries: bool,
    pub candidate_delay: Option<Duration>,
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn find_cash_account(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .iter()
            .find(|a| a.tenant_id == tenant_id && a.code == code && a.is_active)
            .cloned())
    }

    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<LedgerCandidate>, AppError> {
        if let Some(delay) = self.candidate_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_candidate_queries {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "injected candidate query failure"
            )));
        }

        let entries = self.entries.lock().unwrap();
        let mut candidates: Vec<LedgerCandidate> = self
            .lines
            .iter()
            .filter(|line| line.account_id == query.account_id)
            .filter_map(|line| {
                let entry = entries.iter().find(|e| e.entry_id == line.entry_id)?;
                if entry.tenant_id != query.tenant_id
                    || entry.status != EntryStatus::Posted.as_str()
                    || entry.entry_date < query.window_start
                    || entry.entry_date > query.window_end
                {
                    return None;
                }
                let amount = match query.direction {
                    Direction::Inflow => line.debit,
                    Direction::Outflow => line.credit,
                };
                if amount <= Decimal::ZERO
                    || amount < query.band_low()
                    || amount > query.band_high()
                {
                    return None;
                }
                Some(LedgerCandidate {
                    line_id: line.line_id,
                    entry_id: entry.entry_id,
                    entry_number: entry.entry_number.clone(),
                    entry_date: entry.entry_date,
                    entry_description: entry.description.clone(),
                    reference: entry.reference.clone(),
                    amount,
                })
            })
            .collect();
        candidates.sort_by_key(|c| (c.entry_date, c.entry_id, c.line_id));
        Ok(candidates)
    }

    async fn get_entry(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<JournalEntry>, AppError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .find(|e| e.tenant_id == tenant_id && e.entry_id == entry_id)
            .cloned())
    }

    async fn mark_entry_reconciled(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<JournalEntry>, AppError> {
        let mut entries = self.entries.lock().unwrap();
        for entry in entries.iter_mut() {
            if entry.tenant_id == tenant_id
                && entry.entry_id == entry_id
                && entry.status == EntryStatus::Posted.as_str()
            {
                entry.status = EntryStatus::Reconciled.as_str().to_string();
                entry.updated_utc = Utc::now();
                return Ok(Some(entry.clone()));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn cash_account(tenant_id: Uuid, code: &str) -> Account {
    Account {
        account_id: Uuid::new_v4(),
        tenant_id,
        code: code.to_string(),
        name: "Bank Account".to_string(),
        account_type: "asset".to_string(),
        is_active: true,
        created_utc: Utc::now(),
        updated_utc: Utc::now(),
    }
}

pub fn entry_with_status(
    tenant_id: Uuid,
    date: &str,
    reference: Option<&str>,
    status: EntryStatus,
) -> JournalEntry {
    let entry_id = Uuid::new_v4();
    JournalEntry {
        entry_id,
        tenant_id,
        entry_number: format!("JE-{}", &entry_id.simple().to_string()[..8]),
        entry_date: day(date),
        description: "Customer payment".to_string(),
        reference: reference.map(|r| r.to_string()),
        status: status.as_str().to_string(),
        posted_by: None,
        created_utc: Utc::now(),
        updated_utc: Utc::now(),
    }
}

pub fn posted_entry(tenant_id: Uuid, date: &str, reference: Option<&str>) -> JournalEntry {
    entry_with_status(tenant_id, date, reference, EntryStatus::Posted)
}

pub fn debit_line(entry_id: Uuid, account_id: Uuid, amount: &str) -> JournalLine {
    JournalLine {
        line_id: Uuid::new_v4(),
        entry_id,
        account_id,
        description: None,
        debit: dec(amount),
        credit: Decimal::ZERO,
        created_utc: Utc::now(),
    }
}

pub fn credit_line(entry_id: Uuid, account_id: Uuid, amount: &str) -> JournalLine {
    JournalLine {
        line_id: Uuid::new_v4(),
        entry_id,
        account_id,
        description: None,
        debit: Decimal::ZERO,
        credit: dec(amount),
        created_utc: Utc::now(),
    }
}

// ============================================================================
// Router and request helpers
// ============================================================================

pub fn default_matching() -> MatchingConfig {
    MatchingConfig {
        cash_account_code: "1000".to_string(),
        window_days: 5,
        amount_tolerance: dec("0.10"),
        max_concurrency: 4,
        query_timeout_ms: 5_000,
    }
}

pub fn test_config() -> ReconConfig {
    ReconConfig {
        common: CommonConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        service_name: "recon-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 2,
            min_connections: 1,
        },
        matching: default_matching(),
    }
}

/// Router over the business routes backed by the given in-memory store.
pub fn test_router(ledger: Arc<InMemoryLedger>) -> Router {
    test_router_with(ledger, default_matching())
}

pub fn test_router_with(ledger: Arc<InMemoryLedger>, matching: MatchingConfig) -> Router {
    init_tracing();
    let mut config = test_config();
    config.matching = matching;
    api_router(AppState { config, ledger })
}

/// Posts a JSON body with the identity headers the caller chooses to send.
pub async fn post_json(
    router: &Router,
    path: &str,
    tenant_id: Option<&str>,
    user_id: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user_id {
        builder = builder.header("X-User-ID", user);
    }
    if let Some(tenant) = tenant_id {
        builder = builder.header("X-Tenant-ID", tenant);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Posts with both identity headers set, the common case.
pub async fn post_as_tenant(
    router: &Router,
    path: &str,
    tenant_id: Uuid,
    body: &Value,
) -> (StatusCode, Value) {
    post_json(
        router,
        path,
        Some(&tenant_id.to_string()),
        Some(TEST_USER),
        body,
    )
    .await
}
