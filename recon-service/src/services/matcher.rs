//! Matching pipeline that turns parsed statement rows into scored ledger
//! match suggestions.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::config::MatchingConfig;
use crate::dtos::{
    BankTransactionDto, MatchResultDto, MatchStatus, SuggestedMatchDto, MATCH_SOURCE_SYSTEM,
};
use crate::models::Direction;
use crate::services::ledger::{CandidateQuery, LedgerCandidate, LedgerStore};
use crate::services::metrics::record_error;

/// Resolved matching tunables for one request.
#[derive(Debug, Clone)]
pub struct MatcherSettings {
    pub window_days: i64,
    pub amount_tolerance: Decimal,
    pub max_concurrency: usize,
    pub query_timeout: Duration,
}

impl From<&MatchingConfig> for MatcherSettings {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            window_days: config.window_days,
            amount_tolerance: config.amount_tolerance,
            max_concurrency: config.max_concurrency,
            query_timeout: Duration::from_millis(config.query_timeout_ms),
        }
    }
}

/// Per-row input problems. These fail the row, never the batch.
#[derive(Debug, Error, PartialEq)]
pub enum MatchInputError {
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid amount '{0}': expected a decimal number")]
    InvalidAmount(String),
    #[error("zero-amount transactions cannot be matched")]
    ZeroAmount,
}

/// A statement row after parsing and direction classification.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTransaction {
    pub date: NaiveDate,
    pub direction: Direction,
    pub abs_amount: Decimal,
}

/// Outcome of matching one statement row.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched {
        candidate: LedgerCandidate,
        confidence: u8,
    },
    Unmatched,
    Failed {
        reason: String,
    },
}

impl MatchOutcome {
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Matched { .. } => "matched",
            Self::Unmatched => "unmatched",
            Self::Failed { .. } => "error",
        }
    }
}

/// Parses one statement row into a typed record.
///
/// The sign of the amount determines direction (positive means money
/// arrived at the bank); zero amounts are rejected.
pub fn normalize(txn: &BankTransactionDto) -> Result<NormalizedTransaction, MatchInputError> {
    let date = NaiveDate::parse_from_str(txn.date.trim(), "%Y-%m-%d")
        .map_err(|_| MatchInputError::InvalidDate(txn.date.clone()))?;

    let amount =
        parse_amount(&txn.amount).ok_or_else(|| MatchInputError::InvalidAmount(txn.amount.to_string()))?;

    let direction = Direction::from_signed_amount(amount).ok_or(MatchInputError::ZeroAmount)?;

    Ok(NormalizedTransaction {
        date,
        direction,
        abs_amount: amount.abs(),
    })
}

/// Accepts a JSON number or a numeric string.
pub fn parse_amount(raw: &Value) -> Option<Decimal> {
    match raw {
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Symmetric calendar-day window around the statement date, inclusive on
/// both ends. Covers settlement lag in either direction.
pub fn candidate_window(date: NaiveDate, window_days: i64) -> (NaiveDate, NaiveDate) {
    let span = chrono::Duration::days(window_days);
    let start = date.checked_sub_signed(span).unwrap_or(NaiveDate::MIN);
    let end = date.checked_add_signed(span).unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// Picks the candidate with the smallest absolute date distance; ties go
/// to the lowest (entry id, line id) so repeated runs agree.
pub fn select_best<'a>(
    candidates: &'a [LedgerCandidate],
    txn_date: NaiveDate,
) -> Option<&'a LedgerCandidate> {
    candidates
        .iter()
        .min_by_key(|c| ((c.entry_date - txn_date).num_days().abs(), c.entry_id, c.line_id))
}

/// Confidence score for a selected candidate.
///
/// Starts at 100, loses 4 points per day of date distance and 3 per rival
/// candidate (rivals capped at 5), floored at 30. Strictly non-increasing
/// in both inputs: a sole candidate on the exact date scores 100, a sole
/// candidate two days off scores 92.
pub fn confidence(date_distance: i64, candidate_count: usize) -> u8 {
    const DAY_PENALTY: i64 = 4;
    const RIVAL_PENALTY: i64 = 3;
    const RIVAL_CAP: i64 = 5;
    const FLOOR: i64 = 30;

    let rivals = (candidate_count.saturating_sub(1) as i64).min(RIVAL_CAP);
    let score = 100 - DAY_PENALTY * date_distance - RIVAL_PENALTY * rivals;
    score.clamp(FLOOR, 100) as u8
}

/// Matches a single statement row against the ledger.
async fn match_one(
    store: &dyn LedgerStore,
    settings: &MatcherSettings,
    tenant_id: Uuid,
    account_id: Uuid,
    txn: &BankTransactionDto,
) -> MatchOutcome {
    let normalized = match normalize(txn) {
        Ok(n) => n,
        Err(e) => return MatchOutcome::Failed { reason: e.to_string() },
    };

    let (window_start, window_end) = candidate_window(normalized.date, settings.window_days);
    let query = CandidateQuery {
        tenant_id,
        account_id,
        direction: normalized.direction,
        abs_amount: normalized.abs_amount,
        tolerance: settings.amount_tolerance,
        window_start,
        window_end,
    };

    let candidates = match tokio::time::timeout(settings.query_timeout, store.find_candidates(&query)).await {
        Ok(Ok(candidates)) => candidates,
        Ok(Err(e)) => {
            warn!(tenant_id = %tenant_id, error = %e, "Candidate lookup failed");
            record_error("candidate_lookup_error");
            return MatchOutcome::Failed {
                reason: format!("candidate lookup failed: {}", e),
            };
        }
        Err(_) => {
            warn!(
                tenant_id = %tenant_id,
                timeout_ms = settings.query_timeout.as_millis() as u64,
                "Candidate lookup timed out"
            );
            record_error("candidate_lookup_timeout");
            return MatchOutcome::Failed {
                reason: format!(
                    "candidate lookup timed out after {}ms",
                    settings.query_timeout.as_millis()
                ),
            };
        }
    };

    match select_best(&candidates, normalized.date) {
        Some(best) => {
            let distance = (best.entry_date - normalized.date).num_days().abs();
            MatchOutcome::Matched {
                candidate: best.clone(),
                confidence: confidence(distance, candidates.len()),
            }
        }
        None => MatchOutcome::Unmatched,
    }
}

/// Matches a batch of statement rows as a bounded-concurrency parallel
/// map. The result vector has the same length and order as the input;
/// rows never affect each other.
pub async fn match_batch(
    store: &dyn LedgerStore,
    settings: &MatcherSettings,
    tenant_id: Uuid,
    account_id: Uuid,
    transactions: &[BankTransactionDto],
) -> Vec<MatchOutcome> {
    // Inert until polled; `buffered` drives at most `max_concurrency` of
    // them at a time and yields results in input order.
    let lookups: Vec<_> = transactions
        .iter()
        .map(|txn| match_one(store, settings, tenant_id, account_id, txn))
        .collect();

    stream::iter(lookups)
        .buffered(settings.max_concurrency.max(1))
        .collect()
        .await
}

/// Builds the wire result for one row, echoing the submitted fields
/// untouched so the caller can correlate rows by position or id.
pub fn assemble(txn: BankTransactionDto, outcome: MatchOutcome) -> MatchResultDto {
    let description = txn.description.unwrap_or_default();
    match outcome {
        MatchOutcome::Matched { candidate, confidence } => MatchResultDto {
            id: txn.id,
            date: txn.date,
            amount: txn.amount,
            description,
            status: MatchStatus::Matched,
            match_confidence: confidence,
            suggested_match: Some(SuggestedMatchDto {
                id: candidate.entry_id,
                reference: candidate.reference.unwrap_or(candidate.entry_description),
                date: candidate.entry_date,
                source: MATCH_SOURCE_SYSTEM,
            }),
            error: None,
        },
        MatchOutcome::Unmatched => MatchResultDto {
            id: txn.id,
            date: txn.date,
            amount: txn.amount,
            description,
            status: MatchStatus::Unmatched,
            match_confidence: 0,
            suggested_match: None,
            error: None,
        },
        MatchOutcome::Failed { reason } => MatchResultDto {
            id: txn.id,
            date: txn.date,
            amount: txn.amount,
            description,
            status: MatchStatus::Error,
            match_confidence: 0,
            suggested_match: None,
            error: Some(reason),
        },
    }
}
