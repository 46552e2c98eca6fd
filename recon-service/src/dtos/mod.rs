//! Request/response DTOs for recon-service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// Source tag carried on every machine-generated suggestion.
pub const MATCH_SOURCE_SYSTEM: &str = "SYSTEM";

// ============================================================================
// Match DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[validate(length(
        min = 1,
        max = 500,
        message = "transactions must contain between 1 and 500 rows"
    ))]
    pub transactions: Vec<BankTransactionDto>,
}

/// One parsed statement row as submitted by the caller.
///
/// `amount` stays a raw JSON value so the response can echo exactly what
/// came in; callers send numbers or numeric strings depending on how their
/// CSV parser behaved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransactionDto {
    #[serde(default)]
    pub id: Option<String>,
    pub date: String,
    pub amount: Value,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Matched,
    Unmatched,
    Error,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedMatchDto {
    pub id: Uuid,
    pub reference: String,
    pub date: NaiveDate,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: String,
    pub amount: Value,
    pub description: String,
    pub status: MatchStatus,
    pub match_confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_match: Option<SuggestedMatchDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Confirm DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub journal_entry_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedEntryDto {
    pub id: Uuid,
    pub entry_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub date: NaiveDate,
    pub status: String,
}

impl From<crate::models::JournalEntry> for ConfirmedEntryDto {
    fn from(entry: crate::models::JournalEntry) -> Self {
        Self {
            id: entry.entry_id,
            entry_number: entry.entry_number,
            reference: entry.reference,
            date: entry.entry_date,
            status: entry.status,
        }
    }
}
