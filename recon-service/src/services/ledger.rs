//! Ledger read/write port used by the matching pipeline.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{Account, Direction, JournalEntry};

/// Tenant-scoped candidate search parameters.
///
/// `window_start`/`window_end` and the amount band derived from
/// `abs_amount` ± `tolerance` are both inclusive.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    pub direction: Direction,
    pub abs_amount: Decimal,
    pub tolerance: Decimal,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

impl CandidateQuery {
    /// Lower edge of the amount band. May go negative for small amounts;
    /// the store only ever returns lines with a positive amount on the
    /// queried side, so a negative edge is harmless.
    pub fn band_low(&self) -> Decimal {
        self.abs_amount - self.tolerance
    }

    /// Upper edge of the amount band.
    pub fn band_high(&self) -> Decimal {
        self.abs_amount + self.tolerance
    }
}

/// A posted journal line that falls inside a candidate query's window
/// and amount band.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerCandidate {
    pub line_id: Uuid,
    pub entry_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub entry_description: String,
    pub reference: Option<String>,
    pub amount: Decimal,
}

/// Storage port for the ledger side of reconciliation.
///
/// The production implementation is backed by Postgres; tests swap in an
/// in-memory store.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Looks up the tenant's active cash account by account code.
    async fn find_cash_account(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<Account>, AppError>;

    /// Returns all candidate lines for one statement row, ordered by
    /// entry date, then entry id, then line id.
    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<LedgerCandidate>, AppError>;

    /// Fetches a journal entry regardless of status.
    async fn get_entry(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<JournalEntry>, AppError>;

    /// Transitions a posted entry to reconciled. Returns `None` when no
    /// posted entry with that id exists for the tenant.
    async fn mark_entry_reconciled(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<JournalEntry>, AppError>;
}
