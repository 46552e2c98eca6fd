//! Domain models for recon-service.

#![allow(clippy::should_implement_trait)]

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Account Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub account_id: Uuid,
    pub tenant_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

// ============================================================================
// Journal Entry Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Draft,
    Posted,
    Reconciled,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
            Self::Reconciled => "reconciled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "draft" => Self::Draft,
            "posted" => Self::Posted,
            "reconciled" => Self::Reconciled,
            _ => Self::Draft,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct JournalEntry {
    pub entry_id: Uuid,
    pub tenant_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub status: String,
    pub posted_by: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct JournalLine {
    pub line_id: Uuid,
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub description: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub created_utc: DateTime<Utc>,
}

// ============================================================================
// Statement Direction
// ============================================================================

/// Side of the cash account a statement row is expected to hit.
///
/// Money arriving at the bank shows up as a debit on the cash account,
/// money leaving as a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inflow,
    Outflow,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }

    /// Classifies a signed statement amount. Zero carries no direction.
    pub fn from_signed_amount(amount: Decimal) -> Option<Self> {
        if amount > Decimal::ZERO {
            Some(Self::Inflow)
        } else if amount < Decimal::ZERO {
            Some(Self::Outflow)
        } else {
            None
        }
    }

    /// Journal line column this direction settles against.
    pub fn ledger_column(&self) -> &'static str {
        match self {
            Self::Inflow => "debit",
            Self::Outflow => "credit",
        }
    }
}
