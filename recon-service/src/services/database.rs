//! Database service for recon-service.

use crate::models::{Account, Direction, EntryStatus, JournalEntry};
use crate::services::ledger::{CandidateQuery, LedgerCandidate, LedgerStore};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "recon-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for Database {
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn find_cash_account(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<Account>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_cash_account"])
            .start_timer();

        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, tenant_id, code, name, account_type, is_active, created_utc, updated_utc
            FROM accounts
            WHERE tenant_id = $1 AND code = $2 AND is_active = TRUE
            "#,
        )
        .bind(tenant_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find cash account: {}", e)))?;

        timer.observe_duration();
        Ok(account)
    }

    #[instrument(skip(self, query), fields(tenant_id = %query.tenant_id, direction = query.direction.as_str()))]
    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<LedgerCandidate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_candidates"])
            .start_timer();

        // An inflow settles against the debit side of the cash account, an
        // outflow against the credit side. The `> 0` predicate keeps the
        // opposite side's zero-valued lines out when the band edge dips
        // below zero.
        let sql = match query.direction {
            Direction::Inflow => {
                r#"
                SELECT l.line_id, e.entry_id, e.entry_number, e.entry_date,
                       e.description AS entry_description, e.reference, l.debit AS amount
                FROM journal_lines l
                INNER JOIN journal_entries e ON e.entry_id = l.entry_id
                WHERE e.tenant_id = $1
                  AND l.account_id = $2
                  AND e.status = $3
                  AND e.entry_date BETWEEN $4 AND $5
                  AND l.debit > 0
                  AND l.debit BETWEEN $6 AND $7
                ORDER BY e.entry_date, e.entry_id, l.line_id
                "#
            }
            Direction::Outflow => {
                r#"
                SELECT l.line_id, e.entry_id, e.entry_number, e.entry_date,
                       e.description AS entry_description, e.reference, l.credit AS amount
                FROM journal_lines l
                INNER JOIN journal_entries e ON e.entry_id = l.entry_id
                WHERE e.tenant_id = $1
                  AND l.account_id = $2
                  AND e.status = $3
                  AND e.entry_date BETWEEN $4 AND $5
                  AND l.credit > 0
                  AND l.credit BETWEEN $6 AND $7
                ORDER BY e.entry_date, e.entry_id, l.line_id
                "#
            }
        };

        let candidates = sqlx::query_as::<_, LedgerCandidate>(sql)
            .bind(query.tenant_id)
            .bind(query.account_id)
            .bind(EntryStatus::Posted.as_str())
            .bind(query.window_start)
            .bind(query.window_end)
            .bind(query.band_low())
            .bind(query.band_high())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to find candidates: {}", e))
            })?;

        timer.observe_duration();
        Ok(candidates)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, entry_id = %entry_id))]
    async fn get_entry(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<JournalEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_entry"])
            .start_timer();

        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT entry_id, tenant_id, entry_number, entry_date, description, reference, status, posted_by, created_utc, updated_utc
            FROM journal_entries
            WHERE tenant_id = $1 AND entry_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get entry: {}", e)))?;

        timer.observe_duration();
        Ok(entry)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, entry_id = %entry_id))]
    async fn mark_entry_reconciled(
        &self,
        tenant_id: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<JournalEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_entry_reconciled"])
            .start_timer();

        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            UPDATE journal_entries
            SET status = $3, updated_utc = NOW()
            WHERE tenant_id = $1 AND entry_id = $2 AND status = $4
            RETURNING entry_id, tenant_id, entry_number, entry_date, description, reference, status, posted_by, created_utc, updated_utc
            "#,
        )
        .bind(tenant_id)
        .bind(entry_id)
        .bind(EntryStatus::Reconciled.as_str())
        .bind(EntryStatus::Posted.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to mark entry reconciled: {}", e))
        })?;

        timer.observe_duration();
        if let Some(entry) = &entry {
            info!(entry_number = %entry.entry_number, "Journal entry reconciled");
        }

        Ok(entry)
    }
}
