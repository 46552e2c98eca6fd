//! Reconciliation handlers with multi-tenant support.
//!
//! All operations are scoped to the tenant resolved from the request context.

use axum::{extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{ConfirmRequest, ConfirmedEntryDto, MatchRequest, MatchResultDto},
    middleware::TenantContext,
    services::matcher::{self, MatcherSettings},
    services::metrics::{record_batch_size, record_confirmation, record_match_outcome},
    startup::AppState,
};

/// Suggest ledger matches for a batch of bank statement rows.
///
/// The response has the same length and order as the submitted batch; a
/// row that cannot be processed reports its own error instead of failing
/// the request.
pub async fn match_transactions(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(request): Json<MatchRequest>,
) -> Result<Json<Vec<MatchResultDto>>, AppError> {
    request.validate()?;

    let account = state
        .ledger
        .find_cash_account(tenant.tenant_id, &state.config.matching.cash_account_code)
        .await?
        .ok_or_else(|| {
            AppError::UnprocessableEntity(anyhow::anyhow!(
                "No active cash account with code '{}' is configured for this tenant",
                state.config.matching.cash_account_code
            ))
        })?;

    tracing::info!(
        tenant_id = %tenant.tenant_id,
        account_id = %account.account_id,
        batch_size = request.transactions.len(),
        "Matching statement batch"
    );
    record_batch_size(request.transactions.len());

    let settings = MatcherSettings::from(&state.config.matching);
    let outcomes = matcher::match_batch(
        state.ledger.as_ref(),
        &settings,
        tenant.tenant_id,
        account.account_id,
        &request.transactions,
    )
    .await;

    let results: Vec<MatchResultDto> = request
        .transactions
        .into_iter()
        .zip(outcomes)
        .map(|(txn, outcome)| {
            record_match_outcome(outcome.status_label());
            matcher::assemble(txn, outcome)
        })
        .collect();

    Ok(Json(results))
}

/// Mark a suggested journal entry as reconciled once a human accepts it.
pub async fn confirm_match(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<ConfirmedEntryDto>, AppError> {
    tracing::info!(
        tenant_id = %tenant.tenant_id,
        entry_id = %request.journal_entry_id,
        "Confirming match"
    );

    if let Some(entry) = state
        .ledger
        .mark_entry_reconciled(tenant.tenant_id, request.journal_entry_id)
        .await?
    {
        record_confirmation("confirmed");
        return Ok(Json(ConfirmedEntryDto::from(entry)));
    }

    // The update matched no posted row; work out which way it failed.
    match state
        .ledger
        .get_entry(tenant.tenant_id, request.journal_entry_id)
        .await?
    {
        Some(entry) => {
            record_confirmation("conflict");
            Err(AppError::Conflict(anyhow::anyhow!(
                "Journal entry {} is {}; only posted entries can be reconciled",
                request.journal_entry_id,
                entry.status
            )))
        }
        None => {
            record_confirmation("not_found");
            Err(AppError::NotFound(anyhow::anyhow!(
                "Journal entry {} not found",
                request.journal_entry_id
            )))
        }
    }
}
