//! Tenant context extractor for multi-tenancy support.
//!
//! Extracts the caller's identity (user_id, tenant_id) from request headers.
//! These headers are set by the gateway after authenticating the user and
//! resolving their tenant membership; this service never sees credentials.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use std::str::FromStr;
use uuid::Uuid;

/// Tenant context extracted from request headers.
#[derive(Debug, Clone)]
pub struct TenantContext {
    /// User making the request (opaque gateway identifier).
    pub user_id: String,
    /// Tenant every storage call is scoped to.
    pub tenant_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A missing user header means the gateway never authenticated the
        // caller; a missing or malformed tenant header means it could not
        // resolve a tenant for them. The two fail differently on purpose.
        let user_id = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing X-User-ID header (required from gateway)"
                ))
            })?;

        let tenant_header = parts
            .headers
            .get("X-Tenant-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Missing X-Tenant-ID header (required from gateway)"
                ))
            })?;

        let tenant_id = Uuid::from_str(tenant_header).map_err(|_| {
            AppError::BadRequest(anyhow::anyhow!("Invalid X-Tenant-ID header: expected a UUID"))
        })?;

        // Add to tracing span for observability
        let span = tracing::Span::current();
        span.record("user_id", user_id);
        span.record("tenant_id", tenant_header);

        Ok(TenantContext {
            user_id: user_id.to_string(),
            tenant_id,
        })
    }
}
