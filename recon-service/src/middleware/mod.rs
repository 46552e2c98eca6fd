//! Middleware for recon-service.

pub mod tenant;

pub use tenant::TenantContext;
