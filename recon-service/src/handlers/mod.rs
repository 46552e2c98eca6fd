//! HTTP handlers for recon-service.

pub mod reconciliation;
