//! Recon Service - Suggests ledger matches for imported bank statement rows.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
