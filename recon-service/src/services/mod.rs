//! Services module for recon-service.

pub mod database;
pub mod ledger;
pub mod matcher;
pub mod metrics;

pub use database::Database;
pub use ledger::{CandidateQuery, LedgerCandidate, LedgerStore};
pub use matcher::{MatchOutcome, MatcherSettings};
pub use metrics::{
    get_metrics, init_metrics, record_batch_size, record_confirmation, record_error,
    record_match_outcome,
};
