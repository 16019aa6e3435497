//! notevault: staged note triage with atomic vault commits.
//!
//! Raw text files land in a staging inbox, get classified and optionally
//! summarized into an immutable proposal, and a commit applies that
//! proposal to a content-addressed vault with two append-only ledgers:
//! all-or-nothing, deduplicated by content hash, safe to re-run.

pub mod commands;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;

pub use commands::Commands;
pub use config::AppConfig;
pub use errors::StoreError;
pub use models::{CommitResult, Proposal};
