//! Typed failures for the staging/commit workflow.
//!
//! Most functions return `anyhow::Result`; these variants are raised for the
//! conditions callers branch on (`downcast_ref::<StoreError>()`). Everything
//! else (I/O, serde) flows through as-is with context attached.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A proposal or staged source file that should exist does not.
    #[error("not found: {0}")]
    NotFound(String),

    /// The commit ledger already holds a record for this proposal id.
    /// Reported before any side effect; nothing to roll back.
    #[error("proposal {0} was already committed")]
    AlreadyCommitted(String),
}
