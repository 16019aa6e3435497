// src/models.rs
//! Data model for the staging → proposal → commit pipeline.
//!
//! Everything here is a plain serde value. Proposals and ledger records are
//! written to disk exactly as these shapes serialize, so field names are
//! part of the on-disk format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// A raw note file discovered in the inbox, parsed but not yet classified.
///
/// Identity is a pure function of the exact raw bytes: `content_hash` is
/// SHA-256 of the content, and `entry_id` is a UUIDv5 derived from the hash.
/// Two byte-identical files always map to the same entry id, no matter when
/// or where they were staged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedItem {
    pub source_path: PathBuf,
    /// Path relative to the project root, e.g. `stage/inbox/...`.
    pub source_rel_path: String,
    pub content_hash: String,
    /// File mtime, RFC 3339 at second precision.
    pub created_at: String,
    /// `key: value` pairs from the leading `---` metadata block.
    pub metadata: BTreeMap<String, String>,
    /// Text after metadata extraction, trimmed.
    pub body: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// The raw file content, byte-for-byte.
    pub content: String,
}

impl StagedItem {
    /// Deterministic entry id: UUIDv5 over the content hash.
    pub fn entry_id(&self) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, self.content_hash.as_bytes()).to_string()
    }
}

/// Output of a [`crate::services::classify::Classifier`], embedded by value
/// into a proposal item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    /// Sorted, deduplicated.
    pub tags: Vec<String>,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Output of a [`crate::services::summarize::Summarizer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    pub short_summary: String,
    pub key_points: Vec<String>,
    pub actions: Vec<String>,
    /// Names of the trigger signals that fired (`long_entry`, ...).
    pub triggered_by: Vec<String>,
    #[serde(default)]
    pub redundancy_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Ready,
    Invalid,
}

/// One staged item's planned disposition inside a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalItem {
    pub entry_id: String,
    pub source_rel_path: String,
    pub content_hash: String,
    pub created_at: String,
    pub body: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub classification: ClassificationResult,
    #[serde(default)]
    pub summary: Option<SummaryResult>,
    pub target_entry_path: String,
    #[serde(default)]
    pub target_summary_path: Option<String>,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalStats {
    pub total_items: usize,
    pub ready_items: usize,
    pub invalid_items: usize,
    pub summary_items: usize,
}

/// An immutable dry-run plan. Never mutated after creation; re-running the
/// builder over identical staged input produces a new proposal with a new id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// `<UTC stamp>_<random suffix>`; lexicographically sortable.
    pub proposal_id: String,
    pub created_at: String,
    pub items: Vec<ProposalItem>,
    pub stats: ProposalStats,
    pub config_snapshot: serde_json::Value,
    pub commit_message_preview: String,
}

/// One line of `vault/index/entries.jsonl`, appended per committed entry.
/// `content_hash` values are unique across all historical records; this is
/// the global deduplication key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    pub entry_id: String,
    pub proposal_id: String,
    pub content_hash: String,
    pub category: String,
    pub tags: Vec<String>,
    pub entry_path: String,
    #[serde(default)]
    pub summary_path: Option<String>,
    pub source_rel_path: String,
    pub created_at: String,
    pub committed_at: String,
}

/// One line of `vault/index/commits.jsonl`, appended per committed proposal.
/// At most one record exists per proposal id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub proposal_id: String,
    pub created_at: String,
    pub commit_ref: String,
    pub committed_entries: usize,
    pub skipped_duplicates: usize,
    pub invalid_entries: usize,
}

/// Returned by a successful commit. Counts always reflect what actually
/// happened, including zeros.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResult {
    pub proposal_id: String,
    pub commit_ref: String,
    pub committed_entries: usize,
    pub skipped_duplicates: usize,
    pub invalid_entries: usize,
    pub message: String,
}
