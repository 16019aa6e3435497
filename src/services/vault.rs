// src/services/vault.rs
//! Vault layout and rendering: target paths, entry/summary markdown, and
//! the two append-only ledgers under `vault/index/`.
//!
//! Nothing here mutates the vault; writes happen only in the commit
//! engine. This module answers "where does it go" and "what does it look
//! like".

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::models::{CommitRecord, EntryRecord, ProposalItem, SummaryResult};
use crate::utils::fsio;

/// Category → vault folder. Unknown categories land with references.
pub fn category_folder(category: &str) -> &'static str {
    match category {
        "idea" => "ideas",
        "todo" => "todos",
        "reference" => "references",
        "log" => "logs",
        _ => "references",
    }
}

/// `vault/<folder>/<entry_id>.md`, relative to the project root.
pub fn entry_rel_path(entry_id: &str, category: &str) -> String {
    format!("vault/{}/{}.md", category_folder(category), entry_id)
}

/// `vault/summaries/<entry_id>.md`, relative to the project root.
pub fn summary_rel_path(entry_id: &str) -> String {
    format!("vault/summaries/{}.md", entry_id)
}

#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join("vault").join("index")
    }

    pub fn entries_ledger(&self) -> PathBuf {
        self.index_dir().join("entries.jsonl")
    }

    pub fn commits_ledger(&self) -> PathBuf {
        self.index_dir().join("commits.jsonl")
    }

    pub fn read_entry_records(&self) -> Result<Vec<EntryRecord>> {
        fsio::read_jsonl(&self.entries_ledger())
    }

    pub fn read_commit_records(&self) -> Result<Vec<CommitRecord>> {
        fsio::read_jsonl(&self.commits_ledger())
    }

    /// Content hashes of every vaulted entry, the global dedup set.
    pub fn existing_hashes(&self) -> Result<HashSet<String>> {
        Ok(self
            .read_entry_records()?
            .into_iter()
            .map(|record| record.content_hash)
            .collect())
    }
}

fn push_scalar(lines: &mut Vec<String>, key: &str, value: &str) {
    lines.push(format!("{}: {}", key, value.replace('\n', " ")));
}

fn push_list(lines: &mut Vec<String>, key: &str, values: &[String]) {
    lines.push(format!("{}:", key));
    for value in values {
        lines.push(format!("  - {}", value));
    }
}

/// Rendered vault entry: a `---` metadata block followed by the body.
pub fn render_entry_markdown(item: &ProposalItem, proposal_id: &str) -> String {
    let mut lines = vec!["---".to_string()];
    push_scalar(&mut lines, "entry_id", &item.entry_id);
    push_scalar(&mut lines, "category", &item.classification.category);
    push_list(&mut lines, "tags", &item.classification.tags);
    push_scalar(&mut lines, "confidence", &item.classification.confidence.to_string());
    push_scalar(&mut lines, "content_hash", &item.content_hash);
    push_scalar(&mut lines, "source_rel_path", &item.source_rel_path);
    push_scalar(&mut lines, "created_at", &item.created_at);
    push_scalar(&mut lines, "proposal_id", proposal_id);
    push_scalar(
        &mut lines,
        "summary_path",
        item.target_summary_path.as_deref().unwrap_or(""),
    );
    lines.push("---".to_string());

    format!("{}\n\n{}\n", lines.join("\n"), item.body.trim())
}

/// Rendered summary file with key points, actions, and trigger signals.
pub fn render_summary_markdown(item: &ProposalItem, summary: &SummaryResult) -> String {
    let mut lines = vec![
        format!("# Summary for {}", item.entry_id),
        String::new(),
        summary.short_summary.clone(),
        String::new(),
        "## Key Points".to_string(),
    ];
    if summary.key_points.is_empty() {
        lines.push("- (none)".to_string());
    } else {
        lines.extend(summary.key_points.iter().map(|p| format!("- {}", p)));
    }

    lines.push(String::new());
    lines.push("## Actions".to_string());
    if summary.actions.is_empty() {
        lines.push("- (none)".to_string());
    } else {
        lines.extend(summary.actions.iter().map(|a| format!("- {}", a)));
    }

    lines.push(String::new());
    lines.push("## Triggered By".to_string());
    lines.extend(summary.triggered_by.iter().map(|s| format!("- {}", s)));

    lines.push(String::new());
    match summary.redundancy_score {
        Some(score) => lines.push(format!("Redundancy score: {}", score)),
        None => lines.push("Redundancy score: -".to_string()),
    }
    lines.push(String::new());
    lines.join("\n")
}
