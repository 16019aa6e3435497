// src/services/commit.rs
//! Commit engine: the only component that turns "staged" into "vaulted".
//!
//! A commit applies a previously built proposal as one transaction over
//! four durable artifacts: entry files, the entries ledger, the staged
//! sources, and the commit ledger. Either all of them land, or rollback
//! restores the filesystem exactly as it was before the attempt.
//!
//! The undo log is explicit and scoped to one attempt: files written so
//! far, prior ledger contents (or their absence), and staged moves
//! performed. `AlreadyCommitted` and a missing proposal are reported
//! before any mutation, so those paths need no rollback.

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::errors::StoreError;
use crate::models::{CommitRecord, CommitResult, EntryRecord, ItemStatus, Proposal};
use crate::services::proposal::ProposalStore;
use crate::services::stage::StagingArea;
use crate::services::vault::{self, Vault};
use crate::utils::fsio;

/// Everything one commit attempt has touched, in application order.
/// Rollback replays it backwards: written files are deleted, ledgers are
/// restored byte-for-byte (or removed if they did not exist), and staged
/// moves are undone newest-first.
#[derive(Debug, Default)]
struct UndoLog {
    written: Vec<PathBuf>,
    ledgers: Vec<(PathBuf, Option<String>)>,
    moved: Vec<(PathBuf, PathBuf)>,
}

impl UndoLog {
    fn snapshot_ledger(&mut self, path: &Path) -> Result<()> {
        let prior = if path.exists() {
            Some(fs::read_to_string(path)?)
        } else {
            None
        };
        self.ledgers.push((path.to_path_buf(), prior));
        Ok(())
    }

    fn record_write(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    fn record_move(&mut self, destination: PathBuf, original: PathBuf) {
        self.moved.push((destination, original));
    }

    /// Best-effort restore; individual failures are logged, not raised, so
    /// the original commit error stays the one the caller sees.
    fn rollback(&self) {
        for path in &self.written {
            if path.is_file() {
                if let Err(err) = fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), %err, "rollback: failed to remove written file");
                }
            }
        }

        for (path, prior) in &self.ledgers {
            let outcome = match prior {
                Some(content) => fsio::write_atomic_text(path, content),
                None => {
                    if path.exists() {
                        fs::remove_file(path).map_err(Into::into)
                    } else {
                        Ok(())
                    }
                }
            };
            if let Err(err) = outcome {
                tracing::warn!(path = %path.display(), %err, "rollback: failed to restore ledger");
            }
        }

        for (destination, original) in self.moved.iter().rev() {
            if !destination.exists() {
                continue;
            }
            if let Some(parent) = original.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Err(err) = fs::rename(destination, original) {
                tracing::warn!(
                    from = %destination.display(),
                    to = %original.display(),
                    %err,
                    "rollback: failed to restore staged file"
                );
            }
        }
    }
}

/// Apply a saved proposal to the vault with all-or-nothing semantics.
///
/// Fails with [`StoreError::NotFound`] if the proposal is missing and with
/// [`StoreError::AlreadyCommitted`] if the commit ledger already records
/// this id; both are checked before any side effect. Any I/O failure during
/// application triggers a full rollback and re-surfaces the original error.
pub fn commit_proposal(
    root: &Path,
    proposal_id: &str,
    config: &AppConfig,
) -> Result<CommitResult> {
    let store = ProposalStore::new(root);
    let proposal = store.load(proposal_id)?;

    let vault = Vault::new(root);
    let stage = StagingArea::new(root);
    fsio::ensure_dir(&vault.index_dir())?;

    let commit_records = vault.read_commit_records()?;
    if commit_records
        .iter()
        .any(|record| record.proposal_id == proposal.proposal_id)
    {
        return Err(StoreError::AlreadyCommitted(proposal.proposal_id.clone()).into());
    }

    let mut existing_hashes = vault.existing_hashes()?;

    let mut undo = UndoLog::default();
    undo.snapshot_ledger(&vault.entries_ledger())?;
    undo.snapshot_ledger(&vault.commits_ledger())?;

    tracing::info!(proposal_id = %proposal.proposal_id, "commit started");
    match apply_and_finalize(&vault, &stage, &proposal, config, &mut existing_hashes, &mut undo) {
        Ok(result) => {
            tracing::info!(
                proposal_id = %result.proposal_id,
                committed = result.committed_entries,
                duplicates = result.skipped_duplicates,
                invalid = result.invalid_entries,
                "commit finished"
            );
            Ok(result)
        }
        Err(err) => {
            tracing::warn!(proposal_id = %proposal.proposal_id, %err, "commit failed, rolling back");
            undo.rollback();
            Err(err)
        }
    }
}

fn apply_and_finalize(
    vault: &Vault,
    stage: &StagingArea,
    proposal: &Proposal,
    config: &AppConfig,
    existing_hashes: &mut HashSet<String>,
    undo: &mut UndoLog,
) -> Result<CommitResult> {
    let invalid_entries = proposal
        .items
        .iter()
        .filter(|item| item.status == ItemStatus::Invalid)
        .count();

    // Write entry/summary files in proposal order, skipping content the
    // vault already holds. Invalid items are never written.
    let mut entry_records: Vec<EntryRecord> = Vec::new();
    let mut committed_entries = 0usize;
    let mut skipped_duplicates = 0usize;

    for item in &proposal.items {
        if item.status != ItemStatus::Ready {
            continue;
        }
        if existing_hashes.contains(&item.content_hash) {
            skipped_duplicates += 1;
            continue;
        }

        let entry_path = vault.root().join(&item.target_entry_path);
        fsio::write_atomic_text(
            &entry_path,
            &vault::render_entry_markdown(item, &proposal.proposal_id),
        )?;
        undo.record_write(entry_path);

        let mut summary_path = None;
        if let (Some(summary), Some(rel)) = (&item.summary, &item.target_summary_path) {
            let target = vault.root().join(rel);
            fsio::write_atomic_text(&target, &vault::render_summary_markdown(item, summary))?;
            undo.record_write(target);
            summary_path = Some(rel.clone());
        }

        entry_records.push(EntryRecord {
            entry_id: item.entry_id.clone(),
            proposal_id: proposal.proposal_id.clone(),
            content_hash: item.content_hash.clone(),
            category: item.classification.category.clone(),
            tags: item.classification.tags.clone(),
            entry_path: item.target_entry_path.clone(),
            summary_path,
            source_rel_path: item.source_rel_path.clone(),
            created_at: item.created_at.clone(),
            committed_at: fsio::now_utc_iso(),
        });
        existing_hashes.insert(item.content_hash.clone());
        committed_entries += 1;
    }

    if !entry_records.is_empty() {
        fsio::append_jsonl(&vault.entries_ledger(), &entry_records)?;
    }

    // Every ready item was consumed, committed or skipped as a duplicate,
    // so its staged source leaves the inbox. Invalid items stay put.
    for item in &proposal.items {
        if item.status != ItemStatus::Ready {
            continue;
        }
        let original = vault.root().join(&item.source_rel_path);
        let destination = stage.move_to_processed(&item.source_rel_path, &proposal.proposal_id)?;
        undo.record_move(destination, original);
    }

    let commit_ref = proposal.proposal_id.clone();
    let message = format!(
        "{} apply proposal {} ({} entries, {} duplicates, {} invalid)",
        config.git.commit_prefix,
        proposal.proposal_id,
        committed_entries,
        skipped_duplicates,
        invalid_entries
    );

    let commit_record = CommitRecord {
        proposal_id: proposal.proposal_id.clone(),
        created_at: fsio::now_utc_iso(),
        commit_ref: commit_ref.clone(),
        committed_entries,
        skipped_duplicates,
        invalid_entries,
    };
    fsio::append_jsonl(&vault.commits_ledger(), &[commit_record])?;

    Ok(CommitResult {
        proposal_id: proposal.proposal_id.clone(),
        commit_ref,
        committed_entries,
        skipped_duplicates,
        invalid_entries,
        message,
    })
}
