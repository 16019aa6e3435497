// src/commands/api.rs
//! Command facade: one entry point per CLI verb, shared by the binary and
//! by embedding callers. Each method resolves the workspace layout and the
//! configuration once, then delegates to the services.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::models::{CommitRecord, CommitResult, Proposal};
use crate::services::classify::KeywordClassifier;
use crate::services::commit::commit_proposal;
use crate::services::proposal::{build_proposal, ProposalStore};
use crate::services::stage::StagingArea;
use crate::services::summarize::ExtractiveSummarizer;
use crate::services::vault::Vault;

/// Outcome of `process`: the built proposal, and where it was saved.
/// An empty batch is valid and is simply not persisted.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub proposal: Proposal,
    pub saved: Option<(PathBuf, PathBuf)>,
}

#[derive(Debug, Default)]
pub struct StatusReport {
    pub pending_files: usize,
    pub saved_proposals: usize,
    pub latest_proposal: Option<String>,
    pub last_commit: Option<CommitRecord>,
}

pub struct Commands {
    root: PathBuf,
    config: AppConfig,
}

impl Commands {
    /// Open a workspace, creating the directory layout if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        crate::commands::init::ensure_layout(&root)?;
        let config = AppConfig::load(&root)?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Write the default configuration file (overwrites an existing one).
    pub fn init_config(&self) -> Result<PathBuf> {
        crate::commands::init::init_default_config(&self.root)
    }

    pub fn stage_add(&self, source: &Path) -> Result<PathBuf> {
        StagingArea::new(&self.root).add(source)
    }

    /// Pending staged files, relative to the workspace root.
    pub fn stage_list(&self) -> Result<Vec<PathBuf>> {
        let pending = StagingArea::new(&self.root).list_pending()?;
        Ok(pending
            .into_iter()
            .map(|p| {
                p.strip_prefix(&self.root)
                    .map(|r| r.to_path_buf())
                    .unwrap_or(p)
            })
            .collect())
    }

    /// Build a proposal over everything pending and save it, unless the
    /// batch is empty.
    pub fn process(&self) -> Result<ProcessOutcome> {
        let proposal = build_proposal(
            &self.root,
            &self.config,
            &KeywordClassifier,
            &ExtractiveSummarizer,
        )?;
        if proposal.stats.total_items == 0 {
            return Ok(ProcessOutcome {
                proposal,
                saved: None,
            });
        }
        let saved = ProposalStore::new(&self.root).save(&proposal)?;
        Ok(ProcessOutcome {
            proposal,
            saved: Some(saved),
        })
    }

    /// Load a proposal by id, or the most recent one for `"latest"`.
    pub fn review(&self, selector: Option<&str>) -> Result<Proposal> {
        let store = ProposalStore::new(&self.root);
        match selector {
            Some("latest") | None => store.load_latest(),
            Some(id) => store.load(id),
        }
    }

    pub fn commit(&self, selector: &str) -> Result<CommitResult> {
        let proposal_id = if selector == "latest" {
            self.review(Some("latest"))?.proposal_id
        } else {
            selector.to_string()
        };
        commit_proposal(&self.root, &proposal_id, &self.config)
    }

    pub fn status(&self) -> Result<StatusReport> {
        let store = ProposalStore::new(&self.root);
        let ids = store.list_ids()?;
        let commits = Vault::new(&self.root).read_commit_records()?;
        Ok(StatusReport {
            pending_files: StagingArea::new(&self.root).list_pending()?.len(),
            saved_proposals: ids.len(),
            latest_proposal: ids.last().cloned(),
            last_commit: commits.into_iter().last(),
        })
    }
}
