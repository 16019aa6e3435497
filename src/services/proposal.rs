// src/services/proposal.rs
//! Proposal building and persistence.
//!
//! `build_proposal` is the dry-run planner: it reads everything pending,
//! consults the classifier and summarizer, and produces an immutable
//! [`Proposal`] without touching the vault. The [`ProposalStore`] persists
//! proposals by id (machine JSON + rendered report) and resolves "latest"
//! by lexicographic id ordering (ids embed a UTC timestamp prefix).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::StoreError;
use crate::models::{ItemStatus, Proposal, ProposalItem, ProposalStats};
use crate::services::classify::Classifier;
use crate::services::stage::StagingArea;
use crate::services::summarize::{self, Summarizer};
use crate::services::vault;
use crate::utils::fsio;

/// `<UTC %Y%m%dT%H%M%SZ>_<8 hex chars>`: sortable by creation time, unique
/// by suffix. A rebuilt proposal over identical input gets a fresh id.
pub fn new_proposal_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", fsio::utc_stamp(), &suffix[..8])
}

/// Plan how every pending staged item would be classified and written.
/// Pure apart from timestamps and id randomness; zero staged items yield a
/// valid empty proposal (`stats.total_items == 0`).
pub fn build_proposal(
    root: &Path,
    config: &AppConfig,
    classifier: &dyn Classifier,
    summarizer: &dyn Summarizer,
) -> Result<Proposal> {
    let stage = StagingArea::new(root);
    let staged_items = stage.load_pending()?;
    let existing_summary_texts = summarize::load_existing_summary_texts(root);
    let pending_count = staged_items.len();

    let proposal_id = new_proposal_id();
    let mut items = Vec::with_capacity(pending_count);

    for staged in &staged_items {
        let entry_id = staged.entry_id();
        let mut classification = classifier.classify(staged, &config.taxonomy);
        // categories outside the configured set are folded to the fallback,
        // whatever classifier produced them
        if !config.taxonomy.allows(&classification.category) {
            classification.category = "reference".to_string();
            classification.confidence = classification.confidence.min(0.35);
            classification.reasoning =
                "category outside configured taxonomy; defaulted to reference".to_string();
        }

        let (status, invalid_reason) = if staged.body.trim().is_empty() {
            (ItemStatus::Invalid, Some("empty body".to_string()))
        } else {
            (ItemStatus::Ready, None)
        };

        let (signals, redundancy) = summarize::summarization_signals(
            staged,
            pending_count,
            &config.summarization,
            &existing_summary_texts,
        );

        let (summary, target_summary_path) = if status == ItemStatus::Ready && !signals.is_empty()
        {
            let summary =
                summarizer.summarize(staged, &classification.category, &signals, redundancy);
            (Some(summary), Some(vault::summary_rel_path(&entry_id)))
        } else {
            (None, None)
        };

        let target_entry_path = vault::entry_rel_path(&entry_id, &classification.category);

        items.push(ProposalItem {
            entry_id,
            source_rel_path: staged.source_rel_path.clone(),
            content_hash: staged.content_hash.clone(),
            created_at: staged.created_at.clone(),
            body: staged.body.clone(),
            metadata: staged.metadata.clone(),
            warnings: staged.warnings.clone(),
            classification,
            summary,
            target_entry_path,
            target_summary_path,
            status,
            invalid_reason,
        });
    }

    let stats = ProposalStats {
        total_items: items.len(),
        ready_items: items.iter().filter(|i| i.status == ItemStatus::Ready).count(),
        invalid_items: items.iter().filter(|i| i.status == ItemStatus::Invalid).count(),
        summary_items: items.iter().filter(|i| i.summary.is_some()).count(),
    };

    let commit_message_preview = format!(
        "{} apply proposal {} ({} entries)",
        config.git.commit_prefix, proposal_id, stats.ready_items
    );

    tracing::info!(
        proposal_id = %proposal_id,
        total = stats.total_items,
        ready = stats.ready_items,
        invalid = stats.invalid_items,
        "proposal built"
    );

    Ok(Proposal {
        proposal_id,
        created_at: fsio::now_utc_iso(),
        items,
        stats,
        config_snapshot: config.snapshot()?,
        commit_message_preview,
    })
}

#[derive(Debug, Clone)]
pub struct ProposalStore {
    root: PathBuf,
}

impl ProposalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(".notevault").join("proposals")
    }

    /// Persist both representations atomically; returns (plan, report).
    pub fn save(&self, proposal: &Proposal) -> Result<(PathBuf, PathBuf)> {
        let dir = self.dir();
        fsio::ensure_dir(&dir)?;
        let json_path = dir.join(format!("{}.json", proposal.proposal_id));
        let md_path = dir.join(format!("{}.md", proposal.proposal_id));

        fsio::write_atomic_json(&json_path, proposal)?;
        fsio::write_atomic_text(&md_path, &render_proposal_markdown(proposal))?;
        Ok((json_path, md_path))
    }

    pub fn load(&self, proposal_id: &str) -> Result<Proposal> {
        let path = self.dir().join(format!("{}.json", proposal_id));
        if !path.exists() {
            return Err(
                StoreError::NotFound(format!("proposal not found: {}", proposal_id)).into(),
            );
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading proposal {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("parsing proposal {:?}", path))
    }

    /// All saved proposal ids, lexicographically sorted (oldest first).
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let dir = self.dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<String> = fs::read_dir(&dir)
            .with_context(|| format!("listing proposals in {:?}", dir))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Most recently created proposal id, by lexicographic ordering.
    pub fn latest_id(&self) -> Result<Option<String>> {
        Ok(self.list_ids()?.pop())
    }

    pub fn load_latest(&self) -> Result<Proposal> {
        let latest = self
            .latest_id()?
            .ok_or_else(|| StoreError::NotFound("no proposals found".to_string()))?;
        self.load(&latest)
    }
}

/// Human-readable report saved next to the JSON plan.
fn render_proposal_markdown(proposal: &Proposal) -> String {
    let mut lines = vec![
        format!("# Proposal {}", proposal.proposal_id),
        String::new(),
        format!("Created: {}", proposal.created_at),
        format!("Total items: {}", proposal.stats.total_items),
        format!("Ready items: {}", proposal.stats.ready_items),
        format!("Invalid items: {}", proposal.stats.invalid_items),
        format!("Summary items: {}", proposal.stats.summary_items),
        String::new(),
        format!("Commit preview: `{}`", proposal.commit_message_preview),
        String::new(),
        "## Items".to_string(),
    ];

    for item in &proposal.items {
        let status = match item.status {
            ItemStatus::Ready => "ready",
            ItemStatus::Invalid => "invalid",
        };
        lines.push(String::new());
        lines.push(format!("### {}", item.entry_id));
        lines.push(format!("- status: {}", status));
        lines.push(format!("- source: `{}`", item.source_rel_path));
        lines.push(format!("- category: `{}`", item.classification.category));
        lines.push(format!("- confidence: {}", item.classification.confidence));
        lines.push(format!("- tags: {}", item.classification.tags.join(", ")));
        lines.push(format!("- target entry: `{}`", item.target_entry_path));
        lines.push(format!(
            "- target summary: `{}`",
            item.target_summary_path.as_deref().unwrap_or("-")
        ));
        if let Some(reason) = &item.invalid_reason {
            lines.push(format!("- invalid reason: {}", reason));
        }
        if !item.warnings.is_empty() {
            lines.push(format!("- warnings: {}", item.warnings.join("; ")));
        }
        if let Some(summary) = &item.summary {
            lines.push(format!("- summary trigger: {}", summary.triggered_by.join(", ")));
        }
    }

    lines.push(String::new());
    lines.join("\n")
}
