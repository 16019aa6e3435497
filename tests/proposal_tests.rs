// tests/proposal_tests.rs
// Proposal builder and store: planning, persistence, latest resolution,
// and the collaborator seams.

use std::fs;

use tempfile::TempDir;

use notevault::commands::ensure_layout;
use notevault::config::{AppConfig, TaxonomyConfig};
use notevault::models::{
    ClassificationResult, ItemStatus, StagedItem, SummaryResult,
};
use notevault::services::classify::{Classifier, KeywordClassifier};
use notevault::services::proposal::{build_proposal, new_proposal_id, ProposalStore};
use notevault::services::stage::StagingArea;
use notevault::services::summarize::{ExtractiveSummarizer, Summarizer};
use notevault::StoreError;

fn workspace() -> TempDir {
    let temp = TempDir::new().expect("temp dir");
    ensure_layout(temp.path()).expect("layout");
    temp
}

fn stage_note(temp: &TempDir, name: &str, body: &str) {
    let source = temp.path().join(name);
    fs::write(&source, body).unwrap();
    StagingArea::new(temp.path()).add(&source).expect("stage");
}

struct FixedClassifier;

impl Classifier for FixedClassifier {
    fn classify(&self, _item: &StagedItem, _taxonomy: &TaxonomyConfig) -> ClassificationResult {
        ClassificationResult {
            category: "idea".to_string(),
            tags: vec!["idea".to_string()],
            confidence: 0.9,
            reasoning: "stub".to_string(),
        }
    }
}

struct NoopSummarizer;

impl Summarizer for NoopSummarizer {
    fn summarize(
        &self,
        _item: &StagedItem,
        _category: &str,
        triggered_by: &[String],
        _redundancy_score: f64,
    ) -> SummaryResult {
        SummaryResult {
            short_summary: "stub summary".to_string(),
            key_points: Vec::new(),
            actions: Vec::new(),
            triggered_by: triggered_by.to_vec(),
            redundancy_score: None,
        }
    }
}

#[test]
fn empty_inbox_builds_an_empty_proposal() {
    let temp = workspace();
    let proposal = build_proposal(
        temp.path(),
        &AppConfig::default(),
        &KeywordClassifier,
        &ExtractiveSummarizer,
    )
    .expect("build");
    assert_eq!(proposal.stats.total_items, 0);
    assert_eq!(proposal.stats.ready_items, 0);
    assert!(proposal.items.is_empty());
}

#[test]
fn builder_plans_targets_from_entry_id_and_category() {
    let temp = workspace();
    stage_note(&temp, "note.md", "- [ ] Draft memo\nNeed to ship by Friday.");

    let proposal = build_proposal(
        temp.path(),
        &AppConfig::default(),
        &KeywordClassifier,
        &ExtractiveSummarizer,
    )
    .expect("build");

    assert_eq!(proposal.stats.total_items, 1);
    assert_eq!(proposal.stats.ready_items, 1);
    let item = &proposal.items[0];
    assert_eq!(item.status, ItemStatus::Ready);
    assert_eq!(item.classification.category, "todo");
    assert_eq!(
        item.target_entry_path,
        format!("vault/todos/{}.md", item.entry_id)
    );
    assert!(item.target_summary_path.is_none());
    assert!(proposal
        .commit_message_preview
        .contains(&proposal.proposal_id));
}

#[test]
fn builder_marks_empty_bodies_invalid_without_aborting_the_batch() {
    let temp = workspace();
    stage_note(&temp, "empty.md", "---\ntitle: hollow\n---\n   \n");
    stage_note(&temp, "full.md", "Reference: https://example.com/docs");

    let proposal = build_proposal(
        temp.path(),
        &AppConfig::default(),
        &KeywordClassifier,
        &ExtractiveSummarizer,
    )
    .expect("build");

    assert_eq!(proposal.stats.total_items, 2);
    assert_eq!(proposal.stats.ready_items, 1);
    assert_eq!(proposal.stats.invalid_items, 1);

    let invalid = proposal
        .items
        .iter()
        .find(|i| i.status == ItemStatus::Invalid)
        .expect("invalid item");
    assert_eq!(invalid.invalid_reason.as_deref(), Some("empty body"));
    assert!(invalid.summary.is_none());
    assert!(invalid.target_summary_path.is_none());
}

#[test]
fn builder_attaches_summaries_when_signals_fire() {
    let temp = workspace();
    let mut config = AppConfig::default();
    config.summarization.min_words = 5;
    stage_note(
        &temp,
        "long.md",
        "First point about the plan. Second point with details. Third point to close.",
    );

    let proposal = build_proposal(
        temp.path(),
        &config,
        &KeywordClassifier,
        &ExtractiveSummarizer,
    )
    .expect("build");

    let item = &proposal.items[0];
    let summary = item.summary.as_ref().expect("summary attached");
    assert_eq!(summary.triggered_by, vec!["long_entry".to_string()]);
    assert_eq!(
        item.target_summary_path.as_deref(),
        Some(format!("vault/summaries/{}.md", item.entry_id).as_str())
    );
    assert_eq!(proposal.stats.summary_items, 1);
}

#[test]
fn builder_uses_the_supplied_collaborators() {
    let temp = workspace();
    let mut config = AppConfig::default();
    config.summarization.batch_trigger_count = 1;
    stage_note(&temp, "anything.md", "plain text nobody would call an idea");

    let proposal = build_proposal(temp.path(), &config, &FixedClassifier, &NoopSummarizer)
        .expect("build");

    let item = &proposal.items[0];
    assert_eq!(item.classification.category, "idea");
    assert_eq!(item.classification.reasoning, "stub");
    let summary = item.summary.as_ref().expect("stub summary");
    assert_eq!(summary.short_summary, "stub summary");
    assert_eq!(summary.redundancy_score, None);
    assert_eq!(item.target_entry_path, format!("vault/ideas/{}.md", item.entry_id));
}

#[test]
fn proposal_ids_sort_by_creation_time() {
    let a = new_proposal_id();
    let b = new_proposal_id();
    // same-second stamps still differ in suffix; ordering is non-decreasing
    assert!(a[..16] <= b[..16], "stamps went backwards: {a} vs {b}");
    assert_ne!(a, b);
}

#[test]
fn store_roundtrips_and_resolves_latest() {
    let temp = workspace();
    stage_note(&temp, "note.md", "Reference: https://example.com/docs");
    let config = AppConfig::default();

    let first = build_proposal(
        temp.path(),
        &config,
        &KeywordClassifier,
        &ExtractiveSummarizer,
    )
    .expect("build first");
    let second = build_proposal(
        temp.path(),
        &config,
        &KeywordClassifier,
        &ExtractiveSummarizer,
    )
    .expect("build second");
    assert_ne!(first.proposal_id, second.proposal_id);

    let store = ProposalStore::new(temp.path());
    store.save(&first).expect("save first");
    store.save(&second).expect("save second");

    let loaded = store.load(&first.proposal_id).expect("load");
    assert_eq!(loaded.proposal_id, first.proposal_id);
    assert_eq!(loaded.items.len(), first.items.len());
    assert_eq!(loaded.stats.total_items, first.stats.total_items);

    let latest_id = first.proposal_id.clone().max(second.proposal_id.clone());
    assert_eq!(store.load_latest().expect("latest").proposal_id, latest_id);

    // the rendered report sits next to the plan
    let report = store.dir().join(format!("{}.md", first.proposal_id));
    let rendered = fs::read_to_string(report).expect("report");
    assert!(rendered.contains(&first.proposal_id));
    assert!(rendered.contains("## Items"));
}

#[test]
fn store_load_fails_typed_on_missing_proposal() {
    let temp = workspace();
    let store = ProposalStore::new(temp.path());

    let err = store.load("20990101T000000Z_deadbeef").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::NotFound(_))
    ));

    let err = store.load_latest().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::NotFound(_))
    ));
}
