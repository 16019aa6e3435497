// tests/commit_flow.rs
// End-to-end commit engine tests: roundtrip, dedup, the idempotence guard,
// and rollback under injected failures.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use notevault::commands::Commands;
use notevault::config::AppConfig;
use notevault::models::{CommitRecord, EntryRecord, ItemStatus};
use notevault::services::commit::commit_proposal;
use notevault::utils::fsio::read_jsonl;
use notevault::StoreError;

fn open(temp: &TempDir) -> Commands {
    Commands::open(temp.path()).expect("open workspace")
}

fn stage(cmds: &Commands, name: &str, body: &str) {
    let source = cmds.root().join(name);
    fs::write(&source, body).unwrap();
    cmds.stage_add(&source).expect("stage add");
}

fn entries(root: &Path) -> Vec<EntryRecord> {
    read_jsonl(&root.join("vault/index/entries.jsonl")).expect("entries ledger")
}

fn commits(root: &Path) -> Vec<CommitRecord> {
    read_jsonl(&root.join("vault/index/commits.jsonl")).expect("commit ledger")
}

fn dir_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = read
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}

#[test]
fn stage_process_commit_roundtrip() {
    let temp = TempDir::new().unwrap();
    let cmds = open(&temp);
    stage(&cmds, "note1.md", "- [ ] Draft product memo\nNeed to ship by Friday.");

    let outcome = cmds.process().expect("process");
    assert!(outcome.saved.is_some());
    let proposal = &outcome.proposal;
    assert_eq!(proposal.stats.total_items, 1);
    assert_eq!(proposal.stats.ready_items, 1);
    assert_eq!(proposal.items[0].classification.category, "todo");

    let result = cmds.commit("latest").expect("commit");
    assert_eq!(result.proposal_id, proposal.proposal_id);
    assert_eq!(result.commit_ref, proposal.proposal_id);
    assert_eq!(result.committed_entries, 1);
    assert_eq!(result.skipped_duplicates, 0);
    assert_eq!(result.invalid_entries, 0);
    assert!(result.message.starts_with("notevault: apply proposal"));

    let entry_rows = entries(temp.path());
    assert_eq!(entry_rows.len(), 1);
    assert_eq!(entry_rows[0].entry_id, proposal.items[0].entry_id);
    assert_eq!(entry_rows[0].content_hash, proposal.items[0].content_hash);
    assert_eq!(commits(temp.path()).len(), 1);

    // the rendered entry landed at its deterministic target
    let entry_path = temp.path().join(&proposal.items[0].target_entry_path);
    let rendered = fs::read_to_string(&entry_path).expect("entry file");
    assert!(rendered.contains(&proposal.items[0].entry_id));
    assert!(rendered.contains("Need to ship by Friday."));

    // the staged source left the inbox, tagged with the proposal id
    assert!(dir_files(&temp.path().join("stage/inbox")).is_empty());
    let processed = dir_files(&temp.path().join("stage/processed"));
    assert_eq!(processed.len(), 1);
    let name = processed[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(&proposal.proposal_id));
    assert!(name.ends_with("note1.md"));
}

#[test]
fn duplicate_content_across_proposals_is_skipped_once_vaulted() {
    let temp = TempDir::new().unwrap();
    let cmds = open(&temp);
    let body = "Reference: https://example.com/docs\nHow-to notes";

    stage(&cmds, "first.md", body);
    let p1 = cmds.process().expect("process first").proposal;
    let first = cmds.commit(&p1.proposal_id).expect("commit first");
    assert_eq!(first.committed_entries, 1);

    stage(&cmds, "second.md", body);
    let p2 = cmds.process().expect("process second").proposal;
    let second = cmds.commit(&p2.proposal_id).expect("commit second");
    assert_eq!(second.committed_entries, 0);
    assert_eq!(second.skipped_duplicates, 1);

    // exactly one ledger record for the shared hash, and both staged
    // sources were consumed
    let entry_rows = entries(temp.path());
    assert_eq!(entry_rows.len(), 1);
    assert!(dir_files(&temp.path().join("stage/inbox")).is_empty());
    assert_eq!(dir_files(&temp.path().join("stage/processed")).len(), 2);
}

#[test]
fn duplicate_content_within_one_proposal_writes_once() {
    let temp = TempDir::new().unwrap();
    let cmds = open(&temp);
    let body = "Same bytes staged twice in one batch.";
    stage(&cmds, "a.md", body);
    stage(&cmds, "b.md", body);

    cmds.process().expect("process");
    let result = cmds.commit("latest").expect("commit");
    assert_eq!(result.committed_entries, 1);
    assert_eq!(result.skipped_duplicates, 1);
    assert_eq!(entries(temp.path()).len(), 1);
}

#[test]
fn recommitting_the_same_proposal_is_rejected_before_any_side_effect() {
    let temp = TempDir::new().unwrap();
    let cmds = open(&temp);
    stage(&cmds, "note.md", "Status update: progress was made today.");

    let outcome = cmds.process().expect("process");
    let proposal_id = outcome.proposal.proposal_id.clone();
    cmds.commit(&proposal_id).expect("first commit");

    let vault_before = dir_files(&temp.path().join("vault/logs"));
    let err = cmds.commit(&proposal_id).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::AlreadyCommitted(id)) if id == &proposal_id
    ));

    // exactly one commit record, no new vault writes
    assert_eq!(commits(temp.path()).len(), 1);
    assert_eq!(entries(temp.path()).len(), 1);
    assert_eq!(dir_files(&temp.path().join("vault/logs")), vault_before);
}

#[test]
fn commit_of_unknown_proposal_fails_typed() {
    let temp = TempDir::new().unwrap();
    let cmds = open(&temp);
    let err = commit_proposal(
        temp.path(),
        "20990101T000000Z_deadbeef",
        &AppConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::NotFound(_))
    ));
    assert!(commits(temp.path()).is_empty());
}

#[test]
fn mid_write_failure_rolls_back_to_the_exact_prior_state() {
    let temp = TempDir::new().unwrap();
    let cmds = open(&temp);
    stage(&cmds, "a.md", "Idea: brainstorm a concept for onboarding.");
    stage(&cmds, "b.md", "Reference: https://example.com/docs for the guide.");

    let outcome = cmds.process().expect("process");
    let proposal = outcome.proposal;
    assert_eq!(proposal.stats.ready_items, 2);

    let inbox_before = dir_files(&temp.path().join("stage/inbox"));
    assert_eq!(inbox_before.len(), 2);

    // squat a directory on the second item's target so its atomic write
    // fails after the first entry has already been written
    let blocked = temp.path().join(&proposal.items[1].target_entry_path);
    fs::create_dir_all(&blocked).unwrap();

    let err = cmds.commit(&proposal.proposal_id).unwrap_err();
    assert!(err.downcast_ref::<StoreError>().is_none(), "expected an I/O failure");

    // pre-commit state is fully restored
    assert!(!temp.path().join(&proposal.items[0].target_entry_path).exists());
    assert!(!temp.path().join("vault/index/entries.jsonl").exists());
    assert!(!temp.path().join("vault/index/commits.jsonl").exists());
    assert_eq!(dir_files(&temp.path().join("stage/inbox")), inbox_before);
    assert!(dir_files(&temp.path().join("stage/processed")).is_empty());

    // replay after fixing the cause succeeds: the guard and the dedup check
    // make re-running a not-yet-committed proposal safe
    fs::remove_dir_all(&blocked).unwrap();
    let result = cmds.commit(&proposal.proposal_id).expect("replay commit");
    assert_eq!(result.committed_entries, 2);
    assert_eq!(result.skipped_duplicates, 0);
    assert_eq!(entries(temp.path()).len(), 2);
    assert_eq!(commits(temp.path()).len(), 1);
}

#[test]
fn mid_move_failure_restores_ledgers_and_staged_files() {
    let temp = TempDir::new().unwrap();
    let cmds = open(&temp);
    stage(&cmds, "a.md", "Idea: brainstorm a concept for onboarding.");
    stage(&cmds, "b.md", "Reference: https://example.com/docs for the guide.");

    let outcome = cmds.process().expect("process");
    let proposal = outcome.proposal;

    // vanish the second staged source between process and commit; the move
    // phase fails after the first source was already relocated
    fs::remove_file(temp.path().join(&proposal.items[1].source_rel_path)).unwrap();

    let err = cmds.commit(&proposal.proposal_id).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::NotFound(_))
    ));

    // entry files and ledger appends from this attempt are gone, and the
    // first staged file is back in the inbox
    for item in &proposal.items {
        assert!(!temp.path().join(&item.target_entry_path).exists());
    }
    assert!(!temp.path().join("vault/index/entries.jsonl").exists());
    assert!(!temp.path().join("vault/index/commits.jsonl").exists());
    assert!(temp
        .path()
        .join(&proposal.items[0].source_rel_path)
        .exists());
    assert!(dir_files(&temp.path().join("stage/processed")).is_empty());
}

#[test]
fn invalid_items_never_reach_the_vault_and_stay_in_the_inbox() {
    let temp = TempDir::new().unwrap();
    let cmds = open(&temp);
    stage(&cmds, "hollow.md", "---\ntitle: hollow\n---\n   \n");
    stage(&cmds, "real.md", "Reference: https://example.com/docs");

    let outcome = cmds.process().expect("process");
    let proposal = outcome.proposal;
    let invalid = proposal
        .items
        .iter()
        .find(|i| i.status == ItemStatus::Invalid)
        .expect("invalid item");

    let result = cmds.commit("latest").expect("commit");
    assert_eq!(result.committed_entries, 1);
    assert_eq!(result.skipped_duplicates, 0);
    assert_eq!(result.invalid_entries, 1);

    // no vault write for the invalid item, and its source stays staged
    assert!(!temp.path().join(&invalid.target_entry_path).exists());
    assert!(temp.path().join(&invalid.source_rel_path).exists());
    assert_eq!(entries(temp.path()).len(), 1);

    let inbox = dir_files(&temp.path().join("stage/inbox"));
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].to_string_lossy().ends_with("hollow.md"));
}

#[test]
fn summaries_are_written_and_recorded_when_triggered() {
    let temp = TempDir::new().unwrap();

    // lower the long-entry bar so the default summarizer kicks in
    fs::create_dir_all(temp.path().join(".notevault")).unwrap();
    fs::write(
        temp.path().join(".notevault/config.toml"),
        "[summarization]\nenabled = true\nmin_words = 5\n",
    )
    .unwrap();

    let cmds = open(&temp);
    stage(
        &cmds,
        "long.md",
        "First point about the plan. Second point with details. Third point to close.",
    );

    let outcome = cmds.process().expect("process");
    let item = &outcome.proposal.items[0];
    let summary_rel = item.target_summary_path.clone().expect("summary planned");

    let result = cmds.commit("latest").expect("commit");
    assert_eq!(result.committed_entries, 1);

    let summary_file = temp.path().join(&summary_rel);
    let rendered = fs::read_to_string(&summary_file).expect("summary file");
    assert!(rendered.contains("## Key Points"));
    assert!(rendered.contains("long_entry"));

    let entry_rows = entries(temp.path());
    assert_eq!(entry_rows[0].summary_path.as_deref(), Some(summary_rel.as_str()));
}
