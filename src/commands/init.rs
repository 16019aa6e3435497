// src/commands/init.rs
//! Workspace layout: directory skeleton and default configuration.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::utils::fsio;

#[derive(Debug, Clone)]
pub struct InitReport {
    pub root: PathBuf,
    pub created: Vec<String>,
    pub existed: Vec<String>,
}

const LAYOUT_DIRS: &[&str] = &[
    "stage/inbox",
    "stage/processed",
    "vault/ideas",
    "vault/todos",
    "vault/references",
    "vault/logs",
    "vault/summaries",
    "vault/index",
    ".notevault/proposals",
];

/// Ensure the full workspace directory tree exists (idempotent).
pub fn ensure_layout(root: &Path) -> Result<InitReport> {
    let mut created = Vec::new();
    let mut existed = Vec::new();
    for rel in LAYOUT_DIRS {
        let dir = root.join(rel);
        if dir.exists() {
            existed.push(rel.to_string());
        } else {
            fsio::ensure_dir(&dir)?;
            created.push(rel.to_string());
        }
    }
    Ok(InitReport {
        root: root.to_path_buf(),
        created,
        existed,
    })
}

/// Write the default configuration file, replacing whatever is there.
pub fn init_default_config(root: &Path) -> Result<PathBuf> {
    let path = AppConfig::config_path(root);
    fsio::write_atomic_text(&path, DEFAULT_CONFIG_TOML)?;
    Ok(path)
}

const DEFAULT_CONFIG_TOML: &str = r#"[taxonomy]
core_categories = ["idea", "todo", "reference", "log"]
allow_custom_tags = true

[summarization]
enabled = true
min_words = 180
batch_trigger_count = 5
redundancy_similarity_threshold = 0.85

[git]
default_branch = "main"
commit_prefix = "notevault:"
"#;
