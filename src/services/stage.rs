// src/services/stage.rs
//! Staging area: the inbox of raw note files waiting for triage.
//!
//! - `stage/inbox/` holds pending files; listing is recursive and sorted.
//! - Loading parses an optional leading `---` metadata block and computes
//!   the content hash; identity never depends on the file name.
//! - Consumed files move to `stage/processed/` with a proposal-id prefix.
//!   Only the commit engine calls that, and only for ready items.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::StoreError;
use crate::models::StagedItem;
use crate::utils::fsio;

static METADATA_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---[ \t]*\n(.*?)\n---[ \t]*\n?").expect("metadata regex"));

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn inbox(&self) -> PathBuf {
        self.root.join("stage").join("inbox")
    }

    pub fn processed(&self) -> PathBuf {
        self.root.join("stage").join("processed")
    }

    /// All regular files under the inbox, recursively, sorted by path.
    /// An absent inbox or an empty one is a valid empty listing.
    pub fn list_pending(&self) -> Result<Vec<PathBuf>> {
        let inbox = self.inbox();
        if !inbox.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&inbox) {
            let entry = entry.with_context(|| format!("walking inbox {:?}", inbox))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Copy an external file into the inbox as `<UTC stamp>_<name>`, with a
    /// numeric disambiguator on collision.
    pub fn add(&self, source: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(StoreError::NotFound(format!(
                "source file does not exist: {}",
                source.display()
            ))
            .into());
        }
        let inbox = self.inbox();
        fsio::ensure_dir(&inbox)?;

        let stamp = fsio::utc_stamp();
        let base_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "note".to_string());
        let mut destination = inbox.join(format!("{}_{}", stamp, base_name));
        let mut counter = 1;
        while destination.exists() {
            destination = inbox.join(format!("{}_{}_{}", stamp, counter, base_name));
            counter += 1;
        }

        fs::copy(source, &destination)
            .with_context(|| format!("copying {:?} into inbox", source))?;
        tracing::debug!(staged = %destination.display(), "file staged");
        Ok(destination)
    }

    /// Read and parse one staged file. Malformed metadata lines and an empty
    /// body degrade to warnings; loading itself only fails on I/O.
    pub fn load(&self, path: &Path) -> Result<StagedItem> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading staged file {:?}", path))?;
        let (metadata, body, mut warnings) = parse_metadata_block(&content);
        let trimmed_body = body.trim().to_string();
        if trimmed_body.is_empty() {
            warnings.push("body is empty".to_string());
        }

        let content_hash = fsio::sha256_hex(&content);
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .with_context(|| format!("reading mtime of {:?}", path))?;
        let created_at =
            DateTime::<Utc>::from(modified).to_rfc3339_opts(SecondsFormat::Secs, true);

        let source_rel_path = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        Ok(StagedItem {
            source_path: path.to_path_buf(),
            source_rel_path,
            content_hash,
            created_at,
            metadata,
            body: trimmed_body,
            warnings,
            content,
        })
    }

    pub fn load_pending(&self) -> Result<Vec<StagedItem>> {
        self.list_pending()?
            .iter()
            .map(|path| self.load(path))
            .collect()
    }

    /// Relocate a consumed staged file into `stage/processed/`, renamed with
    /// a `<proposal_id>_` prefix (disambiguated on collision).
    pub fn move_to_processed(&self, source_rel_path: &str, proposal_id: &str) -> Result<PathBuf> {
        let src = self.root.join(source_rel_path);
        if !src.exists() {
            return Err(StoreError::NotFound(format!(
                "cannot move missing staged file: {}",
                src.display()
            ))
            .into());
        }

        let target_dir = self.processed();
        fsio::ensure_dir(&target_dir)?;
        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "note".to_string());
        let mut destination = target_dir.join(format!("{}_{}", proposal_id, name));
        let mut counter = 1;
        while destination.exists() {
            destination = target_dir.join(format!("{}_{}_{}", proposal_id, counter, name));
            counter += 1;
        }

        fs::rename(&src, &destination)
            .with_context(|| format!("moving {:?} -> {:?}", src, destination))?;
        Ok(destination)
    }
}

/// Split an optional leading `---`-delimited block of `key: value` lines off
/// the content. Lines without a `:` are recorded as warnings, not errors;
/// `#` comments and blanks are skipped.
fn parse_metadata_block(content: &str) -> (BTreeMap<String, String>, String, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(caps) = METADATA_BLOCK_RE.captures(content) else {
        return (BTreeMap::new(), content.to_string(), warnings);
    };

    let raw_block = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let body = content[caps.get(0).map(|m| m.end()).unwrap_or(0)..].to_string();

    let mut metadata = BTreeMap::new();
    for line in raw_block.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        match stripped.split_once(':') {
            Some((key, value)) => {
                metadata.insert(
                    key.trim().to_string(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
            None => {
                warnings.push(format!("metadata line ignored (missing ':'): {}", stripped));
            }
        }
    }

    (metadata, body, warnings)
}
