// src/utils/fsio.rs
//! Content-store primitives: hashing, atomic writes, JSONL ledgers.
//!
//! Every durable write here goes through `write_atomic`: bytes land in a
//! hidden temp sibling, then a single `rename` replaces the visible path.
//! A reader never observes a half-written file. Ledger appends follow the
//! same rule (read existing, concatenate, atomic rewrite), so a crashed
//! append leaves the prior ledger intact.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// SHA-256 of the exact UTF-8 bytes, lowercase hex.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current UTC time, RFC 3339 at second precision (`2026-08-07T12:00:00Z`).
pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Compact UTC stamp used in generated file names (`20260807T120000Z`).
pub fn utc_stamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create_dir_all({:?})", path))?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write bytes to `path` via temp-file-then-rename. The temp file is removed
/// if the write or rename fails, so a failed attempt leaves no debris.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_sibling(path);
    let result = (|| -> Result<()> {
        {
            let mut f =
                fs::File::create(&tmp).with_context(|| format!("open temp file {:?}", tmp))?;
            f.write_all(bytes)?;
            f.flush()?;
        }
        fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
        Ok(())
    })();
    if result.is_err() && tmp.exists() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

pub fn write_atomic_text(path: &Path, text: &str) -> Result<()> {
    write_atomic(path, text.as_bytes())
}

/// Serialize as pretty JSON with a trailing newline, atomically.
pub fn write_atomic_json<S: Serialize>(path: &Path, value: &S) -> Result<()> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    write_atomic(path, rendered.as_bytes())
}

/// Read a JSONL file into typed rows. A missing file is an empty ledger,
/// not an error; blank lines are skipped.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("reading ledger {:?}", path))?;
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rows.push(
            serde_json::from_str(line)
                .with_context(|| format!("parsing ledger line in {:?}", path))?,
        );
    }
    Ok(rows)
}

/// Append rows to a JSONL ledger: read the existing content, concatenate the
/// new lines, and atomically rewrite the whole file.
pub fn append_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let existing = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("reading ledger {:?}", path))?
    } else {
        String::new()
    };
    let mut out = existing;
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    write_atomic(path, out.as_bytes())
}
