// src/services/summarize.rs
//! Summarization triggers and the default extractive summarizer.
//!
//! Trigger evaluation is separate from summary generation: the proposal
//! builder first computes which signals fire (`long_entry`,
//! `batch_threshold`, `high_redundancy`) and only then asks a
//! [`Summarizer`] to produce the actual summary for ready items.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::config::SummarizationConfig;
use crate::models::{StagedItem, SummaryResult};

/// Single seam for summary generation; the default is extractive, but a
/// learned or user-overridden implementation slots in without touching the
/// pipeline.
pub trait Summarizer {
    fn summarize(
        &self,
        item: &StagedItem,
        category: &str,
        triggered_by: &[String],
        redundancy_score: f64,
    ) -> SummaryResult;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractiveSummarizer;

static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*[-*]\s+(.+)$").expect("bullet regex"));
static ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*[-*]?\s*(?:\[[ xX]\]\s*)?((?:do|build|write|ship|fix|review|plan|draft|call|email)\b.+)$",
    )
    .expect("action regex")
});
static CHECKBOX_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-*]\s*\[[ xX]\]\s+").expect("checkbox prefix regex"));

/// Texts of all previously stored summaries, used for redundancy scoring.
/// Unreadable files are skipped; an absent directory is an empty corpus.
pub fn load_existing_summary_texts(root: &Path) -> Vec<String> {
    let dir = root.join("vault").join("summaries");
    let Ok(entries) = fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("md"))
        .collect();
    paths.sort();
    paths
        .into_iter()
        .filter_map(|p| fs::read_to_string(p).ok())
        .collect()
}

/// Evaluate the configured trigger signals for one item. Returns the fired
/// signal names and the best similarity score against existing summaries.
pub fn summarization_signals(
    item: &StagedItem,
    pending_count: usize,
    config: &SummarizationConfig,
    existing_summary_texts: &[String],
) -> (Vec<String>, f64) {
    if !config.enabled {
        return (Vec::new(), 0.0);
    }

    let mut signals = Vec::new();
    if word_count(&item.body) >= config.min_words {
        signals.push("long_entry".to_string());
    }
    if pending_count >= config.batch_trigger_count {
        signals.push("batch_threshold".to_string());
    }

    let similarity = max_similarity(&item.body, existing_summary_texts);
    if similarity >= config.redundancy_similarity_threshold {
        signals.push("high_redundancy".to_string());
    }

    (signals, similarity)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercase, collapse whitespace, and cap length so pathological inputs
/// keep the edit-distance comparison bounded.
fn normalize_for_similarity(text: &str) -> String {
    let collapsed = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed.chars().take(6000).collect()
}

fn max_similarity(text: &str, existing_texts: &[String]) -> f64 {
    if existing_texts.is_empty() {
        return 0.0;
    }
    let candidate = normalize_for_similarity(text);
    existing_texts
        .iter()
        .map(|existing| {
            strsim::normalized_levenshtein(&candidate, &normalize_for_similarity(existing))
        })
        .fold(0.0, f64::max)
}

/// Whitespace-normalize and split after sentence-terminal punctuation.
fn extract_sentences(text: &str) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Vec::new();
    }
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = normalized.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }
    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn extract_key_points(text: &str) -> Vec<String> {
    let bullets: Vec<String> = BULLET_RE
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect();
    if !bullets.is_empty() {
        return bullets.into_iter().take(5).collect();
    }
    extract_sentences(text).into_iter().take(5).collect()
}

fn extract_actions(text: &str) -> Vec<String> {
    let mut actions = Vec::new();
    for line in text.lines() {
        if let Some(caps) = ACTION_RE.captures(line) {
            actions.push(caps[1].trim().to_string());
        } else if CHECKBOX_PREFIX_RE.is_match(line) {
            let cleaned = CHECKBOX_PREFIX_RE.replace(line, "").trim().to_string();
            if !cleaned.is_empty() {
                actions.push(cleaned);
            }
        }
    }
    // case-insensitive dedupe, first occurrence wins
    let mut unique = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for action in actions {
        if seen.insert(action.to_lowercase()) {
            unique.push(action);
        }
    }
    unique.into_iter().take(8).collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

impl Summarizer for ExtractiveSummarizer {
    fn summarize(
        &self,
        item: &StagedItem,
        category: &str,
        triggered_by: &[String],
        redundancy_score: f64,
    ) -> SummaryResult {
        let sentences = extract_sentences(&item.body);
        let short_summary = truncate_chars(
            &sentences.iter().take(3).cloned().collect::<Vec<_>>().join(" "),
            500,
        );

        let key_points = extract_key_points(&item.body);
        let actions = if matches!(category, "todo" | "idea") {
            extract_actions(&item.body)
        } else {
            Vec::new()
        };

        SummaryResult {
            short_summary,
            key_points,
            actions,
            triggered_by: triggered_by.to_vec(),
            redundancy_score: Some(round3(redundancy_score)),
        }
    }
}
