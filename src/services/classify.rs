// src/services/classify.rs
//! Lexical note classifier.
//!
//! Scores each core category from keyword hits plus a few structural
//! signals (checkboxes, URLs, dates), then picks the dominant one.
//! Classification is a pure function of the item and the taxonomy config,
//! so the pipeline can swap in any other [`Classifier`] implementation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::config::TaxonomyConfig;
use crate::models::{ClassificationResult, StagedItem};

/// Single seam between the pipeline and whatever produces categories.
pub trait Classifier {
    fn classify(&self, item: &StagedItem, taxonomy: &TaxonomyConfig) -> ClassificationResult;
}

/// Default rule-based implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

const TODO_KEYWORDS: &[&str] = &[
    "todo", "to-do", "task", "next", "follow up", "action item", "deadline", "due", "must",
    "need to", "should",
];
const IDEA_KEYWORDS: &[&str] = &[
    "idea", "brainstorm", "concept", "proposal", "hypothesis", "what if", "could we", "maybe",
    "experiment",
];
const REFERENCE_KEYWORDS: &[&str] = &[
    "reference", "link", "documentation", "doc", "api", "guide", "source", "citation", "how-to",
];
const LOG_KEYWORDS: &[&str] = &[
    "today", "yesterday", "update", "status", "progress", "retrospective", "done", "completed",
    "blocked",
];

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z][A-Za-z0-9_-]{1,40})").expect("hashtag regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://").expect("url regex"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("date regex"));
static CHECKBOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*[-*]\s*\[[ xX]\]").expect("checkbox regex"));

fn keyword_score(lowered: &str, keywords: &[&str]) -> i64 {
    keywords.iter().filter(|k| lowered.contains(**k)).count() as i64
}

/// Ordered category scores; order breaks ties deterministically.
fn compute_scores(text: &str) -> Vec<(&'static str, i64)> {
    let lowered = text.to_lowercase();
    let mut idea = keyword_score(&lowered, IDEA_KEYWORDS);
    let mut todo = keyword_score(&lowered, TODO_KEYWORDS);
    let mut reference = keyword_score(&lowered, REFERENCE_KEYWORDS);
    let mut log = keyword_score(&lowered, LOG_KEYWORDS);

    if CHECKBOX_RE.is_match(text) {
        todo += 3;
    }
    if URL_RE.is_match(text) {
        reference += 2;
    }
    if DATE_RE.is_match(text) {
        log += 1;
    }
    if text.contains('?')
        && ["could", "maybe", "what if"].iter().any(|t| lowered.contains(t))
    {
        idea += 1;
    }

    vec![
        ("idea", idea),
        ("todo", todo),
        ("reference", reference),
        ("log", log),
    ]
}

/// Hashtags not embedded in a word, lowercased (Python's `(?<!\w)#...`;
/// the regex crate has no lookbehind, so the predecessor is checked by hand).
fn extract_hashtags(content: &str) -> Vec<String> {
    let bytes = content.as_bytes();
    let mut tags = Vec::new();
    for caps in HASHTAG_RE.captures_iter(content) {
        let whole = caps.get(0).expect("match");
        let start = whole.start();
        if start > 0 {
            let prev = bytes[start - 1];
            if prev.is_ascii_alphanumeric() || prev == b'_' {
                continue;
            }
        }
        tags.push(caps[1].to_lowercase());
    }
    tags
}

fn extract_tags(item: &StagedItem, category: &str, allow_custom_tags: bool) -> Vec<String> {
    let mut tags: BTreeSet<String> = BTreeSet::new();
    tags.insert(category.to_string());

    if category == "todo" {
        let lowered = item.body.to_lowercase();
        if lowered.contains("urgent") || lowered.contains("asap") {
            tags.insert("priority".to_string());
        }
        if lowered.contains("deadline") || lowered.contains("due") {
            tags.insert("deadline".to_string());
        }
    }

    if allow_custom_tags {
        for tag in extract_hashtags(&item.content) {
            tags.insert(tag);
        }
    }

    tags.into_iter().collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl Classifier for KeywordClassifier {
    fn classify(&self, item: &StagedItem, taxonomy: &TaxonomyConfig) -> ClassificationResult {
        let scores = compute_scores(&item.content);
        let total: i64 = scores.iter().map(|(_, s)| s).sum();
        let mut ranked = scores;
        // stable sort keeps the canonical order on ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let (top_category, top_score) = ranked[0];
        let second_score = ranked.get(1).map(|&(_, s)| s).unwrap_or(0);

        let (mut category, mut confidence, mut reasoning) = if top_score == 0 {
            (
                "reference".to_string(),
                0.25,
                "no strong lexical signal; defaulted to reference".to_string(),
            )
        } else {
            let confidence = round3(top_score as f64 / total.max(1) as f64);
            if top_score - second_score <= 1 {
                (
                    top_category.to_string(),
                    confidence.min(0.45),
                    "ambiguous lexical signal across categories".to_string(),
                )
            } else {
                (
                    top_category.to_string(),
                    confidence,
                    format!("dominant lexical signal in {}", top_category),
                )
            }
        };

        if !taxonomy.allows(&category) {
            category = "reference".to_string();
            confidence = confidence.min(0.35);
            reasoning = "category outside configured taxonomy; defaulted to reference".to_string();
        }

        let tags = extract_tags(item, &category, taxonomy.allow_custom_tags);

        ClassificationResult {
            category,
            tags,
            confidence,
            reasoning,
        }
    }
}
