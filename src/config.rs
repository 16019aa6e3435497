use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Workspace configuration, loaded from `.notevault/config.toml` under the
/// project root. Every field carries a serde default so a partial (or
/// absent) file still yields a complete config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub summarization: SummarizationConfig,
    #[serde(default)]
    pub git: GitConfig,
}

impl AppConfig {
    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".notevault").join("config.toml")
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::config_path(root);
        if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str::<AppConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))
        } else {
            tracing::debug!(path = %path.display(), "no config file found, using defaults");
            Ok(AppConfig::default())
        }
    }

    /// JSON snapshot embedded into proposals for audit.
    pub fn snapshot(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).context("serializing config snapshot")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            taxonomy: TaxonomyConfig::default(),
            summarization: SummarizationConfig::default(),
            git: GitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Categories the classifier may emit; anything else is forced to the
    /// fallback category with capped confidence.
    #[serde(default = "TaxonomyConfig::default_core_categories")]
    pub core_categories: Vec<String>,
    #[serde(default = "TaxonomyConfig::default_allow_custom_tags")]
    pub allow_custom_tags: bool,
}

impl TaxonomyConfig {
    fn default_core_categories() -> Vec<String> {
        ["idea", "todo", "reference", "log"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn default_allow_custom_tags() -> bool {
        true
    }

    pub fn allows(&self, category: &str) -> bool {
        self.core_categories.iter().any(|c| c == category)
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            core_categories: Self::default_core_categories(),
            allow_custom_tags: Self::default_allow_custom_tags(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationConfig {
    #[serde(default = "SummarizationConfig::default_enabled")]
    pub enabled: bool,
    /// Minimum body word count for the `long_entry` signal.
    #[serde(default = "SummarizationConfig::default_min_words")]
    pub min_words: usize,
    /// Pending-item count at which the `batch_threshold` signal fires.
    #[serde(default = "SummarizationConfig::default_batch_trigger_count")]
    pub batch_trigger_count: usize,
    /// Similarity against existing summaries at which `high_redundancy` fires.
    #[serde(default = "SummarizationConfig::default_redundancy_similarity_threshold")]
    pub redundancy_similarity_threshold: f64,
}

impl SummarizationConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_min_words() -> usize {
        180
    }

    fn default_batch_trigger_count() -> usize {
        5
    }

    fn default_redundancy_similarity_threshold() -> f64 {
        0.85
    }
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            min_words: Self::default_min_words(),
            batch_trigger_count: Self::default_batch_trigger_count(),
            redundancy_similarity_threshold: Self::default_redundancy_similarity_threshold(),
        }
    }
}

/// Labels carried into commit messages and records. Purely cosmetic: the
/// commit ledger is the persistence backend, not a VCS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "GitConfig::default_branch")]
    pub default_branch: String,
    #[serde(default = "GitConfig::default_commit_prefix")]
    pub commit_prefix: String,
}

impl GitConfig {
    fn default_branch() -> String {
        "main".to_string()
    }

    fn default_commit_prefix() -> String {
        "notevault:".to_string()
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: Self::default_branch(),
            commit_prefix: Self::default_commit_prefix(),
        }
    }
}
