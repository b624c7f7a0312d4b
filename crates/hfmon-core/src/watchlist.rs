use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_min_token_len() -> usize {
    2
}

fn default_enabled() -> bool {
    true
}

/// A forum gallery that the gallery-site collector may search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub id: String,
    pub name: String,
    pub gallery_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Monitoring vocabulary: what to watch and how to tokenize for trends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    /// Keywords collected and rolled up by default.
    pub keywords: Vec<String>,
    /// Brand/product names always kept by the trend tokenizer.
    #[serde(default)]
    pub protected_terms: Vec<String>,
    #[serde(default)]
    pub stopwords: Vec<String>,
    /// Tokens shorter than this (in chars) are never trend candidates.
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    #[serde(default)]
    pub galleries: Vec<Gallery>,
}

impl Watchlist {
    /// Galleries with `enabled: true`.
    pub fn enabled_galleries(&self) -> impl Iterator<Item = &Gallery> {
        self.galleries.iter().filter(|g| g.enabled)
    }
}

/// Load and validate the watchlist from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_watchlist(path: &Path) -> Result<Watchlist, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::WatchlistIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_watchlist(&content)
}

/// Parse and validate watchlist YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_watchlist(yaml: &str) -> Result<Watchlist, ConfigError> {
    let watchlist: Watchlist = serde_yaml::from_str(yaml)?;
    validate_watchlist(&watchlist)?;
    Ok(watchlist)
}

fn validate_watchlist(watchlist: &Watchlist) -> Result<(), ConfigError> {
    if watchlist.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "at least one keyword is required".to_string(),
        ));
    }

    if watchlist.min_token_len == 0 {
        return Err(ConfigError::Validation(
            "min_token_len must be at least 1".to_string(),
        ));
    }

    let mut seen_keywords = HashSet::new();
    for keyword in &watchlist.keywords {
        if keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keywords must be non-empty".to_string(),
            ));
        }
        if !seen_keywords.insert(keyword.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate keyword: '{keyword}'"
            )));
        }
    }

    let mut seen_galleries = HashSet::new();
    for gallery in &watchlist.galleries {
        if !seen_galleries.insert(gallery.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate gallery id: '{}'",
                gallery.id
            )));
        }
    }

    Ok(())
}
