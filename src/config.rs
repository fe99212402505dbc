use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ingest::IngestOptions;
use crate::variant::VariantRules;

/// Root configuration, loaded from an optional TOML file passed with `--config`.
/// Every section and key falls back to its default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub variant: VariantConfig,
    pub ingest: IngestOptions,
    pub feed: FeedConfig,
}

/// Additions to the built-in variant tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    pub extra_suffixes: Vec<String>,
    pub extra_boundaries: Vec<char>,
}

/// Filters the import binary applies before the ingestion filter sees a title.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub max_pages: usize,
    pub allowed_types: Vec<String>,
    /// Rating prefixes to skip, e.g. "Rx" matches "Rx - Hentai"
    pub excluded_ratings: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_pages: 20,
            allowed_types: vec!["TV".to_string()],
            excluded_ratings: vec!["Rx".to_string()],
        }
    }
}

impl FeedConfig {
    pub fn allows_type(&self, media_type: Option<&str>) -> bool {
        match media_type {
            Some(t) => self.allowed_types.iter().any(|a| a == t),
            None => false,
        }
    }

    pub fn excludes_rating(&self, rating: Option<&str>) -> bool {
        rating.is_some_and(|r| self.excluded_ratings.iter().any(|x| r.starts_with(x.as_str())))
    }
}

impl CatalogConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn variant_rules(&self) -> VariantRules {
        VariantRules::with_extra(&self.variant.extra_suffixes, &self.variant.extra_boundaries)
    }
}
