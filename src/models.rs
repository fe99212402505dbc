//! Core data models for catalog deduplication and ingestion.
//!
//! This module contains the record, cluster and plan types shared by the
//! matcher, the batch deduplicator, the ingestion filter and both binaries.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Local storage identifier (SQLite rowid of the `anime` table)
pub type LocalId = i64;

// ============================================================================
// Catalog Models
// ============================================================================

/// One anime entry as seen by the deduplicator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleRecord {
    pub external_id: Option<i64>, // MAL id, absent for hand-entered records
    pub local_id: Option<LocalId>, // None for candidates not yet persisted
    pub title: String,
    pub scene_count: u32,
}

impl TitleRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            external_id: None,
            local_id: None,
            title: title.into(),
            scene_count: 0,
        }
    }

    pub fn with_external_id(mut self, id: i64) -> Self {
        self.external_id = Some(id);
        self
    }

    pub fn with_local_id(mut self, id: LocalId) -> Self {
        self.local_id = Some(id);
        self
    }

    pub fn with_scenes(mut self, count: u32) -> Self {
        self.scene_count = count;
        self
    }

    /// Short label for log lines: `"Bleach" (MAL 269, 5 scenes)`
    pub fn describe(&self) -> String {
        match self.external_id {
            Some(id) => format!("\"{}\" (MAL {}, {} scenes)", self.title, id, self.scene_count),
            None => format!("\"{}\" ({} scenes)", self.title, self.scene_count),
        }
    }
}

/// Which deduplication pass produced a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClusterKind {
    /// A single record nothing else collapsed into
    Unique,
    /// Records sharing the exact same title
    ExactDuplicate,
    /// A base title plus its sequels, seasons and specials
    Variant,
}

/// Group of records considered to be one logical series.
///
/// Invariants: `members` is non-empty and `members[0] == canonical`.
#[derive(Clone, Debug)]
pub struct VariantCluster {
    pub base_title: String,
    pub kind: ClusterKind,
    pub canonical: TitleRecord,
    pub members: Vec<TitleRecord>,
    /// Canonical was decided by the local-id fallback only
    pub ambiguous: bool,
}

impl VariantCluster {
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// Members that lose to the canonical record.
    pub fn losers(&self) -> &[TitleRecord] {
        &self.members[1..]
    }
}

// ============================================================================
// Matching Models
// ============================================================================

/// Rule that classified a title as a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Titles equal ignoring case
    CaseOnly,
    /// Candidate starts with base + suffix (suffix as configured)
    SuffixPattern(String),
    /// Candidate continues the base with boundary punctuation
    Boundary(char),
}

/// Result of one base → candidate comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDecision {
    pub is_variant: bool,
    pub rule: Option<MatchRule>,
}

impl MatchDecision {
    pub fn no_match() -> Self {
        Self {
            is_variant: false,
            rule: None,
        }
    }

    pub fn matched(rule: MatchRule) -> Self {
        Self {
            is_variant: true,
            rule: Some(rule),
        }
    }
}

// ============================================================================
// Consolidation Plan
// ============================================================================

/// Re-point every scene of `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rebind {
    pub from: LocalId,
    pub to: LocalId,
}

/// Full output of an in-memory deduplication pass.
///
/// `rebinds` must be applied in order: a pass 1 survivor can itself be rebound
/// in pass 2.
#[derive(Debug, Clone, Default)]
pub struct DedupPlan {
    pub clusters: Vec<VariantCluster>,
    pub deletions: Vec<LocalId>,
    pub rebinds: Vec<Rebind>,
    pub ambiguous: usize,
}

impl DedupPlan {
    pub fn is_noop(&self) -> bool {
        self.deletions.is_empty() && self.rebinds.is_empty()
    }
}

// ============================================================================
// Ingestion Models
// ============================================================================

/// Why an ingestion candidate is not a base series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseRejection {
    SequelMarker,
    ColonSubtitle,
    /// Variant of an already processed title or of another title on the page
    VariantOf(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidTitle,
    NotBaseSeries(BaseRejection),
    AlreadyProcessed { key: String },
}

impl RejectReason {
    /// Reason string used in skip log lines
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::InvalidTitle => "Invalid title",
            RejectReason::NotBaseSeries(_) => "Not base series",
            RejectReason::AlreadyProcessed { .. } => "Already processed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestDecision {
    /// Register the candidate under `key` (possibly colon-truncated)
    Accept { key: String },
    Reject(RejectReason),
}

impl IngestDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, IngestDecision::Accept { .. })
    }
}

// ============================================================================
// Feed Models (Jikan /top/anime page)
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct FeedPage {
    pub data: Vec<FeedEntry>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FeedEntry {
    pub mal_id: i64,
    pub title: String,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub images: Option<FeedImages>,
}

impl FeedEntry {
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(|i| i.jpg.as_ref())
            .and_then(|j| j.large_image_url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FeedImages {
    #[serde(default)]
    pub jpg: Option<FeedImage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FeedImage {
    #[serde(default)]
    pub large_image_url: Option<String>,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Counters for one `clean-duplicates` run.
#[derive(Default, Debug, Clone, Serialize)]
pub struct DedupStats {
    pub records_loaded: usize,

    // Pass 1: exact duplicates
    pub exact_clusters: usize,
    pub exact_deleted: usize,

    // Pass 2: variant grouping
    pub variant_clusters: usize,
    pub variant_deleted: usize,

    pub scenes_rebound: usize,
    pub storage_conflicts: usize,
    pub ambiguous_clusters: usize,

    pub dry_run: bool,
    pub elapsed_seconds: f64,
}

impl DedupStats {
    pub fn total_deleted(&self) -> usize {
        self.exact_deleted + self.variant_deleted
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Counters for one `import-anime` run.
#[derive(Default, Debug, Clone, Serialize)]
pub struct IngestStats {
    pub pages_read: usize,
    pub entries_seen: usize,
    pub skipped_media_type: usize,
    pub skipped_rating: usize,
    pub rejected_invalid: usize,
    pub rejected_sequel_marker: usize,
    pub rejected_colon_subtitle: usize,
    pub rejected_variant: usize,
    pub rejected_already_processed: usize,
    pub accepted: usize,
    pub upsert_failures: usize,
    pub elapsed_seconds: f64,
}

impl IngestStats {
    pub fn record_rejection(&mut self, reason: &RejectReason) {
        match reason {
            RejectReason::InvalidTitle => self.rejected_invalid += 1,
            RejectReason::NotBaseSeries(BaseRejection::SequelMarker) => {
                self.rejected_sequel_marker += 1
            }
            RejectReason::NotBaseSeries(BaseRejection::ColonSubtitle) => {
                self.rejected_colon_subtitle += 1
            }
            RejectReason::NotBaseSeries(BaseRejection::VariantOf(_)) => self.rejected_variant += 1,
            RejectReason::AlreadyProcessed { .. } => self.rejected_already_processed += 1,
        }
    }

    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
