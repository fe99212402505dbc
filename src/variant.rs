//! Variant matcher: decides whether a title is a sequel, season, special or
//! alternate cut of a base title.
//!
//! This is a fixed rule set, not a similarity score. Both the batch
//! deduplicator and the ingestion filter call it pairwise, so it must stay
//! pure and cheap on the common "no shared prefix" path.

use once_cell::sync::Lazy;

use crate::error::{CatalogError, Result};
use crate::models::{MatchDecision, MatchRule};

// ============================================================================
// PATTERN TABLES
// ============================================================================

/// Suffixes appended to the base title. A candidate starting with
/// `base + suffix` (compared lower-case) is a variant. Applied literally.
pub const DEFAULT_VARIANT_SUFFIXES: &[&str] = &[
    // Sequels
    " 2",
    " II",
    " III",
    " IV",
    " V",
    " Second Season",
    " 2nd Season",
    "2",
    // Separators
    ":",
    " -",
    " ～",
    " ~",
    " (",
    // Common suffixes
    " The",
    " TV",
    " OVA",
    " Movie",
    " Special",
    " Specials",
    // Franchise-specific
    " A's",
    " StrikerS",
    " The Second Raid",
    " Alternative",
    " Unlimited",
    " Zero",
    " R",
    " GT",
    " Z",
    " ZZ",
    " Kai",
    " Next",
    " Final",
    " Encore",
    " Plus",
    " Ex",
    " S",
    // Year / release tags
    " [",
];

/// Characters that, directly after the base title, mark a variant
/// ("K-On!" → "K-On!!").
pub const DEFAULT_BOUNDARY_CHARS: &[char] = &['!', '?', '♪', '☆', '.', ','];

static DEFAULT_RULES: Lazy<VariantRules> = Lazy::new(VariantRules::default);

// ============================================================================
// RULE SET
// ============================================================================

/// Declarative matcher configuration: ordered suffix table plus boundary set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRules {
    suffixes: Vec<String>,
    boundaries: Vec<char>,
}

impl Default for VariantRules {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_VARIANT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            boundaries: DEFAULT_BOUNDARY_CHARS.to_vec(),
        }
    }
}

impl VariantRules {
    pub fn new(suffixes: Vec<String>, boundaries: Vec<char>) -> Self {
        Self {
            suffixes,
            boundaries,
        }
    }

    /// Default tables extended with extra entries. Duplicates are ignored and
    /// the default order is kept; extras go last.
    pub fn with_extra(extra_suffixes: &[String], extra_boundaries: &[char]) -> Self {
        let mut rules = Self::default();
        for suffix in extra_suffixes {
            if !suffix.is_empty() && !rules.suffixes.contains(suffix) {
                rules.suffixes.push(suffix.clone());
            }
        }
        for &c in extra_boundaries {
            if !rules.boundaries.contains(&c) {
                rules.boundaries.push(c);
            }
        }
        rules
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn boundaries(&self) -> &[char] {
        &self.boundaries
    }

    /// Is `candidate` a variant of `base`?
    ///
    /// Exact (case-sensitive) equality is never a variant; exact duplicates
    /// are handled by the caller. An empty base never matches.
    pub fn matches(&self, base: &str, candidate: &str) -> MatchDecision {
        if base.is_empty() || candidate == base {
            return MatchDecision::no_match();
        }

        let t = candidate.to_lowercase();
        let b = base.to_lowercase();
        if !t.starts_with(&b) {
            return MatchDecision::no_match();
        }

        // Suffix rule. `t == b` only happens for titles differing by case.
        if !self.suffixes.is_empty() {
            if t == b {
                return MatchDecision::matched(MatchRule::CaseOnly);
            }
            for suffix in &self.suffixes {
                // Lower-case the concatenation, not the parts: final sigma
                // lowers differently at the end of a word.
                let pattern = format!("{}{}", base, suffix).to_lowercase();
                if t.starts_with(&pattern) {
                    return MatchDecision::matched(MatchRule::SuffixPattern(suffix.clone()));
                }
            }
        }

        // Boundary punctuation rule. `b` is a prefix of `t`, so the slice is
        // on a char boundary.
        if let Some(next) = t[b.len()..].chars().next() {
            if self.boundaries.contains(&next) {
                return MatchDecision::matched(MatchRule::Boundary(next));
            }
        }

        MatchDecision::no_match()
    }

    /// Like [`matches`](Self::matches) but fails fast on empty titles.
    pub fn try_matches(&self, base: &str, candidate: &str) -> Result<MatchDecision> {
        if base.trim().is_empty() {
            return Err(CatalogError::InvalidInput("base title is empty".to_string()));
        }
        if candidate.trim().is_empty() {
            return Err(CatalogError::InvalidInput(
                "candidate title is empty".to_string(),
            ));
        }
        Ok(self.matches(base, candidate))
    }

    pub fn is_variant(&self, base: &str, candidate: &str) -> bool {
        self.matches(base, candidate).is_variant
    }
}

/// Is `candidate` a variant of `base` under the default rule tables?
pub fn is_variant_title(base: &str, candidate: &str) -> bool {
    DEFAULT_RULES.is_variant(base, candidate)
}

// ============================================================================
// TESTS
// ============================================================================
