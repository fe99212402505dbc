//! Ingestion filter: decides, one feed entry at a time, whether a title is a
//! new base series worth registering.
//!
//! The titles accepted so far belong to the run, not to the module: an
//! [`IngestionRun`] is created per import and only ever grows.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::models::{BaseRejection, IngestDecision, RejectReason};
use crate::variant::VariantRules;

// ============================================================================
// Sequel Heuristics
// ============================================================================

/// Sequel markers: Roman numeral II–X as a word (upper-case only, so
/// "Hunter x Hunter" survives), "Season 2".."Season 9", "Part 2".."Part 9",
/// "2nd"/"3rd" as words and "<N>th Season".
pub static SEQUEL_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\s(?-i:II|III|IV|V|VI|VII|VIII|IX|X)\b|\bSeason\s[2-9]|\bPart\s[2-9]|\s(?:2nd|3rd)\b|\d+th\sSeason)",
    )
    .unwrap()
});

/// A colon followed by any text: "Title: Subtitle".
pub static COLON_SUBTITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r":.+$").unwrap());

pub fn has_sequel_marker(title: &str) -> bool {
    SEQUEL_MARKER.is_match(title)
}

pub fn has_colon_subtitle(title: &str) -> bool {
    COLON_SUBTITLE.is_match(title)
}

/// Title up to the first colon, trimmed.
pub fn colon_base(title: &str) -> &str {
    title.split(':').next().unwrap_or(title).trim()
}

// ============================================================================
// Run State
// ============================================================================

/// Toggles for the heuristics applied before the variant check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Register titles under the text before the first colon
    pub truncate_at_colon: bool,
    pub reject_sequel_markers: bool,
    pub reject_colon_subtitles: bool,
    /// Also reject variants of titles appearing later on the same page
    pub page_lookahead: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            truncate_at_colon: true,
            reject_sequel_markers: true,
            reject_colon_subtitles: true,
            page_lookahead: true,
        }
    }
}

/// One import run. Holds the ordered set of accepted keys.
#[derive(Debug, Clone, Default)]
pub struct IngestionRun {
    rules: VariantRules,
    options: IngestOptions,
    processed: Vec<String>,
    seen: FxHashSet<String>,
}

impl IngestionRun {
    pub fn new(rules: VariantRules, options: IngestOptions) -> Self {
        Self {
            rules,
            options,
            processed: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    /// Seed the run with titles accepted earlier.
    pub fn extend_processed<I>(&mut self, titles: I)
    where
        I: IntoIterator<Item = String>,
    {
        for title in titles {
            self.mark_processed(title);
        }
    }

    pub fn processed_titles(&self) -> &[String] {
        &self.processed
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Decide on `candidate` and, on accept, add its key to the run.
    ///
    /// `page_titles` is the full page the candidate came from; it is only
    /// consulted when `page_lookahead` is on.
    pub fn consider(&mut self, candidate: &str, page_titles: &[String]) -> IngestDecision {
        let decision = self.evaluate(candidate, page_titles);
        match &decision {
            IngestDecision::Accept { key } => self.mark_processed(key.clone()),
            IngestDecision::Reject(reason) => {
                debug!("Skipping {} - {}: {:?}", candidate, reason.label(), reason)
            }
        }
        decision
    }

    /// Decide without mutating the run.
    pub fn evaluate(&self, candidate: &str, page_titles: &[String]) -> IngestDecision {
        let title = candidate.trim();
        if title.is_empty() {
            return IngestDecision::Reject(RejectReason::InvalidTitle);
        }

        if self.options.reject_sequel_markers && has_sequel_marker(title) {
            return reject_base(BaseRejection::SequelMarker);
        }
        if self.options.reject_colon_subtitles && has_colon_subtitle(title) {
            return reject_base(BaseRejection::ColonSubtitle);
        }

        let key = if self.options.truncate_at_colon {
            colon_base(title)
        } else {
            title
        };
        if key.is_empty() {
            return IngestDecision::Reject(RejectReason::InvalidTitle);
        }

        if let Some(base) = self.variant_base(title, page_titles) {
            return reject_base(BaseRejection::VariantOf(base.to_string()));
        }

        if self.seen.contains(key) {
            return IngestDecision::Reject(RejectReason::AlreadyProcessed {
                key: key.to_string(),
            });
        }

        IngestDecision::Accept {
            key: key.to_string(),
        }
    }

    /// First processed (then page) title that `title` is a variant of.
    fn variant_base<'s>(&'s self, title: &str, page_titles: &'s [String]) -> Option<&'s str> {
        let page: &[String] = if self.options.page_lookahead {
            page_titles
        } else {
            &[]
        };
        self.processed
            .iter()
            .chain(page.iter())
            .map(String::as_str)
            .find(|other| !other.is_empty() && self.rules.is_variant(other, title))
    }

    /// Record an accepted key. Callers using [`evaluate`](Self::evaluate)
    /// call this once the record is actually stored.
    pub fn mark_processed(&mut self, key: String) {
        if self.seen.insert(key.clone()) {
            self.processed.push(key);
        }
    }
}

fn reject_base(reason: BaseRejection) -> IngestDecision {
    IngestDecision::Reject(RejectReason::NotBaseSeries(reason))
}

/// Stateless form: would `candidate` be accepted given the titles already
/// processed and the current page?
pub fn should_accept_as_base(candidate: &str, processed: &[String], page_titles: &[String]) -> bool {
    let mut run = IngestionRun::default();
    run.extend_processed(processed.iter().cloned());
    run.evaluate(candidate, page_titles).is_accept()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(titles: &[&str]) -> Vec<String> {
        titles.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_sequel_markers() {
        assert!(has_sequel_marker("Mob Psycho 100 II"));
        assert!(has_sequel_marker("Sword Art Online II"));
        assert!(has_sequel_marker("Attack on Titan Season 2"));
        assert!(has_sequel_marker("attack on titan season 3"));
        assert!(has_sequel_marker("Kingdom 3rd Season"));
        assert!(has_sequel_marker("Fate/Zero 2nd Season"));
        assert!(has_sequel_marker("Haikyuu!! 4th Season"));
        assert!(has_sequel_marker("Mushoku Tensei Part 2"));

        assert!(!has_sequel_marker("Attack on Titan Season 1"));
        assert!(!has_sequel_marker("Hunter x Hunter"));
        assert!(!has_sequel_marker("Spy x Family"));
        assert!(!has_sequel_marker("Violet Evergarden"));
        assert!(!has_sequel_marker("Vinland Saga"));
        assert!(!has_sequel_marker("Steins;Gate"));
    }

    #[test]
    fn test_colon_subtitle() {
        assert!(has_colon_subtitle("One Piece: Episode of Sabo"));
        assert!(has_colon_subtitle("Re:Zero kara Hajimeru Isekai Seikatsu"));
        assert!(!has_colon_subtitle("Trailing colon:"));
        assert!(!has_colon_subtitle("Cowboy Bebop"));
        assert_eq!(colon_base("Gintama: The Movie"), "Gintama");
        assert_eq!(colon_base("Monster"), "Monster");
    }

    #[test]
    fn test_run_over_page() {
        let titles = page(&["One Piece", "One Piece: Episode of Sabo", "Naruto"]);
        let mut run = IngestionRun::default();

        assert_eq!(
            run.consider(&titles[0], &titles),
            IngestDecision::Accept {
                key: "One Piece".to_string()
            }
        );
        assert_eq!(
            run.consider(&titles[1], &titles),
            IngestDecision::Reject(RejectReason::NotBaseSeries(BaseRejection::ColonSubtitle))
        );
        assert!(run.consider(&titles[2], &titles).is_accept());
        assert_eq!(run.processed_titles(), &["One Piece".to_string(), "Naruto".to_string()]);
    }

    #[test]
    fn test_variant_of_processed_without_colon_rule() {
        let options = IngestOptions {
            reject_colon_subtitles: false,
            ..Default::default()
        };
        let mut run = IngestionRun::new(VariantRules::default(), options);
        assert!(run.consider("One Piece", &[]).is_accept());
        assert_eq!(
            run.consider("One Piece: Episode of Sabo", &[]),
            IngestDecision::Reject(RejectReason::NotBaseSeries(BaseRejection::VariantOf(
                "One Piece".to_string()
            )))
        );
    }

    #[test]
    fn test_page_lookahead() {
        let titles = page(&["Dragon Ball Z", "Dragon Ball"]);
        let mut run = IngestionRun::default();
        assert_eq!(
            run.consider(&titles[0], &titles),
            IngestDecision::Reject(RejectReason::NotBaseSeries(BaseRejection::VariantOf(
                "Dragon Ball".to_string()
            )))
        );
        assert!(run.consider(&titles[1], &titles).is_accept());

        let options = IngestOptions {
            page_lookahead: false,
            ..Default::default()
        };
        let mut blind = IngestionRun::new(VariantRules::default(), options);
        assert!(blind.consider(&titles[0], &titles).is_accept());
        assert!(blind.consider(&titles[1], &titles).is_accept());
    }

    #[test]
    fn test_already_processed_after_truncation() {
        let options = IngestOptions {
            reject_colon_subtitles: false,
            ..Default::default()
        };
        let mut run = IngestionRun::new(VariantRules::default(), options);
        assert_eq!(
            run.consider("Gintama: The Movie", &[]),
            IngestDecision::Accept {
                key: "Gintama".to_string()
            }
        );
        assert_eq!(
            run.consider("Gintama", &[]),
            IngestDecision::Reject(RejectReason::AlreadyProcessed {
                key: "Gintama".to_string()
            })
        );
    }

    #[test]
    fn test_processed_set_grows_monotonically() {
        let mut run = IngestionRun::default();
        run.consider("Monster", &[]);
        run.consider("Monster", &[]);
        run.consider("Mushishi", &[]);
        run.consider("Mushishi Zoku Shou", &[]);
        assert_eq!(
            run.processed_titles(),
            &["Monster".to_string(), "Mushishi".to_string()]
        );
    }

    #[test]
    fn test_invalid_titles() {
        let mut run = IngestionRun::default();
        assert_eq!(
            run.consider("   ", &[]),
            IngestDecision::Reject(RejectReason::InvalidTitle)
        );
        assert!(run.processed_titles().is_empty());
    }

    #[test]
    fn test_should_accept_as_base() {
        let processed = page(&["Bleach"]);
        assert!(!should_accept_as_base("Bleach", &processed, &[]));
        assert!(!should_accept_as_base("Bleach Movie 3", &processed, &[]));
        assert!(!should_accept_as_base("Kingdom 2nd Season", &[], &[]));
        assert!(should_accept_as_base("Monster", &processed, &[]));
        assert!(!should_accept_as_base("Toradora OVA", &[], &page(&["Toradora"])));
    }

    #[test]
    fn test_evaluate_does_not_mutate() {
        let run = IngestionRun::default();
        assert!(run.evaluate("Monster", &[]).is_accept());
        assert!(run.processed_titles().is_empty());
    }
}
