//! Batch deduplication of the anime catalog.
//!
//! Two passes, in this order:
//! 1. exact duplicates: records sharing the exact same title collapse into one;
//! 2. variant grouping: sequels, seasons and specials collapse into their base
//!    title, over the catalog as left by pass 1.
//!
//! Planning is pure. [`Deduplicator`] applies the plan through a
//! [`CatalogStore`], one cluster at a time.
//!
//! Base-title detection is O(n²) matcher calls. Fine for catalogs in the low
//! thousands; larger catalogs would need a prefix index over lower-cased titles.

use std::cmp::Ordering;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Result;
use crate::models::{
    ClusterKind, DedupPlan, DedupStats, Rebind, TitleRecord, VariantCluster,
};
use crate::progress::{create_progress_bar, log_progress};
use crate::store::CatalogStore;
use crate::variant::VariantRules;

// ============================================================================
// Canonical Selection
// ============================================================================

/// Deterministic fallback once the policy keys tie: lower local id, then
/// records with an external id, then lower external id.
fn fallback_order(a: &TitleRecord, b: &TitleRecord) -> Ordering {
    cmp_present_first(a.local_id, b.local_id)
        .then_with(|| cmp_present_first(a.external_id, b.external_id))
}

fn cmp_present_first(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort `members` best-first with `policy`, then the fallback. Returns true
/// when the top two tie on `policy`, i.e. the fallback picked the canonical.
fn rank_members<F>(members: &mut [TitleRecord], policy: F) -> bool
where
    F: Fn(&TitleRecord, &TitleRecord) -> Ordering,
{
    members.sort_by(|a, b| policy(a, b).then_with(|| fallback_order(a, b)));
    members.len() > 1 && policy(&members[0], &members[1]) == Ordering::Equal
}

/// Exact-duplicate policy. When every member carries an external id the lowest
/// one wins; otherwise the record with the most scenes wins.
fn rank_exact_group(members: &mut [TitleRecord]) -> bool {
    let all_have_ids = members.iter().all(|r| r.external_id.is_some());
    if all_have_ids {
        rank_members(members, |a, b| a.external_id.cmp(&b.external_id))
    } else {
        rank_members(members, |a, b| b.scene_count.cmp(&a.scene_count))
    }
}

/// Variant policy: the record titled exactly like the base first, then most
/// scenes.
fn rank_variant_group(members: &mut [TitleRecord], base_title: &str) -> bool {
    rank_members(members, |a, b| {
        let a_base = a.title == base_title;
        let b_base = b.title == base_title;
        b_base
            .cmp(&a_base)
            .then_with(|| b.scene_count.cmp(&a.scene_count))
    })
}

fn build_cluster(
    base_title: String,
    kind: ClusterKind,
    members: Vec<TitleRecord>,
    ambiguous: bool,
) -> VariantCluster {
    VariantCluster {
        canonical: members[0].clone(),
        base_title,
        kind,
        members,
        ambiguous,
    }
}

// ============================================================================
// Pass 1: Exact Duplicates
// ============================================================================

/// Output of the exact-duplicate pass.
#[derive(Debug, Clone, Default)]
pub struct ExactPass {
    /// Groups with more than one record, canonical first
    pub clusters: Vec<VariantCluster>,
    /// One record per distinct title, in first-seen order. Canonicals carry
    /// the scene counts of the records rebound into them.
    pub survivors: Vec<TitleRecord>,
}

pub fn plan_exact_duplicates(records: Vec<TitleRecord>) -> ExactPass {
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<TitleRecord>> = Vec::new();

    for record in records {
        match index.get(&record.title) {
            Some(&i) => groups[i].push(record),
            None => {
                index.insert(record.title.clone(), groups.len());
                groups.push(vec![record]);
            }
        }
    }

    let mut pass = ExactPass::default();
    for mut members in groups {
        if members.len() == 1 {
            pass.survivors.extend(members);
            continue;
        }

        let ambiguous = rank_exact_group(&mut members);
        let absorbed: u32 = members[1..].iter().map(|r| r.scene_count).sum();
        let mut survivor = members[0].clone();
        survivor.scene_count += absorbed;

        pass.clusters.push(build_cluster(
            survivor.title.clone(),
            ClusterKind::ExactDuplicate,
            members,
            ambiguous,
        ));
        pass.survivors.push(survivor);
    }
    pass
}

// ============================================================================
// Pass 2: Variant Grouping
// ============================================================================

/// Titles that act as cluster roots: every title that is not a variant of any
/// other record, plus the first base each variant was matched against.
/// Sorted shortest first so the outermost base claims its variants.
pub fn find_base_titles(records: &[TitleRecord], rules: &VariantRules) -> Vec<String> {
    let claims: Vec<usize> = (0..records.len())
        .into_par_iter()
        .map(|i| {
            records
                .iter()
                .enumerate()
                .find(|(j, other)| *j != i && rules.is_variant(&other.title, &records[i].title))
                .map(|(j, _)| j)
                .unwrap_or(i)
        })
        .collect();

    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut bases: Vec<String> = Vec::new();
    for j in claims {
        let title = records[j].title.as_str();
        if seen.insert(title) {
            bases.push(title.to_string());
        }
    }
    bases.sort_by(|a, b| {
        a.chars()
            .count()
            .cmp(&b.chars().count())
            .then_with(|| a.cmp(b))
    });
    bases
}

/// Group `records` under their base titles.
///
/// Every record lands in exactly one cluster; records nothing claims come back
/// as singleton clusters of kind [`ClusterKind::Unique`].
pub fn plan_variant_clusters(records: &[TitleRecord], rules: &VariantRules) -> Vec<VariantCluster> {
    let bases = find_base_titles(records, rules);
    let mut assigned = vec![false; records.len()];
    let mut clusters = Vec::new();

    for base in bases {
        let picked: Vec<usize> = (0..records.len())
            .filter(|&i| !assigned[i])
            .filter(|&i| records[i].title == base || rules.is_variant(&base, &records[i].title))
            .collect();
        if picked.is_empty() {
            continue;
        }
        for &i in &picked {
            assigned[i] = true;
        }

        let mut members: Vec<TitleRecord> = picked.iter().map(|&i| records[i].clone()).collect();
        if members.len() == 1 {
            clusters.push(build_cluster(base, ClusterKind::Unique, members, false));
            continue;
        }
        let ambiguous = rank_variant_group(&mut members, &base);
        clusters.push(build_cluster(base, ClusterKind::Variant, members, ambiguous));
    }

    for (i, record) in records.iter().enumerate() {
        if !assigned[i] {
            clusters.push(build_cluster(
                record.title.clone(),
                ClusterKind::Unique,
                vec![record.clone()],
                false,
            ));
        }
    }
    clusters
}

// ============================================================================
// Full Plan
// ============================================================================

fn loser_rebinds(cluster: &VariantCluster, plan: &mut DedupPlan) {
    let Some(keep) = cluster.canonical.local_id else {
        return;
    };
    for loser in cluster.losers() {
        if let Some(id) = loser.local_id {
            plan.rebinds.push(Rebind { from: id, to: keep });
            plan.deletions.push(id);
        }
    }
}

/// Plan both passes in memory.
///
/// `clusters` partitions the input: each pass 2 cluster also lists the exact
/// duplicates its members absorbed in pass 1. Rebinds are ordered pass 1
/// first, so applying them in order ends with every scene on its final
/// canonical.
pub fn deduplicate_catalog(records: &[TitleRecord], rules: &VariantRules) -> DedupPlan {
    let exact = plan_exact_duplicates(records.to_vec());
    let variants = plan_variant_clusters(&exact.survivors, rules);

    let mut plan = DedupPlan::default();
    for cluster in &exact.clusters {
        loser_rebinds(cluster, &mut plan);
        if cluster.ambiguous {
            plan.ambiguous += 1;
        }
    }
    for cluster in &variants {
        loser_rebinds(cluster, &mut plan);
        if cluster.ambiguous {
            plan.ambiguous += 1;
        }
    }

    let absorbed: FxHashMap<&str, &VariantCluster> = exact
        .clusters
        .iter()
        .map(|c| (c.base_title.as_str(), c))
        .collect();

    for cluster in variants {
        let mut members = Vec::with_capacity(cluster.members.len());
        let mut kind = cluster.kind;
        for member in cluster.members {
            let losers = absorbed
                .get(member.title.as_str())
                .map(|c| c.losers().to_vec())
                .unwrap_or_default();
            members.push(member);
            if !losers.is_empty() && kind == ClusterKind::Unique {
                kind = ClusterKind::ExactDuplicate;
            }
            members.extend(losers);
        }
        plan.clusters.push(VariantCluster {
            members,
            kind,
            ..cluster
        });
    }
    plan
}

// ============================================================================
// Applying Against Storage
// ============================================================================

/// Runs both passes against a live catalog.
///
/// Callers must not run two deduplicators against the same catalog at once.
pub struct Deduplicator<'a> {
    rules: &'a VariantRules,
    dry_run: bool,
}

impl<'a> Deduplicator<'a> {
    pub fn new(rules: &'a VariantRules) -> Self {
        Self {
            rules,
            dry_run: false,
        }
    }

    /// Plan and log without touching storage.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run<S: CatalogStore>(&self, store: &mut S) -> Result<DedupStats> {
        let start = Instant::now();
        let mut stats = DedupStats {
            dry_run: self.dry_run,
            ..Default::default()
        };

        let records = store.load_records()?;
        stats.records_loaded = records.len();
        info!("Loaded {} anime records", records.len());

        // Pass 1
        let exact = plan_exact_duplicates(records);
        stats.exact_clusters = exact.clusters.len();
        let exact_deleted =
            self.apply_clusters(store, &exact.clusters, "Pass 1: Exact duplicates", &mut stats);
        stats.exact_deleted = exact_deleted;

        // Pass 2 sees the catalog as pass 1 left it
        let remaining = if self.dry_run {
            exact.survivors
        } else {
            store.load_records()?
        };
        info!("Scanning {} titles for variants", remaining.len());
        let variants: Vec<VariantCluster> = plan_variant_clusters(&remaining, self.rules)
            .into_iter()
            .filter(|c| !c.is_singleton())
            .collect();
        stats.variant_clusters = variants.len();
        let variant_deleted = self.apply_clusters(store, &variants, "Pass 2: Variants", &mut stats);
        stats.variant_deleted = variant_deleted;

        stats.elapsed_seconds = start.elapsed().as_secs_f64();
        info!(
            "Cleanup complete! Deleted {} anime entries ({} storage conflicts)",
            stats.total_deleted(),
            stats.storage_conflicts
        );
        Ok(stats)
    }

    fn apply_clusters<S: CatalogStore>(
        &self,
        store: &mut S,
        clusters: &[VariantCluster],
        phase: &str,
        stats: &mut DedupStats,
    ) -> usize {
        let pb = create_progress_bar(clusters.len() as u64, phase);
        let mut deleted = 0;

        for (n, cluster) in clusters.iter().enumerate() {
            log_cluster(cluster);
            if cluster.ambiguous {
                stats.ambiguous_clusters += 1;
                warn!(
                    "Ambiguous canonical for \"{}\": kept {} by local id fallback",
                    cluster.base_title,
                    cluster.canonical.describe()
                );
            }
            deleted += self.apply_cluster(store, cluster, stats);
            pb.inc(1);
            log_progress(phase, n as u64 + 1, clusters.len() as u64, 100);
        }

        pb.finish_with_message(format!("{}: removed {} records", phase, deleted));
        deleted
    }

    /// Rebind and delete every loser of one cluster. Storage failures skip the
    /// record and are counted; they never abort the run.
    fn apply_cluster<S: CatalogStore>(
        &self,
        store: &mut S,
        cluster: &VariantCluster,
        stats: &mut DedupStats,
    ) -> usize {
        let Some(keep) = cluster.canonical.local_id else {
            warn!(
                "Canonical {} has no local id, skipping cluster",
                cluster.canonical.describe()
            );
            return 0;
        };

        let mut deleted = 0;
        for loser in cluster.losers() {
            let Some(id) = loser.local_id else {
                debug!("{} is not persisted, nothing to delete", loser.describe());
                continue;
            };
            if self.dry_run {
                deleted += 1;
                continue;
            }

            match store.rebind_scenes(id, keep) {
                Ok(moved) => stats.scenes_rebound += moved,
                Err(e) => {
                    warn!("Skipping {}: {}", loser.describe(), e);
                    stats.storage_conflicts += 1;
                    continue;
                }
            }
            match store.delete_record(id) {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!("Could not delete {}: {}", loser.describe(), e);
                    stats.storage_conflicts += 1;
                }
            }
        }
        deleted
    }
}

fn log_cluster(cluster: &VariantCluster) {
    let heading = match cluster.kind {
        ClusterKind::ExactDuplicate => "Exact duplicates for",
        _ => "Base title",
    };
    let losers: Vec<String> = cluster.losers().iter().map(TitleRecord::describe).collect();
    info!(
        "{}: \"{}\" | keeping {} | deleting {}",
        heading,
        cluster.base_title,
        cluster.canonical.describe(),
        losers.join(", ")
    );
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::models::LocalId;

    /// In-memory store: local id -> (record, scene count).
    #[derive(Default)]
    struct MemoryStore {
        records: Vec<TitleRecord>,
        fail_rebind: FxHashSet<LocalId>,
        fail_delete: FxHashSet<LocalId>,
    }

    impl CatalogStore for MemoryStore {
        fn load_records(&self) -> Result<Vec<TitleRecord>> {
            Ok(self.records.clone())
        }

        fn rebind_scenes(&mut self, from: LocalId, to: LocalId) -> Result<usize> {
            if self.fail_rebind.contains(&from) {
                return Err(CatalogError::StorageConflict {
                    local_id: from,
                    reason: "injected".to_string(),
                });
            }
            let moved = self
                .records
                .iter()
                .find(|r| r.local_id == Some(from))
                .map(|r| r.scene_count)
                .unwrap_or(0);
            for r in self.records.iter_mut() {
                if r.local_id == Some(from) {
                    r.scene_count = 0;
                } else if r.local_id == Some(to) {
                    r.scene_count += moved;
                }
            }
            Ok(moved as usize)
        }

        fn delete_record(&mut self, id: LocalId) -> Result<()> {
            if self.fail_delete.contains(&id) {
                return Err(CatalogError::StorageConflict {
                    local_id: id,
                    reason: "injected".to_string(),
                });
            }
            self.records.retain(|r| r.local_id != Some(id));
            Ok(())
        }
    }

    fn rec(local: LocalId, title: &str, mal: Option<i64>, scenes: u32) -> TitleRecord {
        let r = TitleRecord::new(title).with_local_id(local).with_scenes(scenes);
        match mal {
            Some(id) => r.with_external_id(id),
            None => r,
        }
    }

    fn titles(records: &[TitleRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_exact_duplicates_keep_lowest_external_id() {
        let records = vec![
            rec(10, "Bleach", Some(1), 5),
            rec(11, "Bleach", Some(2), 2),
        ];
        let plan = deduplicate_catalog(&records, &VariantRules::default());
        assert_eq!(plan.deletions, vec![11]);
        assert_eq!(plan.rebinds, vec![Rebind { from: 11, to: 10 }]);
        assert_eq!(plan.clusters.len(), 1);
        assert_eq!(plan.clusters[0].canonical.local_id, Some(10));
        assert_eq!(plan.clusters[0].kind, ClusterKind::ExactDuplicate);
        assert_eq!(plan.clusters[0].members.len(), 2);
    }

    #[test]
    fn test_exact_duplicates_lower_id_beats_scene_count() {
        let pass = plan_exact_duplicates(vec![
            rec(1, "Monster", Some(30), 9),
            rec(2, "Monster", Some(19), 1),
        ]);
        assert_eq!(pass.clusters[0].canonical.external_id, Some(19));
        assert_eq!(pass.survivors.len(), 1);
        assert_eq!(pass.survivors[0].scene_count, 10);
    }

    #[test]
    fn test_exact_duplicates_without_ids_prefer_scenes() {
        let pass = plan_exact_duplicates(vec![
            rec(1, "Mushishi", None, 1),
            rec(2, "Mushishi", Some(457), 0),
            rec(3, "Mushishi", None, 4),
        ]);
        let cluster = &pass.clusters[0];
        assert_eq!(cluster.canonical.local_id, Some(3));
        assert!(!cluster.ambiguous);
    }

    #[test]
    fn test_exact_tie_falls_back_to_local_id() {
        let pass = plan_exact_duplicates(vec![
            rec(7, "Nana", None, 2),
            rec(4, "Nana", None, 2),
        ]);
        let cluster = &pass.clusters[0];
        assert_eq!(cluster.canonical.local_id, Some(4));
        assert!(cluster.ambiguous);
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let pass = plan_exact_duplicates(vec![rec(1, "Bleach", None, 0), rec(2, "BLEACH", None, 0)]);
        assert!(pass.clusters.is_empty());
        assert_eq!(pass.survivors.len(), 2);
    }

    #[test]
    fn test_variant_cluster_keeps_base_title() {
        let records = vec![
            rec(2, "Fate/Zero 2nd Season", Some(11741), 8),
            rec(1, "Fate/Zero", Some(10087), 1),
        ];
        let clusters = plan_variant_clusters(&records, &VariantRules::default());
        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.base_title, "Fate/Zero");
        assert_eq!(cluster.kind, ClusterKind::Variant);
        assert_eq!(cluster.canonical.title, "Fate/Zero");
        assert_eq!(titles(&cluster.members), vec!["Fate/Zero", "Fate/Zero 2nd Season"]);
    }

    #[test]
    fn test_variants_ordered_by_scene_count() {
        let records = vec![
            rec(1, "Dragon Ball", None, 0),
            rec(2, "Dragon Ball GT", None, 1),
            rec(3, "Dragon Ball Z", None, 6),
            rec(4, "Dragon Ball Kai", None, 3),
        ];
        let clusters = plan_variant_clusters(&records, &VariantRules::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(
            titles(&clusters[0].members),
            vec!["Dragon Ball", "Dragon Ball Z", "Dragon Ball Kai", "Dragon Ball GT"]
        );
    }

    #[test]
    fn test_clusters_partition_records() {
        let records = vec![
            rec(1, "A", None, 0),
            rec(2, "A 2", None, 0),
            rec(3, "A 2 Movie", None, 0),
            rec(4, "B", None, 0),
            rec(5, "C: Side Story", None, 0),
        ];
        let clusters = plan_variant_clusters(&records, &VariantRules::default());
        let mut seen: Vec<LocalId> = clusters
            .iter()
            .flat_map(|c| c.members.iter().filter_map(|m| m.local_id))
            .collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        let a = clusters.iter().find(|c| c.base_title == "A").unwrap();
        assert_eq!(a.members.len(), 3);
        assert!(clusters.iter().all(|c| c.canonical == c.members[0]));
    }

    #[test]
    fn test_base_titles_include_unclaimed_and_claimed() {
        let records = vec![
            rec(1, "Bleach", None, 0),
            rec(2, "Bleach: Thousand-Year Blood War", None, 0),
            rec(3, "Naruto", None, 0),
        ];
        let bases = find_base_titles(&records, &VariantRules::default());
        assert_eq!(bases, vec!["Bleach".to_string(), "Naruto".to_string()]);
    }

    #[test]
    fn test_orphan_variant_still_clusters() {
        // Base title missing from the catalog: the variant is its own base.
        let records = vec![rec(1, "Code Geass R2", None, 2)];
        let clusters = plan_variant_clusters(&records, &VariantRules::default());
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].is_singleton());
        assert_eq!(clusters[0].kind, ClusterKind::Unique);
    }

    #[test]
    fn test_case_variants_cluster_deterministically() {
        let records = vec![rec(1, "Bleach", None, 3), rec(2, "BLEACH", None, 0)];
        let clusters = plan_variant_clusters(&records, &VariantRules::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].base_title, "BLEACH");
        assert_eq!(clusters[0].canonical.local_id, Some(2));
    }

    #[test]
    fn test_full_plan_chains_rebinds() {
        let records = vec![
            rec(1, "Fate/Zero", Some(10087), 1),
            rec(2, "Fate/Zero 2nd Season", Some(11741), 2),
            rec(3, "Fate/Zero 2nd Season", None, 1),
            rec(4, "Naruto", Some(20), 0),
        ];
        let plan = deduplicate_catalog(&records, &VariantRules::default());
        assert_eq!(
            plan.rebinds,
            vec![Rebind { from: 3, to: 2 }, Rebind { from: 2, to: 1 }]
        );
        assert_eq!(plan.deletions, vec![3, 2]);

        let fate = plan.clusters.iter().find(|c| c.base_title == "Fate/Zero").unwrap();
        assert_eq!(fate.members.len(), 3);
        assert_eq!(fate.canonical.local_id, Some(1));
        let total: usize = plan.clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(total, records.len());
    }

    #[test]
    fn test_plan_is_idempotent() {
        let records = vec![
            rec(1, "Bleach", Some(269), 4),
            rec(2, "Bleach", Some(300), 1),
            rec(3, "Bleach: Memories of Nobody", Some(1686), 2),
            rec(4, "Monster", Some(19), 0),
        ];
        let rules = VariantRules::default();
        let first = deduplicate_catalog(&records, &rules);
        assert!(!first.is_noop());

        let remaining: Vec<TitleRecord> = records
            .into_iter()
            .filter(|r| !first.deletions.contains(&r.local_id.unwrap()))
            .collect();
        let second = deduplicate_catalog(&remaining, &rules);
        assert!(second.is_noop());
        assert!(second.clusters.iter().all(VariantCluster::is_singleton));
    }

    #[test]
    fn test_deduplicator_applies_both_passes() {
        let mut store = MemoryStore {
            records: vec![
                rec(10, "Bleach", Some(1), 5),
                rec(11, "Bleach", Some(2), 2),
                rec(12, "Bleach: Thousand-Year Blood War", Some(41467), 3),
                rec(13, "Monster", Some(19), 1),
            ],
            ..Default::default()
        };
        let rules = VariantRules::default();
        let stats = Deduplicator::new(&rules).run(&mut store).unwrap();

        assert_eq!(stats.records_loaded, 4);
        assert_eq!(stats.exact_deleted, 1);
        assert_eq!(stats.variant_deleted, 1);
        assert_eq!(stats.scenes_rebound, 5);
        assert_eq!(stats.storage_conflicts, 0);
        assert_eq!(titles(&store.records), vec!["Bleach", "Monster"]);
        assert_eq!(store.records[0].scene_count, 10);

        let again = Deduplicator::new(&rules).run(&mut store).unwrap();
        assert_eq!(again.total_deleted(), 0);
        assert_eq!(again.scenes_rebound, 0);
    }

    #[test]
    fn test_storage_conflict_skips_record_and_continues() {
        let mut store = MemoryStore {
            records: vec![
                rec(1, "Dragon Ball", None, 1),
                rec(2, "Dragon Ball Z", None, 1),
                rec(3, "Dragon Ball GT", None, 1),
                rec(4, "Naruto", None, 0),
                rec(5, "Naruto Shippuden", None, 0),
            ],
            fail_rebind: [2].into_iter().collect(),
            fail_delete: [5].into_iter().collect(),
        };
        let rules = VariantRules::default();
        let stats = Deduplicator::new(&rules).run(&mut store).unwrap();

        assert_eq!(stats.storage_conflicts, 2);
        assert_eq!(stats.variant_deleted, 1);
        assert_eq!(
            titles(&store.records),
            vec!["Dragon Ball", "Dragon Ball Z", "Naruto", "Naruto Shippuden"]
        );
    }

    #[test]
    fn test_dry_run_leaves_store_untouched() {
        let original = vec![
            rec(1, "Toradora", None, 1),
            rec(2, "Toradora", None, 0),
            rec(3, "Toradora OVA", None, 0),
        ];
        let mut store = MemoryStore {
            records: original.clone(),
            ..Default::default()
        };
        let rules = VariantRules::default();
        let stats = Deduplicator::new(&rules).dry_run(true).run(&mut store).unwrap();

        assert!(stats.dry_run);
        assert_eq!(stats.exact_deleted, 1);
        assert_eq!(stats.variant_deleted, 1);
        assert_eq!(store.records, original);
    }
}
