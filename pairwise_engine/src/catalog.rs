use log::{debug, info, warn};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::*;

/// The key used to match names across the source tables.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Strips whitespace and stray quotes around a resource identifier.
/// Empty identifiers are treated as missing.
pub fn clean_resource(resource: &str) -> Option<String> {
    let s = resource
        .trim()
        .trim_matches(&['\'', '"'][..])
        .trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// A static mapping from item names to clusters.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ClusterMap {
    entries: BTreeMap<String, Cluster>,
}

impl ClusterMap {
    /// Later entries override earlier ones for the same name.
    pub fn from_pairs<S: AsRef<str>>(pairs: impl IntoIterator<Item = (S, Cluster)>) -> ClusterMap {
        let mut entries: BTreeMap<String, Cluster> = BTreeMap::new();
        for (name, cluster) in pairs {
            let key = normalize_name(name.as_ref());
            if let Some(previous) = entries.insert(key.clone(), cluster.clone()) {
                if previous != cluster {
                    warn!(
                        "ClusterMap: {} mapped to cluster {} then {}, keeping {}",
                        key, previous, cluster, cluster
                    );
                }
            }
        }
        ClusterMap { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Cluster> {
        self.entries.get(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where the cluster of an item comes from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ClusterSource {
    Static(ClusterMap),
    /// The `category` field of the metric rows.
    Category,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Drop the asset rows that carry no caption.
    pub require_caption: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum IssueKind {
    /// Excluded: no row with a resolvable metric.
    MissingMetric,
    /// Excluded: no row with a usable resource.
    MissingAssets,
    /// Excluded: the item has no category in the data.
    MissingCategory,
    /// Kept, but absent from the static cluster map and never selected.
    Unclustered,
    /// Kept with its first metric; later rows disagree.
    ConflictingMetric,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IntegrityIssue {
    pub name: String,
    pub kind: IssueKind,
}

impl IntegrityIssue {
    pub fn excludes_item(&self) -> bool {
        matches!(
            self.kind,
            IssueKind::MissingMetric | IssueKind::MissingAssets | IssueKind::MissingCategory
        )
    }
}

/// What happened to the rows during a catalog build.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BuildReport {
    pub issues: Vec<IntegrityIssue>,
    pub dropped_asset_rows: usize,
}

impl BuildReport {
    pub fn excluded(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues.iter().filter(|i| i.excludes_item())
    }
}

/// The deduplicated, labeled population of items.
///
/// Immutable after construction. All iteration orders are sorted by
/// normalized name so that a seeded generator always sees the same
/// population in the same order.
#[derive(PartialEq, Debug, Clone)]
pub struct Catalog {
    variant: Variant,
    items: BTreeMap<String, Item>,
    clusters: BTreeMap<Cluster, Vec<String>>,
}

impl Catalog {
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The display names of all the items, in key order.
    pub fn list_items(&self) -> Vec<&str> {
        self.items.values().map(|it| it.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.item(name).is_some()
    }

    pub fn cluster_of(&self, name: &str) -> Option<&Cluster> {
        self.item(name).and_then(|it| it.cluster.as_ref())
    }

    pub fn metric_of(&self, name: &str) -> Option<f64> {
        self.item(name).map(|it| it.metric)
    }

    pub fn assets_of(&self, name: &str) -> Option<&[DisplayAsset]> {
        self.item(name).map(|it| it.assets.as_slice())
    }

    /// The clusters having at least one selectable item, sorted.
    pub fn clusters(&self) -> Vec<&Cluster> {
        self.clusters.keys().collect()
    }

    /// The keys of the items in the given cluster, sorted.
    pub fn members(&self, cluster: &Cluster) -> &[String] {
        self.clusters
            .get(cluster)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The keys of all the items that belong to a cluster, sorted.
    pub fn selectable(&self) -> Vec<&String> {
        self.items
            .iter()
            .filter(|(_, it)| it.cluster.is_some())
            .map(|(k, _)| k)
            .collect()
    }
}

struct ResolvedMetric {
    name: String,
    metric: f64,
    category: Option<String>,
}

/// Builds the catalog from the two source tables.
///
/// Deterministic: the same rows always give the same catalog.
pub fn build_catalog(
    variant: Variant,
    metrics: &[MetricRow],
    assets: &[AssetRow],
    clusters: &ClusterSource,
    options: &CatalogOptions,
) -> (Catalog, BuildReport) {
    info!(
        "build_catalog: {} metric rows, {} asset rows for {}",
        metrics.len(),
        assets.len(),
        variant
    );
    let mut report = BuildReport::default();
    let needs_category = matches!(clusters, ClusterSource::Category);

    // Every key seen anywhere, to report the ones that do not make it.
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut uncategorized: BTreeSet<String> = BTreeSet::new();
    let mut conflicting: BTreeSet<String> = BTreeSet::new();

    let mut resolved: BTreeMap<String, ResolvedMetric> = BTreeMap::new();
    for row in metrics {
        let key = normalize_name(&row.name);
        if key.is_empty() {
            continue;
        }
        seen.insert(key.clone());
        let metric = match row.metric {
            Some(m) if m.is_finite() => m,
            _ => continue,
        };
        let category = row
            .category
            .as_ref()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if needs_category && category.is_none() {
            uncategorized.insert(key);
            continue;
        }
        match resolved.get(&key) {
            Some(previous) => {
                if previous.metric != metric && !conflicting.contains(&key) {
                    debug!(
                        "build_catalog: {}: metric {} ignored, keeping {}",
                        key, metric, previous.metric
                    );
                    conflicting.insert(key);
                }
            }
            None => {
                resolved.insert(
                    key,
                    ResolvedMetric {
                        name: row.name.trim().to_string(),
                        metric,
                        category,
                    },
                );
            }
        }
    }

    // The valid asset rows for each key, in input order.
    let mut pools: BTreeMap<String, Vec<(String, Option<String>, Option<String>)>> =
        BTreeMap::new();
    for row in assets {
        let key = normalize_name(&row.name);
        if key.is_empty() {
            report.dropped_asset_rows += 1;
            continue;
        }
        seen.insert(key.clone());
        let resource = match row.resource.as_deref().and_then(clean_resource) {
            Some(r) => r,
            None => {
                report.dropped_asset_rows += 1;
                continue;
            }
        };
        let caption = row.caption.clone().filter(|c| !c.trim().is_empty());
        if options.require_caption && caption.is_none() {
            report.dropped_asset_rows += 1;
            continue;
        }
        let sub_category = row
            .sub_category
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        pools
            .entry(key)
            .or_default()
            .push((resource, sub_category, caption));
    }

    let mut items: BTreeMap<String, Item> = BTreeMap::new();
    let mut cluster_members: BTreeMap<Cluster, Vec<String>> = BTreeMap::new();
    for key in seen {
        let pool = pools.remove(&key);
        let rm = match resolved.remove(&key) {
            Some(rm) => rm,
            None => {
                let kind = if uncategorized.contains(&key) {
                    IssueKind::MissingCategory
                } else {
                    IssueKind::MissingMetric
                };
                warn!("build_catalog: excluding {}: {:?}", key, kind);
                report.issues.push(IntegrityIssue { name: key, kind });
                continue;
            }
        };
        let pool = match pool {
            Some(p) if !p.is_empty() => p,
            _ => {
                warn!("build_catalog: excluding {}: no usable asset", key);
                report.issues.push(IntegrityIssue {
                    name: key,
                    kind: IssueKind::MissingAssets,
                });
                continue;
            }
        };
        if conflicting.contains(&key) {
            report.issues.push(IntegrityIssue {
                name: key.clone(),
                kind: IssueKind::ConflictingMetric,
            });
        }

        let mut counts: BTreeMap<Option<String>, u32> = BTreeMap::new();
        for (_, sub, _) in pool.iter() {
            *counts.entry(sub.clone()).or_insert(0) += 1;
        }
        let assets: Vec<DisplayAsset> = pool
            .into_iter()
            .map(|(resource, sub, caption)| DisplayAsset {
                resource,
                weight: counts.get(&sub).cloned().unwrap_or(1),
                caption,
            })
            .collect();

        let cluster = match clusters {
            ClusterSource::Static(map) => map.get(&key).cloned(),
            ClusterSource::Category => rm.category.clone().map(Cluster::Named),
        };
        match &cluster {
            Some(c) => cluster_members.entry(c.clone()).or_default().push(key.clone()),
            None => {
                debug!("build_catalog: {} has no cluster", key);
                report.issues.push(IntegrityIssue {
                    name: key.clone(),
                    kind: IssueKind::Unclustered,
                });
            }
        }

        items.insert(
            key,
            Item {
                name: rm.name,
                cluster,
                metric: rm.metric,
                assets,
            },
        );
    }

    info!(
        "build_catalog: {} items in {} clusters, {} excluded, {} asset rows dropped",
        items.len(),
        cluster_members.len(),
        report.excluded().count(),
        report.dropped_asset_rows
    );

    (
        Catalog {
            variant,
            items,
            clusters: cluster_members,
        },
        report,
    )
}

/// Explicit memoisation of a catalog.
///
/// The catalog is built on first request and reused until `invalidate`
/// is called.
#[derive(Debug, Default)]
pub struct CatalogCache {
    slot: Option<Arc<Catalog>>,
}

impl CatalogCache {
    pub fn new() -> CatalogCache {
        CatalogCache { slot: None }
    }

    pub fn get(&self) -> Option<Arc<Catalog>> {
        self.slot.clone()
    }

    pub fn get_or_try_build<E, F>(&mut self, build: F) -> Result<Arc<Catalog>, E>
    where
        F: FnOnce() -> Result<Catalog, E>,
    {
        if let Some(c) = &self.slot {
            return Ok(c.clone());
        }
        let catalog = Arc::new(build()?);
        self.slot = Some(catalog.clone());
        Ok(catalog)
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
