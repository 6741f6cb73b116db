pub use crate::catalog::*;
pub use crate::config::*;

/// A builder for assembling a catalog row by row.
///
/// Readers for the various source formats are expected to produce rows
/// and hand them over to the builder.
///
/// ```
/// pub use pairwise_engine::builder::CatalogBuilder;
/// pub use pairwise_engine::{Cluster, ClusterMap, Variant};
///
/// let (catalog, report) = CatalogBuilder::new(Variant::Brands)
///     .cluster_map(ClusterMap::from_pairs(vec![("Gucci", Cluster::Numbered(1))]))
///     .add_metric("Gucci", Some(950.0))
///     .add_asset("GUCCI", Some("bag.jpg"), Some("bags"))
///     .add_metric("Vince", Some(300.0))
///     .build();
///
/// assert_eq!(catalog.list_items(), vec!["Gucci"]);
/// assert_eq!(report.excluded().count(), 1);
/// ```
pub struct CatalogBuilder {
    pub(crate) _variant: Variant,
    pub(crate) _clusters: ClusterSource,
    pub(crate) _options: CatalogOptions,
    pub(crate) _metrics: Vec<MetricRow>,
    pub(crate) _assets: Vec<AssetRow>,
}

impl CatalogBuilder {
    /// Brands default to an empty static cluster map, influencers to the
    /// categories of their rows with captions required.
    pub fn new(variant: Variant) -> CatalogBuilder {
        let (clusters, options) = match variant {
            Variant::Brands => (
                ClusterSource::Static(ClusterMap::default()),
                CatalogOptions::default(),
            ),
            Variant::Influencers => (
                ClusterSource::Category,
                CatalogOptions {
                    require_caption: true,
                },
            ),
        };
        CatalogBuilder {
            _variant: variant,
            _clusters: clusters,
            _options: options,
            _metrics: Vec::new(),
            _assets: Vec::new(),
        }
    }

    pub fn cluster_map(self, map: ClusterMap) -> CatalogBuilder {
        CatalogBuilder {
            _clusters: ClusterSource::Static(map),
            ..self
        }
    }

    pub fn options(self, options: CatalogOptions) -> CatalogBuilder {
        CatalogBuilder {
            _options: options,
            ..self
        }
    }

    pub fn add_metric(self, name: &str, metric: Option<f64>) -> CatalogBuilder {
        self.add_metric_row(MetricRow {
            name: name.to_string(),
            metric,
            category: None,
        })
    }

    pub fn add_asset(
        self,
        name: &str,
        resource: Option<&str>,
        sub_category: Option<&str>,
    ) -> CatalogBuilder {
        self.add_asset_row(AssetRow {
            name: name.to_string(),
            resource: resource.map(|s| s.to_string()),
            sub_category: sub_category.map(|s| s.to_string()),
            caption: None,
        })
    }

    pub fn add_metric_row(mut self, row: MetricRow) -> CatalogBuilder {
        self._metrics.push(row);
        self
    }

    pub fn add_asset_row(mut self, row: AssetRow) -> CatalogBuilder {
        self._assets.push(row);
        self
    }

    pub fn extend_metrics(mut self, rows: impl IntoIterator<Item = MetricRow>) -> CatalogBuilder {
        self._metrics.extend(rows);
        self
    }

    pub fn extend_assets(mut self, rows: impl IntoIterator<Item = AssetRow>) -> CatalogBuilder {
        self._assets.extend(rows);
        self
    }

    pub fn build(self) -> (Catalog, BuildReport) {
        build_catalog(
            self._variant,
            &self._metrics,
            &self._assets,
            &self._clusters,
            &self._options,
        )
    }
}
