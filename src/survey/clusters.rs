use pairwise_engine::{Cluster, ClusterMap};

/// The brand clusters used when the configuration does not list any.
///
/// Two brands appear twice. Later entries win, so CALVIN KLEIN JEANS and
/// POLO RALPH LAUREN end up in cluster 7.
pub const DEFAULT_BRAND_CLUSTERS: &[(&str, u32)] = &[
    ("GUCCI", 1),
    ("SAINT LAURENT", 1),
    ("ALEXANDER MCQUEEN", 1),
    ("TOM FORD", 1),
    ("MAISON MARGIELA", 1),
    ("RICK OWENS", 1),
    ("YOHJI YAMAMOTO", 1),
    ("OFF-WHITE", 2),
    ("SUPREME", 2),
    ("PALM ANGELS", 2),
    ("FEAR OF GOD", 2),
    ("THE FRANKIE SHOP", 3),
    ("A.P.C.", 3),
    ("VINCE", 3),
    ("NANUSHKA", 3),
    ("RAG & BONE", 3),
    ("POLO RALPH LAUREN", 3),
    ("NIKE", 4),
    ("ADIDAS", 4),
    ("THE NORTH FACE", 4),
    ("LULULEMON", 4),
    ("LEVI'S", 5),
    ("AGOLDE", 5),
    ("7 FOR ALL MANKIND", 5),
    ("CALVIN KLEIN JEANS", 5),
    ("ZIMMERMANN", 6),
    ("JOHANNA ORTIZ", 6),
    ("SOLID & STRIPED", 6),
    ("HUNZA G", 6),
    ("MICHAEL KORS COLLECTION", 7),
    ("VERSACE JEANS COUTURE", 7),
    ("CALVIN KLEIN JEANS", 7),
    ("POLO RALPH LAUREN", 7),
];

pub fn default_cluster_map() -> ClusterMap {
    ClusterMap::from_pairs(
        DEFAULT_BRAND_CLUSTERS
            .iter()
            .map(|(name, c)| (*name, Cluster::Numbered(*c))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_resolve_to_the_last_entry() {
        let map = default_cluster_map();
        assert_eq!(map.len(), 31);
        assert_eq!(map.get("Calvin Klein Jeans"), Some(&Cluster::Numbered(7)));
        assert_eq!(map.get("POLO RALPH LAUREN"), Some(&Cluster::Numbered(7)));
        assert_eq!(map.get("Off-White"), Some(&Cluster::Numbered(2)));
        assert_eq!(map.get("Prada"), None);
    }
}
