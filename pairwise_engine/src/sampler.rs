use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::*;

fn view(asset: &DisplayAsset) -> AssetView {
    AssetView {
        resource: asset.resource.clone(),
        caption: asset.caption.clone(),
    }
}

/// Weighted choice with replacement.
///
/// Always returns exactly `k` assets when the pool is not empty: assets
/// from frequent sub-categories may appear several times. Returns `None`
/// for an empty pool.
pub fn sample<R: Rng + ?Sized>(
    assets: &[DisplayAsset],
    k: usize,
    rng: &mut R,
) -> Option<Vec<AssetView>> {
    if assets.is_empty() {
        return None;
    }
    let dist = WeightedIndex::new(assets.iter().map(|a| a.weight.max(1))).ok()?;
    let res: Vec<AssetView> = (0..k).map(|_| view(&assets[dist.sample(rng)])).collect();
    debug!("sample: {} draws from a pool of {}", res.len(), assets.len());
    Some(res)
}

/// Weighted choice without replacement.
///
/// Returns `min(k, assets.len())` distinct assets, or `None` for an empty pool.
pub fn sample_distinct<R: Rng + ?Sized>(
    assets: &[DisplayAsset],
    k: usize,
    rng: &mut R,
) -> Option<Vec<AssetView>> {
    if assets.is_empty() {
        return None;
    }
    let mut remaining: Vec<&DisplayAsset> = assets.iter().collect();
    let mut res: Vec<AssetView> = Vec::new();
    while res.len() < k && !remaining.is_empty() {
        let dist = WeightedIndex::new(remaining.iter().map(|a| a.weight.max(1))).ok()?;
        let picked = remaining.remove(dist.sample(rng));
        res.push(view(picked));
    }
    Some(res)
}

/// Draws with the given mode.
pub fn sample_with<R: Rng + ?Sized>(
    mode: SamplingMode,
    assets: &[DisplayAsset],
    k: usize,
    rng: &mut R,
) -> Option<Vec<AssetView>> {
    match mode {
        SamplingMode::WithReplacement => sample(assets, k, rng),
        SamplingMode::Distinct => sample_distinct(assets, k, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn pool(rows: &[(&str, u32)]) -> Vec<DisplayAsset> {
        rows.iter()
            .map(|(r, w)| DisplayAsset {
                resource: r.to_string(),
                weight: *w,
                caption: None,
            })
            .collect()
    }

    #[test]
    fn always_returns_k_assets() {
        let mut rng = StdRng::seed_from_u64(7);
        let assets = pool(&[("a.jpg", 1), ("b.jpg", 1)]);
        for k in 0..10 {
            assert_eq!(sample(&assets, k, &mut rng).unwrap().len(), k);
        }
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample(&[], 6, &mut rng), None);
        assert_eq!(sample_distinct(&[], 3, &mut rng), None);
    }

    #[test]
    fn weights_bias_the_draw() {
        let mut rng = StdRng::seed_from_u64(11);
        let assets = pool(&[("common.jpg", 9), ("rare.jpg", 1)]);
        let mut counts: HashMap<String, usize> = HashMap::new();
        for v in sample(&assets, 5000, &mut rng).unwrap() {
            *counts.entry(v.resource).or_insert(0) += 1;
        }
        let common = counts["common.jpg"] as f64 / 5000.0;
        assert!(common > 0.85 && common < 0.95, "common share {}", common);
    }

    #[test]
    fn distinct_draw_has_no_duplicates() {
        let mut rng = StdRng::seed_from_u64(3);
        let assets = pool(&[("a.jpg", 5), ("b.jpg", 1), ("c.jpg", 2), ("d.jpg", 1)]);
        for _ in 0..100 {
            let drawn = sample_distinct(&assets, 3, &mut rng).unwrap();
            let unique: HashSet<&str> = drawn.iter().map(|v| v.resource.as_str()).collect();
            assert_eq!(drawn.len(), 3);
            assert_eq!(unique.len(), 3);
        }
        assert_eq!(sample_distinct(&assets, 10, &mut rng).unwrap().len(), 4);
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let assets = pool(&[("a.jpg", 2), ("b.jpg", 1), ("c.jpg", 3)]);
        let d1 = sample(&assets, 6, &mut StdRng::seed_from_u64(42));
        let d2 = sample(&assets, 6, &mut StdRng::seed_from_u64(42));
        assert_eq!(d1, d2);
    }
}
