/*!

This is the long-form manual for `pairwise_engine` and `pwsurvey`.

## Input data

Each survey segment needs two tables joined on the item name. Names are
matched on their trimmed, uppercase form.

* the metric table: one numeric value per item (the average price of a
  brand, the follower count of an influencer). For influencers, the same
  table also carries the category of each item.
* the asset table: one row per displayable resource, with an optional
  sub-category and an optional caption.

Rows are accepted as they come. When building the catalog:
* asset rows without a resource (or, for influencers, without a caption)
  are dropped
* items missing from either table, or left without any asset, are
  excluded and listed in the build report
* the first resolvable metric of an item is kept
* brands missing from the cluster map are kept but never drawn into a
  question

### `brands`

Brand data comes from two worksheets of one Excel workbook. The clusters
come from a fixed map of brand names to cluster numbers.

### `influencers`

Influencer data comes from one CSV file with one row per post. The
category column provides the clusters, and the image file names are
turned into URLs with a configurable prefix.

## Sampling

The assets displayed for an item are drawn by weighted choice, the weight
of an asset being the number of assets sharing its sub-category. Two modes
are available:
* `WithReplacement` (default): always exactly `k` assets, the same asset
  may be displayed twice when the pool is small
* `Distinct`: `min(k, n)` different assets

## Questions

A session holds 30 questions by default:
* 20 contrast questions: the reference and one candidate come from the
  same cluster, the other candidate from a different cluster. The side of
  the same-cluster candidate is drawn at random.
* 10 mixed questions: three items from three different clusters, with the
  roles shuffled.

For brands, the cluster pairs of the contrast questions are drawn from the
ordered pairs of clusters that can produce a question: the first 4 without
replacement, the remaining 16 with replacement. For influencers, a
category is drawn for each contrast question and the attempt is skipped
when the category has fewer than two influencers. Skipped attempts are
listed in the generation report, and the session is shorter accordingly.

## Reproducibility

Each session draws from its own random generator, seeded from the base
seed of the survey and the session identifier. The same catalog, seed and
identifier always give the same questions, including the displayed assets.

*/
