use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Catalog;
use crate::config::*;
use crate::sampler::sample_with;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum QuestionShape {
    Contrast,
    Mixed,
}

/// An attempt that did not produce a question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SkippedAttempt {
    pub shape: QuestionShape,
    pub reason: EngineError,
}

/// Counts of what a generation produced, against what it attempted.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct GenerationReport {
    pub contrast_requested: usize,
    pub contrast_produced: usize,
    pub mixed_requested: usize,
    pub mixed_produced: usize,
    pub skipped: Vec<SkippedAttempt>,
}

impl GenerationReport {
    pub fn produced(&self) -> usize {
        self.contrast_produced + self.mixed_produced
    }

    pub fn requested(&self) -> usize {
        self.contrast_requested + self.mixed_requested
    }

    /// True when no attempt was skipped.
    pub fn is_full(&self) -> bool {
        self.skipped.is_empty()
    }

    fn record(&mut self, shape: QuestionShape, res: Result<Question, EngineError>) -> Option<Question> {
        match res {
            Ok(q) => {
                match shape {
                    QuestionShape::Contrast => self.contrast_produced += 1,
                    QuestionShape::Mixed => self.mixed_produced += 1,
                }
                Some(q)
            }
            Err(reason) => {
                warn!("skipping {:?} question: {}", shape, reason);
                self.skipped.push(SkippedAttempt { shape, reason });
                None
            }
        }
    }
}

/// The ordered questions of one session, with the generation report.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
    pub report: GenerationReport,
}

fn item_view<R: Rng + ?Sized>(
    catalog: &Catalog,
    key: &str,
    rules: &GenerationRules,
    rng: &mut R,
) -> Result<ItemView, EngineError> {
    let item = catalog.item(key).ok_or(EngineError::EmptyAssetPool {
        name: key.to_string(),
    })?;
    let assets = sample_with(rules.sampling, &item.assets, rules.assets_per_item, rng).ok_or(
        EngineError::EmptyAssetPool {
            name: item.name.clone(),
        },
    )?;
    Ok(ItemView {
        name: item.name.clone(),
        cluster: item.cluster.clone(),
        metric: item.metric,
        assets,
    })
}

/// Builds the question with the `same` item on its randomly chosen side.
fn contrast_question<R: Rng + ?Sized>(
    catalog: &Catalog,
    verify: &Cluster,
    test: &Cluster,
    (reference, same, different): (&str, &str, &str),
    rules: &GenerationRules,
    rng: &mut R,
) -> Result<Question, EngineError> {
    let same_side = if rng.gen::<f64>() < 0.5 { Side::A } else { Side::B };
    let (a, b) = match same_side {
        Side::A => (same, different),
        Side::B => (different, same),
    };
    Ok(Question {
        kind: QuestionKind::Contrast {
            verify: verify.clone(),
            test: test.clone(),
            same: same_side,
        },
        reference: item_view(catalog, reference, rules, rng)?,
        option_a: item_view(catalog, a, rules, rng)?,
        option_b: item_view(catalog, b, rules, rng)?,
    })
}

/// A reference and a candidate from `verify`, the other candidate from `test`.
///
/// `verify` needs at least two items and `test` at least one.
pub fn generate_cluster_question<R: Rng + ?Sized>(
    catalog: &Catalog,
    verify: &Cluster,
    test: &Cluster,
    rules: &GenerationRules,
    rng: &mut R,
) -> Result<Question, EngineError> {
    if verify == test {
        return Err(EngineError::InvalidClusterPair {
            cluster: verify.clone(),
        });
    }
    let verify_members = catalog.members(verify);
    if verify_members.len() < 2 {
        return Err(EngineError::InsufficientPopulation {
            cluster: verify.clone(),
            required: 2,
            available: verify_members.len(),
        });
    }
    let test_members = catalog.members(test);
    if test_members.is_empty() {
        return Err(EngineError::InsufficientPopulation {
            cluster: test.clone(),
            required: 1,
            available: 0,
        });
    }

    // The emptiness checks above make these draws infallible.
    let reference = verify_members.choose(rng).ok_or(EngineError::NoContrastPair)?;
    let others: Vec<&String> = verify_members.iter().filter(|k| *k != reference).collect();
    let same = *others.choose(rng).ok_or(EngineError::NoContrastPair)?;
    let different = test_members.choose(rng).ok_or(EngineError::NoContrastPair)?;
    debug!(
        "generate_cluster_question: {} vs {}: ref {} same {} different {}",
        verify, test, reference, same, different
    );
    contrast_question(
        catalog,
        verify,
        test,
        (reference.as_str(), same.as_str(), different.as_str()),
        rules,
        rng,
    )
}

/// Three items from three distinct clusters, roles shuffled.
///
/// With fewer than three populated clusters, the missing slots are filled
/// with distinct items from the clusters already drawn.
pub fn generate_mixed_question<R: Rng + ?Sized>(
    catalog: &Catalog,
    rules: &GenerationRules,
    rng: &mut R,
) -> Result<Question, EngineError> {
    let available = catalog.selectable().len();
    if available < 3 {
        return Err(EngineError::InsufficientItems {
            required: 3,
            available,
        });
    }
    let clusters = catalog.clusters();
    let chosen: Vec<&Cluster> = clusters
        .choose_multiple(rng, clusters.len().min(3))
        .cloned()
        .collect();

    let mut picks: Vec<&String> = Vec::new();
    for c in chosen.iter() {
        if let Some(k) = catalog.members(c).choose(rng) {
            picks.push(k);
        }
    }
    while picks.len() < 3 {
        let rest: Vec<&String> = chosen
            .iter()
            .flat_map(|c| catalog.members(c).iter())
            .filter(|k| !picks.contains(k))
            .collect();
        match rest.choose(rng) {
            Some(k) => picks.push(*k),
            None => {
                return Err(EngineError::InsufficientItems {
                    required: 3,
                    available: picks.len(),
                })
            }
        }
    }
    picks.shuffle(rng);
    debug!("generate_mixed_question: {:?}", picks);

    Ok(Question {
        kind: QuestionKind::Mixed,
        reference: item_view(catalog, picks[0], rules, rng)?,
        option_a: item_view(catalog, picks[1], rules, rng)?,
        option_b: item_view(catalog, picks[2], rules, rng)?,
    })
}

/// A reference and a candidate from `category`, the other candidate drawn
/// uniformly from the items outside `category`.
pub fn generate_category_question<R: Rng + ?Sized>(
    catalog: &Catalog,
    category: &Cluster,
    rules: &GenerationRules,
    rng: &mut R,
) -> Result<Question, EngineError> {
    let members = catalog.members(category);
    if members.len() < 2 {
        return Err(EngineError::InsufficientPopulation {
            cluster: category.clone(),
            required: 2,
            available: members.len(),
        });
    }
    let population = catalog.selectable();
    if population.len() == members.len() {
        return Err(EngineError::InsufficientItems {
            required: members.len() + 1,
            available: population.len(),
        });
    }

    let pair: Vec<&String> = members.choose_multiple(rng, 2).collect();
    let (reference, same) = (pair[0], pair[1]);

    let outside: Vec<&String> = population
        .iter()
        .filter(|k| catalog.cluster_of(k) != Some(category))
        .cloned()
        .collect();
    let different = *outside.choose(rng).ok_or(EngineError::NoContrastPair)?;
    let test = catalog
        .cluster_of(different)
        .cloned()
        .ok_or(EngineError::NoContrastPair)?;
    debug!(
        "generate_category_question: {}: ref {} same {} different {}",
        category, reference, same, different
    );
    contrast_question(
        catalog,
        category,
        &test,
        (reference.as_str(), same.as_str(), different.as_str()),
        rules,
        rng,
    )
}

/// The ordered cluster pairs usable for contrast questions: distinct
/// clusters, the first with at least two items.
pub fn contrast_pool(catalog: &Catalog) -> Vec<(Cluster, Cluster)> {
    let clusters = catalog.clusters();
    let mut pool: Vec<(Cluster, Cluster)> = Vec::new();
    for v in clusters.iter() {
        if catalog.members(v).len() < 2 {
            debug!("contrast_pool: cluster {} cannot be a verify cluster", v);
            continue;
        }
        for t in clusters.iter() {
            if v != t {
                pool.push(((*v).clone(), (*t).clone()));
            }
        }
    }
    pool
}

/// Draws the cluster pairs of a session: some without replacement, the
/// rest with replacement.
pub fn draw_contrast_pairs<R: Rng + ?Sized>(
    pool: &[(Cluster, Cluster)],
    rules: &GenerationRules,
    rng: &mut R,
) -> Vec<(Cluster, Cluster)> {
    if pool.is_empty() {
        return Vec::new();
    }
    let num_distinct = rules
        .distinct_contrast_pairs
        .min(pool.len())
        .min(rules.contrast_questions);
    let mut pairs: Vec<(Cluster, Cluster)> =
        pool.choose_multiple(rng, num_distinct).cloned().collect();
    while pairs.len() < rules.contrast_questions {
        if let Some(p) = pool.choose(rng) {
            pairs.push(p.clone());
        }
    }
    pairs
}

fn finish(questions: Vec<Question>, report: GenerationReport) -> Result<QuestionSet, EngineError> {
    info!(
        "generated {} of {} questions ({} contrast, {} mixed)",
        report.produced(),
        report.requested(),
        report.contrast_produced,
        report.mixed_produced
    );
    if questions.is_empty() {
        return Err(EngineError::EmptySession);
    }
    Ok(QuestionSet { questions, report })
}

fn push_mixed<R: Rng + ?Sized>(
    catalog: &Catalog,
    rules: &GenerationRules,
    rng: &mut R,
    questions: &mut Vec<Question>,
    report: &mut GenerationReport,
) {
    report.mixed_requested = rules.mixed_questions;
    for _ in 0..rules.mixed_questions {
        let res = generate_mixed_question(catalog, rules, rng);
        if let Some(q) = report.record(QuestionShape::Mixed, res) {
            questions.push(q);
        }
    }
}

/// Generates the question sequence of a brand session.
pub fn generate_brand_session<R: Rng + ?Sized>(
    catalog: &Catalog,
    rules: &GenerationRules,
    rng: &mut R,
) -> Result<QuestionSet, EngineError> {
    let mut report = GenerationReport {
        contrast_requested: rules.contrast_questions,
        ..GenerationReport::default()
    };
    let mut questions: Vec<Question> = Vec::new();

    let pool = contrast_pool(catalog);
    debug!("generate_brand_session: {} usable cluster pairs", pool.len());
    let pairs = draw_contrast_pairs(&pool, rules, rng);
    if pairs.is_empty() {
        for _ in 0..rules.contrast_questions {
            report.record(QuestionShape::Contrast, Err(EngineError::NoContrastPair));
        }
    }
    for (v, t) in pairs.iter() {
        let res = generate_cluster_question(catalog, v, t, rules, rng);
        if let Some(q) = report.record(QuestionShape::Contrast, res) {
            questions.push(q);
        }
    }

    push_mixed(catalog, rules, rng, &mut questions, &mut report);
    finish(questions, report)
}

/// Generates the question sequence of an influencer session.
///
/// Attempts on an underpopulated category are skipped and reported, so the
/// session may hold fewer questions than requested.
pub fn generate_influencer_session<R: Rng + ?Sized>(
    catalog: &Catalog,
    rules: &GenerationRules,
    rng: &mut R,
) -> Result<QuestionSet, EngineError> {
    let mut report = GenerationReport {
        contrast_requested: rules.contrast_questions,
        ..GenerationReport::default()
    };
    let mut questions: Vec<Question> = Vec::new();

    let categories = catalog.clusters();
    for _ in 0..rules.contrast_questions {
        let res = match categories.choose(rng) {
            Some(c) => generate_category_question(catalog, c, rules, rng),
            None => Err(EngineError::InsufficientItems {
                required: 3,
                available: 0,
            }),
        };
        if let Some(q) = report.record(QuestionShape::Contrast, res) {
            questions.push(q);
        }
    }

    push_mixed(catalog, rules, rng, &mut questions, &mut report);
    finish(questions, report)
}

/// Generates the question sequence matching the catalog's variant.
pub fn generate_session<R: Rng + ?Sized>(
    catalog: &Catalog,
    rules: &GenerationRules,
    rng: &mut R,
) -> Result<QuestionSet, EngineError> {
    match catalog.variant() {
        Variant::Brands => generate_brand_session(catalog, rules, rng),
        Variant::Influencers => generate_influencer_session(catalog, rules, rng),
    }
}
