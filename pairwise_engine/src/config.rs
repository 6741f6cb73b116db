// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A label partitioning the items into groups presumed to be similar.
///
/// Brands use a fixed numbered map, influencers use the category found
/// in the dataset.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum Cluster {
    Numbered(u32),
    Named(String),
}

impl Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cluster::Numbered(n) => write!(f, "{}", n),
            Cluster::Named(s) => write!(f, "{}", s),
        }
    }
}

/// One row of the metric table (prices for brands, follower counts for influencers).
///
/// Rows are taken as read: missing or unparseable values are `None` and
/// the catalog decides what to do with them.
#[derive(PartialEq, Debug, Clone)]
pub struct MetricRow {
    pub name: String,
    pub metric: Option<f64>,
    /// Only used when the clusters come from the data itself.
    pub category: Option<String>,
}

/// One row of the asset table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AssetRow {
    pub name: String,
    pub resource: Option<String>,
    pub sub_category: Option<String>,
    pub caption: Option<String>,
}

/// A renderable resource with its sampling weight.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DisplayAsset {
    pub resource: String,
    /// Frequency of the asset's sub-category within the item's pool. Always >= 1.
    pub weight: u32,
    pub caption: Option<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Item {
    /// Display name.
    pub name: String,
    /// Unmapped items (brands only) have no cluster and are never selected.
    pub cluster: Option<Cluster>,
    pub metric: f64,
    /// Never empty for an item stored in a catalog.
    pub assets: Vec<DisplayAsset>,
}

/// Which dataset a catalog or session is about.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Variant {
    Brands,
    Influencers,
}

impl Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Brands => write!(f, "brands"),
            Variant::Influencers => write!(f, "influencers"),
        }
    }
}

// ******** Output data structures *********

/// The left or right option of a question.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// A single displayed asset, as frozen in a question.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AssetView {
    pub resource: String,
    pub caption: Option<String>,
}

/// The prepared display payload of one item inside a question.
#[derive(PartialEq, Debug, Clone)]
pub struct ItemView {
    pub name: String,
    pub cluster: Option<Cluster>,
    pub metric: f64,
    pub assets: Vec<AssetView>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum QuestionKind {
    /// Reference and one option come from `verify`, the other option from `test`.
    /// `same` is the side holding the option from `verify`.
    Contrast {
        verify: Cluster,
        test: Cluster,
        same: Side,
    },
    /// Three items from (preferably) three different clusters.
    Mixed,
}

/// One comparison unit. Immutable once generated.
#[derive(PartialEq, Debug, Clone)]
pub struct Question {
    pub kind: QuestionKind,
    pub reference: ItemView,
    pub option_a: ItemView,
    pub option_b: ItemView,
}

impl Question {
    pub fn option(&self, side: Side) -> &ItemView {
        match side {
            Side::A => &self.option_a,
            Side::B => &self.option_b,
        }
    }
}

/// The record appended after each respondent action.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Response {
    /// 1-based.
    pub question_number: u32,
    pub reference: String,
    pub selected: String,
    pub other: String,
}

/// Errors that prevent the engine from completing an operation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum EngineError {
    /// A cluster lacks enough distinct items to build a question.
    InsufficientPopulation {
        cluster: Cluster,
        required: usize,
        available: usize,
    },
    /// A contrast question needs two different clusters.
    InvalidClusterPair { cluster: Cluster },
    /// Fewer selectable items than a question needs.
    InsufficientItems { required: usize, available: usize },
    /// No ordered pair of clusters can produce a contrast question.
    NoContrastPair,
    EmptyAssetPool { name: String },
    /// Generation could not produce a single question.
    EmptySession,
    /// A question was requested past the end of the sequence.
    SequenceExhausted { index: usize, length: usize },
}

impl Error for EngineError {}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InsufficientPopulation {
                cluster,
                required,
                available,
            } => write!(
                f,
                "cluster {} has {} usable items, {} required",
                cluster, available, required
            ),
            EngineError::InvalidClusterPair { cluster } => {
                write!(f, "cannot contrast cluster {} with itself", cluster)
            }
            EngineError::InsufficientItems {
                required,
                available,
            } => write!(f, "{} selectable items, {} required", available, required),
            EngineError::NoContrastPair => write!(f, "no cluster pair can be contrasted"),
            EngineError::EmptyAssetPool { name } => write!(f, "item {} has no assets", name),
            EngineError::EmptySession => write!(f, "no question could be generated"),
            EngineError::SequenceExhausted { index, length } => write!(
                f,
                "question {} requested but the session has {} questions",
                index + 1,
                length
            ),
        }
    }
}

// ********* Configuration **********

/// How the display assets of an item are drawn.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SamplingMode {
    /// Weighted choice with replacement: always exactly `k` assets, duplicates possible.
    WithReplacement,
    /// Weighted choice without replacement: `min(k, pool size)` distinct assets.
    Distinct,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GenerationRules {
    /// Number of contrast questions attempted per session.
    pub contrast_questions: usize,
    /// How many of the contrast cluster pairs are drawn without replacement
    /// (brands only). The rest are drawn with replacement.
    pub distinct_contrast_pairs: usize,
    pub mixed_questions: usize,
    /// Number of assets drawn for each item of a question.
    pub assets_per_item: usize,
    pub sampling: SamplingMode,
}

impl GenerationRules {
    pub const BRAND_RULES: GenerationRules = GenerationRules {
        contrast_questions: 20,
        distinct_contrast_pairs: 4,
        mixed_questions: 10,
        assets_per_item: 6,
        sampling: SamplingMode::WithReplacement,
    };

    pub const INFLUENCER_RULES: GenerationRules = GenerationRules {
        contrast_questions: 20,
        distinct_contrast_pairs: 0,
        mixed_questions: 10,
        assets_per_item: 3,
        sampling: SamplingMode::WithReplacement,
    };

    pub fn for_variant(variant: Variant) -> GenerationRules {
        match variant {
            Variant::Brands => GenerationRules::BRAND_RULES,
            Variant::Influencers => GenerationRules::INFLUENCER_RULES,
        }
    }

    /// The full length of a session when no attempt is skipped.
    pub fn session_length(&self) -> usize {
        self.contrast_questions + self.mixed_questions
    }
}
