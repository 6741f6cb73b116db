/*!
Question generation for pairwise similarity surveys.

A respondent sees a reference item (a brand, an influencer) and two
candidates, and picks the candidate most similar to the reference. This
crate holds everything that has algorithmic content in such a survey:

- the [`Catalog`]: the labeled population, built once from two source tables
- the sampler: weighted draws of the assets displayed for an item
- the generator: the fixed-size, reproducible question sequence of a session
- the [`SessionDriver`]: walks a [`Session`] through its questions and
  produces the [`Response`] records

Rendering, file formats and persistence are left to the caller. See the
[manual] for the details of each step.
*/
pub mod builder;
mod catalog;
mod config;
mod generator;
pub mod manual;
mod sampler;
mod session;

pub use crate::builder::CatalogBuilder;
pub use crate::catalog::{
    build_catalog, clean_resource, normalize_name, BuildReport, Catalog, CatalogCache,
    CatalogOptions, ClusterMap, ClusterSource, IntegrityIssue, IssueKind,
};
pub use crate::config::*;
pub use crate::generator::{
    contrast_pool, draw_contrast_pairs, generate_brand_session, generate_category_question,
    generate_cluster_question, generate_influencer_session, generate_mixed_question,
    generate_session, GenerationReport, QuestionSet, QuestionShape, SkippedAttempt,
};
pub use crate::sampler::{sample, sample_distinct, sample_with};
pub use crate::session::{session_seed, Session, SessionDriver, SessionId, SessionState};

/// Re-exported so that callers can seed sessions without depending on `rand` directly.
pub use rand::rngs::StdRng;
