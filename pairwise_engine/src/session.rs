use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use std::fmt::Display;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::*;
use crate::generator::{generate_session, GenerationReport};

/// Identifies one respondent session.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct SessionId(pub String);

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> SessionId {
        SessionId(s.to_string())
    }
}

/// A stable seed for a session, derived from the base seed and the session id.
///
/// Uses a cryptographic digest so that close identifiers give unrelated seeds.
pub fn session_seed(base_seed: u64, id: &SessionId) -> u64 {
    let digest = sha256::digest(format!("{:020}{}", base_seed, id.0));
    u64::from_str_radix(&digest[..16], 16).unwrap_or(base_seed)
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Complete,
}

/// The state of one respondent's pass through a question sequence.
///
/// Owned by the caller and handed to the `SessionDriver` for every
/// operation. Not meant for concurrent mutation.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    rng: StdRng,
    state: SessionState,
    questions: Vec<Question>,
    report: Option<GenerationReport>,
    index: usize,
    responses: Vec<Response>,
}

impl Session {
    pub fn new(id: SessionId, base_seed: u64) -> Session {
        let seed = session_seed(base_seed, &id);
        debug!("Session::new: {} seed {}", id, seed);
        Session::with_rng(id, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(id: SessionId, rng: StdRng) -> Session {
        Session {
            id,
            rng,
            state: SessionState::NotStarted,
            questions: Vec::new(),
            report: None,
            index: 0,
            responses: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// 0-based index of the current question.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn report(&self) -> Option<&GenerationReport> {
        self.report.as_ref()
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }
}

/// Drives sessions over a shared catalog.
///
/// ```
/// use std::sync::Arc;
/// use pairwise_engine::*;
///
/// let (catalog, _) = CatalogBuilder::new(Variant::Brands)
///     .cluster_map(ClusterMap::from_pairs(vec![
///         ("GUCCI", Cluster::Numbered(1)),
///         ("TOM FORD", Cluster::Numbered(1)),
///         ("NIKE", Cluster::Numbered(2)),
///         ("ADIDAS", Cluster::Numbered(2)),
///     ]))
///     .add_metric("GUCCI", Some(950.0))
///     .add_metric("TOM FORD", Some(1200.0))
///     .add_metric("NIKE", Some(80.0))
///     .add_metric("ADIDAS", Some(70.0))
///     .add_asset("GUCCI", Some("gucci.jpg"), Some("bags"))
///     .add_asset("TOM FORD", Some("tomford.jpg"), Some("suits"))
///     .add_asset("NIKE", Some("nike.jpg"), Some("shoes"))
///     .add_asset("ADIDAS", Some("adidas.jpg"), Some("shoes"))
///     .build();
///
/// let driver = SessionDriver::new(Arc::new(catalog), GenerationRules::BRAND_RULES);
/// let mut session = Session::new(SessionId::from("respondent-1"), 42);
/// while !driver.is_complete(&session) {
///     driver.record_choice(&mut session, Side::A)?;
/// }
/// assert_eq!(session.responses().len(), 30);
/// # Ok::<(), EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SessionDriver {
    catalog: Arc<Catalog>,
    rules: GenerationRules,
}

impl SessionDriver {
    pub fn new(catalog: Arc<Catalog>, rules: GenerationRules) -> SessionDriver {
        SessionDriver { catalog, rules }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &GenerationRules {
        &self.rules
    }

    /// Generates the question sequence if the session has not started yet.
    pub fn start(&self, session: &mut Session) -> Result<(), EngineError> {
        if session.state != SessionState::NotStarted {
            return Ok(());
        }
        let set = generate_session(&self.catalog, &self.rules, &mut session.rng)?;
        info!(
            "session {}: starting with {} questions",
            session.id,
            set.questions.len()
        );
        session.questions = set.questions;
        session.report = Some(set.report);
        session.index = 0;
        session.state = SessionState::InProgress;
        Ok(())
    }

    /// The question to display, starting the session on first access.
    pub fn current_question<'s>(&self, session: &'s mut Session) -> Result<&'s Question, EngineError> {
        self.start(session)?;
        session
            .questions
            .get(session.index)
            .ok_or(EngineError::SequenceExhausted {
                index: session.index,
                length: session.questions.len(),
            })
    }

    /// Records the respondent's pick for the current question and moves on.
    pub fn record_choice(&self, session: &mut Session, selected: Side) -> Result<Response, EngineError> {
        self.start(session)?;
        let question = session
            .questions
            .get(session.index)
            .ok_or(EngineError::SequenceExhausted {
                index: session.index,
                length: session.questions.len(),
            })?;
        let response = Response {
            question_number: (session.index + 1) as u32,
            reference: question.reference.name.clone(),
            selected: question.option(selected).name.clone(),
            other: question.option(selected.other()).name.clone(),
        };
        debug!("session {}: {:?}", session.id, response);
        session.responses.push(response.clone());
        session.index += 1;
        if session.index >= session.questions.len() {
            info!(
                "session {}: complete after {} responses",
                session.id,
                session.responses.len()
            );
            session.state = SessionState::Complete;
        }
        Ok(response)
    }

    pub fn is_complete(&self, session: &Session) -> bool {
        session.is_complete()
    }
}
