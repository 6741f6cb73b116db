use log::{debug, info, warn};

use pairwise_engine::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::config_reader::*;
use crate::survey::io_sink::{sink_path, CsvSink, ResponseSink};
use crate::survey::respondent::{ConsoleRespondent, RandomRespondent, Respondent};

pub mod clusters;
pub mod config_reader;
pub mod io_brands;
mod io_common;
pub mod io_influencers;
pub mod io_sink;
pub mod respondent;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Empty worksheet {name}"))]
    EmptyExcel { name: String },
    #[snafu(display("Column {column} not found in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing responses to {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error accessing {path}"))]
    FileAccess {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading the answer of the respondent"))]
    ReadingAnswer { source: std::io::Error },
    #[snafu(display("Missing parent directory"))]
    MissingParentDir {},
    #[snafu(display("{segment} survey: {source}"))]
    Engine {
        source: EngineError,
        segment: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// The parts of the survey, run one after the other.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Segment {
    Brands,
    Influencers,
}

impl Segment {
    pub fn variant(self) -> Variant {
        match self {
            Segment::Brands => Variant::Brands,
            Segment::Influencers => Variant::Influencers,
        }
    }
}

fn parse_segments(s: &Option<String>) -> SurveyResult<Vec<Segment>> {
    match s.as_deref() {
        None | Some("all") => Ok(vec![Segment::Brands, Segment::Influencers]),
        Some("brands") => Ok(vec![Segment::Brands]),
        Some("influencers") => Ok(vec![Segment::Influencers]),
        Some(x) => whatever!(
            "Unknown segment {:?}: expected brands, influencers or all",
            x
        ),
    }
}

/// Holds the catalogs of the run. Each one is read from disk at most once.
pub struct SurveyData {
    config: SurveyConfig,
    root: PathBuf,
    brands: CatalogCache,
    influencers: CatalogCache,
}

impl SurveyData {
    pub fn new(config: SurveyConfig, root: &Path) -> SurveyData {
        SurveyData {
            config,
            root: root.to_path_buf(),
            brands: CatalogCache::new(),
            influencers: CatalogCache::new(),
        }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn catalog(&mut self, segment: Segment) -> SurveyResult<Arc<Catalog>> {
        let config = &self.config;
        let root = self.root.as_path();
        match segment {
            Segment::Brands => self
                .brands
                .get_or_try_build(|| build_brand_catalog(config, root)),
            Segment::Influencers => self
                .influencers
                .get_or_try_build(|| build_influencer_catalog(config, root)),
        }
    }
}

fn log_report(variant: Variant, catalog: &Catalog, report: &BuildReport) {
    for issue in report.issues.iter() {
        if issue.excludes_item() {
            warn!("{}: excluding {}: {:?}", variant, issue.name, issue.kind);
        } else {
            debug!("{}: {}: {:?}", variant, issue.name, issue.kind);
        }
    }
    if report.dropped_asset_rows > 0 {
        info!(
            "{}: dropped {} asset rows without a usable resource",
            variant, report.dropped_asset_rows
        );
    }
    info!(
        "{}: {} items in {} clusters",
        variant,
        catalog.len(),
        catalog.clusters().len()
    );
}

fn build_brand_catalog(config: &SurveyConfig, root: &Path) -> SurveyResult<Catalog> {
    let source = match &config.brand_source {
        Some(s) => s,
        None => whatever!("No brandSource in the configuration"),
    };
    let (metrics, assets) = io_brands::read_brand_rows(root, source)?;
    let (catalog, report) = CatalogBuilder::new(Variant::Brands)
        .cluster_map(config.cluster_map())
        .extend_metrics(metrics)
        .extend_assets(assets)
        .build();
    log_report(Variant::Brands, &catalog, &report);
    Ok(catalog)
}

fn build_influencer_catalog(config: &SurveyConfig, root: &Path) -> SurveyResult<Catalog> {
    let source = match &config.influencer_source {
        Some(s) => s,
        None => whatever!("No influencerSource in the configuration"),
    };
    let (metrics, assets) = io_influencers::read_influencer_rows(root, source)?;
    let (catalog, report) = CatalogBuilder::new(Variant::Influencers)
        .extend_metrics(metrics)
        .extend_assets(assets)
        .build();
    log_report(Variant::Influencers, &catalog, &report);
    Ok(catalog)
}

fn side_to_json(side: Side) -> JSValue {
    match side {
        Side::A => json!("a"),
        Side::B => json!("b"),
    }
}

fn item_to_json(item: &ItemView) -> JSValue {
    let assets: Vec<JSValue> = item
        .assets
        .iter()
        .map(|a| json!({"resource": a.resource, "caption": a.caption}))
        .collect();
    json!({
        "name": item.name,
        "cluster": item.cluster.as_ref().map(|c| c.to_string()),
        "metric": item.metric,
        "assets": assets,
    })
}

/// The generated questions of a session, with the generation report.
pub fn plan_to_json(session: &Session, variant: Variant) -> JSValue {
    let questions: Vec<JSValue> = session
        .questions()
        .iter()
        .enumerate()
        .map(|(idx, q)| {
            let kind = match &q.kind {
                QuestionKind::Contrast { verify, test, same } => json!({
                    "type": "contrast",
                    "verify": verify.to_string(),
                    "test": test.to_string(),
                    "same": side_to_json(*same),
                }),
                QuestionKind::Mixed => json!({"type": "mixed"}),
            };
            json!({
                "question": idx + 1,
                "kind": kind,
                "reference": item_to_json(&q.reference),
                "a": item_to_json(&q.option_a),
                "b": item_to_json(&q.option_b),
            })
        })
        .collect();
    let report = match session.report() {
        Some(r) => {
            let skipped: Vec<JSValue> = r
                .skipped
                .iter()
                .map(|s| json!({"shape": format!("{:?}", s.shape), "reason": s.reason.to_string()}))
                .collect();
            json!({
                "contrastRequested": r.contrast_requested,
                "contrastProduced": r.contrast_produced,
                "mixedRequested": r.mixed_requested,
                "mixedProduced": r.mixed_produced,
                "skipped": skipped,
            })
        }
        None => JSValue::Null,
    };
    json!({
        "segment": variant.to_string(),
        "session": session.id().to_string(),
        "questions": questions,
        "report": report,
    })
}

fn write_plan(plan: &str, dest: &str, variant: Variant) -> SurveyResult<()> {
    match dest {
        "stdout" => {
            println!("{}", plan);
        }
        "" => {}
        x => {
            let p = format!("{}_{}.json", x.trim_end_matches(".json"), variant);
            info!("Writing questions to {}", p);
            fs::write(&p, plan).context(FileAccessSnafu { path: p.clone() })?;
        }
    }
    Ok(())
}

/// Compares a pretty-printed plan with a reference file, printing the differences.
pub fn check_reference(plan: &str, reference_path: &str) -> SurveyResult<()> {
    let contents = fs::read_to_string(reference_path).context(OpeningJsonSnafu {
        path: reference_path.to_string(),
    })?;
    let reference: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_reference != plan {
        warn!("Found differences with the reference plan");
        print_diff(pretty_reference.as_str(), plan, "\n");
        whatever!("Difference detected between generated questions and reference plan")
    }
    Ok(())
}

/// Asks every question of the session and hands each response to the sink.
///
/// Returns the number of responses recorded during this call.
pub fn run_segment(
    driver: &SessionDriver,
    session: &mut Session,
    respondent: &mut dyn Respondent,
    sink: &mut dyn ResponseSink,
) -> SurveyResult<usize> {
    let variant = driver.catalog().variant();
    let segment = variant.to_string();
    driver.start(session).context(EngineSnafu {
        segment: segment.clone(),
    })?;
    let total = session.len();
    let mut count = 0;
    while !driver.is_complete(session) {
        let number = session.index() + 1;
        let question = driver
            .current_question(session)
            .context(EngineSnafu {
                segment: segment.clone(),
            })?
            .clone();
        let side = respondent.choose(variant, number, total, &question)?;
        let response = driver.record_choice(session, side).context(EngineSnafu {
            segment: segment.clone(),
        })?;
        sink.append(&response)?;
        count += 1;
    }
    sink.flush()?;
    info!("{}: recorded {} responses", segment, count);
    Ok(count)
}

fn base_seed(args: &Args, config: &SurveyConfig) -> SurveyResult<u64> {
    if let Some(s) = args.seed {
        return Ok(s);
    }
    if let Some(s) = config.rules().random_seed()? {
        return Ok(s);
    }
    let s: u64 = rand::random();
    info!("No seed provided, using {}", s);
    Ok(s)
}

pub fn run_survey(args: &Args) -> SurveyResult<()> {
    let config_path = match &args.config {
        Some(p) => p.clone(),
        None => whatever!("A configuration file must be provided with --config"),
    };
    let segments = parse_segments(&args.segment)?;
    if args.reference.is_some() && segments.len() != 1 {
        whatever!("--reference requires a single --segment");
    }

    let config = read_config(&config_path)?;
    let root = Path::new(config_path.as_str())
        .parent()
        .context(MissingParentDirSnafu {})?;
    let seed = base_seed(args, &config)?;
    let session_id = match &args.session_id {
        Some(id) => SessionId(id.clone()),
        None => SessionId(format!("{:016x}", rand::random::<u64>())),
    };
    info!("session {} with base seed {}", session_id, seed);

    let out_dir = match (&args.out, &config.output_settings.output_directory) {
        (Some(o), _) => PathBuf::from(o),
        (None, Some(o)) => io_common::resolve_path(root, o),
        (None, None) => root.to_path_buf(),
    };

    let mut data = SurveyData::new(config, root);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    for segment in segments {
        let variant = segment.variant();
        let catalog = data.catalog(segment)?;
        let rules = data.config().rules().generation_rules(variant);
        let driver = SessionDriver::new(catalog, rules);
        let mut session = Session::new(session_id.clone(), seed);
        driver.start(&mut session).context(EngineSnafu {
            segment: variant.to_string(),
        })?;

        if args.plan.is_some() || args.reference.is_some() {
            let plan_js = plan_to_json(&session, variant);
            let pretty_plan = serde_json::to_string_pretty(&plan_js).context(ParsingJsonSnafu {})?;
            if let Some(dest) = &args.plan {
                write_plan(&pretty_plan, dest, variant)?;
            }
            if let Some(reference) = &args.reference {
                check_reference(&pretty_plan, reference)?;
            }
        }

        if args.plan_only {
            continue;
        }

        let path = sink_path(
            &out_dir,
            &data.config().output_settings.survey_name,
            variant,
        );
        let mut sink = CsvSink::open(&path)?;
        if args.auto {
            let mut respondent = RandomRespondent::new(session_seed(seed, &session_id) ^ 1);
            run_segment(&driver, &mut session, &mut respondent, &mut sink)?;
        } else {
            let mut respondent = ConsoleRespondent::new(stdin.lock(), stdout.lock());
            run_segment(&driver, &mut session, &mut respondent, &mut sink)?;
            println!("Thank you, the {} part is complete.", variant);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::io_sink::MemorySink;

    fn write_influencers(dir: &Path) -> String {
        let p = dir.join("influencers.csv");
        let mut content =
            String::from("influencer_name,Category,Followers,caption,Image_file_name\n");
        for (cat, names) in [("Fashion", ["ann", "bea", "cid"]), ("Sport", ["dan", "eve", "fay"])] {
            for (i, name) in names.iter().enumerate() {
                for post in 0..3 {
                    content.push_str(&format!(
                        "{},{},{},post {} of {},'{}_{}.jpg'\n",
                        name,
                        cat,
                        1000 * (i + 1),
                        post,
                        name,
                        name,
                        post
                    ));
                }
            }
        }
        fs::write(&p, content).unwrap();
        p.display().to_string()
    }

    fn write_config(dir: &Path) -> String {
        let p = dir.join("survey.json");
        let js = json!({
            "outputSettings": {"surveyName": "test", "outputDirectory": "out"},
            "influencerSource": {
                "filePath": "influencers.csv",
                "imageUrlPrefix": "https://img.example/",
            },
            "rules": {"randomSeed": "12"},
        });
        fs::write(&p, serde_json::to_string_pretty(&js).unwrap()).unwrap();
        p.display().to_string()
    }

    fn args(config: &str) -> Args {
        Args {
            config: Some(config.to_string()),
            segment: Some("influencers".to_string()),
            session_id: Some("respondent-1".to_string()),
            seed: None,
            out: None,
            plan: None,
            reference: None,
            plan_only: false,
            auto: true,
            verbose: false,
        }
    }

    #[test]
    fn segments() {
        assert_eq!(parse_segments(&None).unwrap().len(), 2);
        assert_eq!(
            parse_segments(&Some("brands".to_string())).unwrap(),
            vec![Segment::Brands]
        );
        assert!(parse_segments(&Some("cars".to_string())).is_err());
    }

    #[test]
    fn influencer_segment_runs_to_completion() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        write_influencers(dir.path());
        let config_path = write_config(dir.path());
        let config = read_config(&config_path).unwrap();
        let mut data = SurveyData::new(config, dir.path());
        let catalog = data.catalog(Segment::Influencers).unwrap();
        assert_eq!(catalog.len(), 6);
        // Memoized.
        assert!(Arc::ptr_eq(
            &catalog,
            &data.catalog(Segment::Influencers).unwrap()
        ));

        let driver = SessionDriver::new(catalog, GenerationRules::INFLUENCER_RULES);
        let mut session = Session::new(SessionId::from("r"), 3);
        let mut respondent = RandomRespondent::new(5);
        let mut sink = MemorySink::default();
        let n = run_segment(&driver, &mut session, &mut respondent, &mut sink).unwrap();
        assert_eq!(n, session.len());
        assert_eq!(sink.responses.len(), n);
        assert!(driver.is_complete(&session));
        for q in session.questions() {
            assert!(q.reference.assets[0]
                .resource
                .starts_with("https://img.example/"));
        }
    }

    #[test]
    fn run_survey_appends_responses() {
        let dir = tempfile::tempdir().unwrap();
        write_influencers(dir.path());
        let config_path = write_config(dir.path());
        let a = args(&config_path);
        run_survey(&a).unwrap();
        run_survey(&a).unwrap();
        let out = dir.path().join("out").join("test_influencers_responses.csv");
        let content = fs::read_to_string(out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "question,reference,selected,other");
        assert_eq!(lines.iter().filter(|l| l.starts_with("question")).count(), 1);
        assert_eq!((lines.len() - 1) % 2, 0);
    }

    #[test]
    fn plan_matches_its_reference() {
        let dir = tempfile::tempdir().unwrap();
        write_influencers(dir.path());
        let config_path = write_config(dir.path());
        let plan_base = dir.path().join("plan").display().to_string();

        let mut a = args(&config_path);
        a.plan = Some(plan_base.clone());
        a.plan_only = true;
        run_survey(&a).unwrap();
        let plan_path = format!("{}_influencers.json", plan_base);
        let plan: JSValue = serde_json::from_str(&fs::read_to_string(&plan_path).unwrap()).unwrap();
        assert_eq!(plan["segment"], json!("influencers"));
        assert_eq!(plan["session"], json!("respondent-1"));

        let mut b = args(&config_path);
        b.reference = Some(plan_path.clone());
        b.plan_only = true;
        assert!(run_survey(&b).is_ok());

        b.session_id = Some("respondent-2".to_string());
        assert!(run_survey(&b).is_err());
    }
}
