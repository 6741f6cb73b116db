use clap::Parser;

/// This is a pairwise similarity survey for brands and influencers.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the survey: data sources, clusters and rules.
    /// Relative paths inside the file are resolved against its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (brands, influencers or all; default all) The survey segments to run, in this order.
    #[clap(short, long, value_parser)]
    pub segment: Option<String>,

    /// (string, optional) The identifier of the respondent session. Together with the seed,
    /// it fully determines the questions. A random identifier is used if not provided.
    #[clap(long, value_parser)]
    pub session_id: Option<String>,

    /// (integer, optional) The base random seed. Overrides the randomSeed rule of the configuration.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (directory) Where the response files are appended. Overrides the outputDirectory
    /// setting of the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the generated questions of each segment are
    /// written in JSON format to the given location. The segment name is appended to file names.
    #[clap(short, long, value_parser)]
    pub plan: Option<String>,

    /// (file path) A reference plan in JSON format. If provided, pwsurvey checks that the
    /// generated questions match the reference. Only valid with a single segment.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, only generates the questions and does not ask them.
    #[clap(long, takes_value = false)]
    pub plan_only: bool,

    /// If passed as an argument, the answers are picked at random instead of being read
    /// from the standard input.
    #[clap(long, takes_value = false)]
    pub auto: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
