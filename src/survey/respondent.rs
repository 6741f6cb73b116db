// Who answers the questions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{BufRead, Write};

use pairwise_engine::{ItemView, Question, Side, Variant};

use crate::survey::*;

pub trait Respondent {
    /// `number` is 1-based.
    fn choose(
        &mut self,
        variant: Variant,
        number: usize,
        total: usize,
        question: &Question,
    ) -> SurveyResult<Side>;
}

/// 1234567 -> "1,234,567"
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut res = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}

fn format_metric(variant: Variant, metric: f64) -> String {
    match variant {
        Variant::Brands => format!("${:.0}", metric),
        Variant::Influencers => format!("{} followers", format_thousands(metric.max(0.0) as u64)),
    }
}

fn render_item(out: &mut String, label: &str, variant: Variant, item: &ItemView) {
    out.push_str(&format!(
        "{}: {} ({})\n",
        label,
        item.name,
        format_metric(variant, item.metric)
    ));
    for a in item.assets.iter() {
        match &a.caption {
            Some(c) => out.push_str(&format!("    {}  \"{}\"\n", a.resource, c)),
            None => out.push_str(&format!("    {}\n", a.resource)),
        }
    }
}

/// The text shown for one question.
pub fn render_question(variant: Variant, number: usize, total: usize, question: &Question) -> String {
    let noun = match variant {
        Variant::Brands => "brand",
        Variant::Influencers => "influencer",
    };
    let mut out = format!("Question {} of {}\n", number, total);
    render_item(&mut out, "Reference", variant, &question.reference);
    render_item(&mut out, "a", variant, &question.option_a);
    render_item(&mut out, "b", variant, &question.option_b);
    out.push_str(&format!(
        "Which {} is most similar to {}? [a/b] ",
        noun, question.reference.name
    ));
    out
}

pub fn parse_answer(s: &str) -> Option<Side> {
    match s.trim().to_lowercase().as_str() {
        "a" => Some(Side::A),
        "b" => Some(Side::B),
        _ => None,
    }
}

/// Reads the answers line by line, asking again until the answer is a or b.
pub struct ConsoleRespondent<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleRespondent<R, W> {
    pub fn new(input: R, output: W) -> ConsoleRespondent<R, W> {
        ConsoleRespondent { input, output }
    }
}

impl<R: BufRead, W: Write> Respondent for ConsoleRespondent<R, W> {
    fn choose(
        &mut self,
        variant: Variant,
        number: usize,
        total: usize,
        question: &Question,
    ) -> SurveyResult<Side> {
        let text = render_question(variant, number, total, question);
        write!(self.output, "\n{}", text).context(ReadingAnswerSnafu {})?;
        loop {
            self.output.flush().context(ReadingAnswerSnafu {})?;
            let mut line = String::new();
            let n = self
                .input
                .read_line(&mut line)
                .context(ReadingAnswerSnafu {})?;
            if n == 0 {
                whatever!("Input closed before question {} was answered", number);
            }
            if let Some(side) = parse_answer(&line) {
                return Ok(side);
            }
            write!(self.output, "Please answer a or b: ").context(ReadingAnswerSnafu {})?;
        }
    }
}

/// Picks a side uniformly at random.
pub struct RandomRespondent {
    rng: StdRng,
}

impl RandomRespondent {
    pub fn new(seed: u64) -> RandomRespondent {
        RandomRespondent {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Respondent for RandomRespondent {
    fn choose(
        &mut self,
        _variant: Variant,
        number: usize,
        _total: usize,
        _question: &Question,
    ) -> SurveyResult<Side> {
        let side = if self.rng.gen::<bool>() { Side::A } else { Side::B };
        debug!("RandomRespondent: question {}: {:?}", number, side);
        Ok(side)
    }
}
