// Where the responses go.

use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use pairwise_engine::{Response, Variant};

use crate::survey::*;

pub trait ResponseSink {
    fn append(&mut self, response: &Response) -> SurveyResult<()>;
    fn flush(&mut self) -> SurveyResult<()>;
}

#[derive(Debug, Serialize)]
struct ResponseRecord<'a> {
    question: u32,
    reference: &'a str,
    selected: &'a str,
    other: &'a str,
}

/// `<output directory>/<survey name>_<segment>_responses.csv`
pub fn sink_path(out_dir: &Path, survey_name: &str, variant: Variant) -> PathBuf {
    out_dir.join(format!("{}_{}_responses.csv", survey_name, variant))
}

/// Appends responses to a CSV file, one line per response.
///
/// The header is written only when the file is new or empty.
pub struct CsvSink {
    path: String,
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn open(path: &Path) -> SurveyResult<CsvSink> {
        let p = path.display().to_string();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context(FileAccessSnafu { path: p.clone() })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(FileAccessSnafu { path: p.clone() })?;
        let len = file
            .metadata()
            .context(FileAccessSnafu { path: p.clone() })?
            .len();
        info!("Appending responses to {}", p);
        let writer = csv::WriterBuilder::new()
            .has_headers(len == 0)
            .from_writer(file);
        Ok(CsvSink { path: p, writer })
    }
}

impl ResponseSink for CsvSink {
    fn append(&mut self, response: &Response) -> SurveyResult<()> {
        self.writer
            .serialize(ResponseRecord {
                question: response.question_number,
                reference: &response.reference,
                selected: &response.selected,
                other: &response.other,
            })
            .context(CsvWriteSnafu {
                path: self.path.clone(),
            })
    }

    fn flush(&mut self) -> SurveyResult<()> {
        self.writer.flush().context(FileAccessSnafu {
            path: self.path.clone(),
        })
    }
}

/// Keeps the responses in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub responses: Vec<Response>,
}

impl ResponseSink for MemorySink {
    fn append(&mut self, response: &Response) -> SurveyResult<()> {
        self.responses.push(response.clone());
        Ok(())
    }

    fn flush(&mut self) -> SurveyResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(n: u32) -> Response {
        Response {
            question_number: n,
            reference: "GUCCI".to_string(),
            selected: "TOM FORD".to_string(),
            other: "RAG & BONE".to_string(),
        }
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = sink_path(&dir.path().join("out"), "pilot", Variant::Brands);
        assert!(path.ends_with("pilot_brands_responses.csv"));
        {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.append(&response(1)).unwrap();
            sink.flush().unwrap();
        }
        {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.append(&response(2)).unwrap();
            sink.flush().unwrap();
        }
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "question,reference,selected,other\n\
             1,GUCCI,TOM FORD,RAG & BONE\n\
             2,GUCCI,TOM FORD,RAG & BONE\n"
        );
    }

    #[test]
    fn memory() {
        let mut sink = MemorySink::default();
        sink.append(&response(1)).unwrap();
        assert_eq!(sink.responses, vec![response(1)]);
    }
}
