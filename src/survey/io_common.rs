// Primitives shared by the readers.

use calamine::DataType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::survey::*;

/// Relative paths in the configuration are relative to the configuration file.
pub fn resolve_path(root: &Path, file_path: &str) -> PathBuf {
    let p = Path::new(file_path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        [root, p].iter().collect()
    }
}

/// Maps each requested column name to its position in the header.
pub fn get_col_index_mapping(
    req_col_names: &[&str],
    header: &[Option<String>],
    path: &str,
) -> SurveyResult<Vec<usize>> {
    let col_names: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, x)| x.as_ref().map(|s| (s.trim(), idx)))
        .collect();
    debug!("get_col_index_mapping: col_names: {:?}", col_names);

    let mut col_indexes: Vec<usize> = Vec::new();
    for cname in req_col_names {
        let idx = col_names.get(cname).context(MissingColumnSnafu {
            column: *cname,
            path,
        })?;
        col_indexes.push(*idx);
    }
    Ok(col_indexes)
}

/// Blank text is treated as a missing value.
pub fn read_cell_string(cell: Option<&DataType>) -> Option<String> {
    let s = match cell? {
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Numeric cells, or text that parses as a number. Anything else is missing.
pub fn read_cell_number(cell: Option<&DataType>) -> Option<f64> {
    match cell? {
        DataType::Float(f) => Some(*f),
        DataType::Int(i) => Some(*i as f64),
        DataType::String(s) => parse_number(s),
        _ => None,
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

pub fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(|x| x.trim())
        .filter(|x| !x.is_empty())
        .map(|x| x.to_string())
}
