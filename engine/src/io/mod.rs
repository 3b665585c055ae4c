//! Flat-file boundary: the catalog and traffic tables in, the audit and
//! report tables out. Malformed input rows are skipped with a warning.

pub mod catalog;
pub mod queries;
pub mod tables;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::MatcherError;

const BOM: char = '\u{feff}';

/// Header cells with a leading byte order mark removed from the first one.
fn clean_headers(headers: &csv::StringRecord) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches(BOM) } else { h };
            h.trim().to_string()
        })
        .collect()
}

fn column(headers: &[String], name: &str) -> Result<usize, MatcherError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| MatcherError::MissingColumn(name.to_string()))
}

/// Buffered writer over a freshly created file.
pub fn create(path: &Path) -> Result<BufWriter<File>, MatcherError> {
    Ok(BufWriter::new(File::create(path)?))
}

pub(crate) fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(out)
}

pub(crate) fn csv_reader<R: std::io::Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}
