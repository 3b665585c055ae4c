use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{
    data::{entry::EntityType, MatcherError},
    io::{clean_headers, csv_reader},
    match_log, match_warn,
};

/// A headed table whose columns are entity types.
///
/// Read from the entity table, each column is an independent list of distinct
/// values and rows carry no meaning; only [`Catalog::cells`] applies. Read from
/// the item-level catalog, each row is one catalog item and
/// [`Catalog::cell`] answers what that item carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    headers: Vec<EntityType>,
    rows: Vec<Vec<String>>,
}

impl Catalog {
    pub fn from_path(path: &Path) -> Result<Catalog, MatcherError> {
        Catalog::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Catalog, MatcherError> {
        let mut reader = csv_reader(input);
        let headers: Vec<EntityType> = clean_headers(reader.headers()?)
            .into_iter()
            .map(EntityType::new)
            .collect();

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    match_warn!("Catalog", "read", "skipping row {}: {}", line + 2, err);
                    continue;
                }
            };
            if record.len() != headers.len() {
                match_warn!(
                    "Catalog",
                    "read",
                    "skipping row {}: {} fields, expected {}",
                    line + 2,
                    record.len(),
                    headers.len()
                );
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        match_log!(
            "Catalog",
            "read",
            "{} entity types, {} rows",
            headers.len(),
            rows.len()
        );
        Ok(Catalog { headers, rows })
    }

    pub fn headers(&self) -> &[EntityType] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Non-blank cells as `(entity type, trimmed value)`, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (&EntityType, &str)> {
        self.rows.iter().flat_map(move |row| {
            self.headers
                .iter()
                .zip(row.iter())
                .map(|(entity_type, value)| (entity_type, value.trim()))
                .filter(|(_, value)| !value.is_empty())
        })
    }

    /// Cell of `row` under `entity_type`, if that column exists.
    pub fn cell(&self, row: usize, entity_type: &EntityType) -> Option<&str> {
        let column = self.headers.iter().position(|h| h == entity_type)?;
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}
