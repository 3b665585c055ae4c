use thiserror::Error;

use crate::services::ServiceError;

pub static DEFAULT_SOLR_URL: &str = "http://localhost:8983/solr";
pub static DEFAULT_CORE: &str = "catalog_core";

/// Field type whose analysis chain stems single tokens (index expansion, canonical forms).
pub static DEFAULT_STEM_FIELD_TYPE: &str = "dig_practice_char_stem";
/// Field type that adds synonym expansion on top of stemming (rollup lattices).
pub static DEFAULT_SYNONYM_FIELD_TYPE: &str = "dig_practice_char_syns_stem";
/// Field type that only folds characters (traffic pre-aggregation).
pub static DEFAULT_FOLD_FIELD_TYPE: &str = "dig_practice_char";
/// Suffix appended to an entity type to name its catalog field.
pub static DEFAULT_FIELD_SUFFIX: &str = "_t";

pub static ENV_VAR_SOLR_URL: &str = "SHINGLEMATCH_SOLR_URL";
pub static ENV_VAR_CORE: &str = "SHINGLEMATCH_CORE";
pub static ENV_VAR_API_KEY: &str = "SHINGLEMATCH_API_KEY";
pub static ENV_VAR_STEM_FIELD_TYPE: &str = "SHINGLEMATCH_STEM_FIELD_TYPE";
pub static ENV_VAR_SYNONYM_FIELD_TYPE: &str = "SHINGLEMATCH_SYNONYM_FIELD_TYPE";
pub static ENV_VAR_FOLD_FIELD_TYPE: &str = "SHINGLEMATCH_FOLD_FIELD_TYPE";
pub static ENV_VAR_FIELD_SUFFIX: &str = "SHINGLEMATCH_FIELD_SUFFIX";
pub static ENV_VAR_LOG: &str = "SHINGLEMATCH_LOG";

/// Separator used when a set of names is flattened into one table cell.
pub const LIST_SEPARATOR: &str = "/";

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Required column '{0}' is missing from the header row")]
    MissingColumn(String),
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("External service error: {0}")]
    Service(#[from] ServiceError),
}

/// A single cell that could not be parsed; the row carrying it is skipped.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Visits value '{0}' is not a non-negative integer")]
    InvalidVisits(String),
    #[error("Revenue value '{0}' is not a non-negative amount")]
    InvalidRevenue(String),
}

pub mod entry;
pub mod index;
pub mod records;
pub mod traffic;
