//! Phase orchestration over in-memory inputs and generic writers.
//!
//! Each phase finishes before the next begins: the index is built and
//! expanded, then frozen behind a shared reference for matching and
//! detection, and only then are the problematic queries rolled up.

use std::io::Write;

use rayon::prelude::*;

use crate::{
    data::{
        index::ShingleIndex,
        records::{ProblematicQueryRecord, QueryRecord, RolledUpQueryRecord},
        traffic, MatcherError, DEFAULT_FOLD_FIELD_TYPE, DEFAULT_STEM_FIELD_TYPE,
        DEFAULT_SYNONYM_FIELD_TYPE,
    },
    detector::ProblematicQueryDetector,
    io::{catalog::Catalog, tables::AuditTables},
    lexer::matcher::{QueryMatcher, ShingleMatch},
    match_log,
    rollup::{prepare_inputs, roll_up, RepresentativePolicy},
    services::{RowExistenceOracle, TextNormalizer},
};

/// Analysis field types used by each normalization step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTypes {
    /// Index expansion and canonical rollup forms
    pub stem: String,
    /// Rollup lattices
    pub synonym: String,
    /// Traffic pre-aggregation
    pub fold: String,
}

impl Default for FieldTypes {
    fn default() -> Self {
        FieldTypes {
            stem: DEFAULT_STEM_FIELD_TYPE.to_string(),
            synonym: DEFAULT_SYNONYM_FIELD_TYPE.to_string(),
            fold: DEFAULT_FOLD_FIELD_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectReport {
    pub queries: usize,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
    pub problematic: Vec<ProblematicQueryRecord>,
}

/// Build the index from every catalog cell and expand it with normalized keys.
pub fn build_index<N>(
    catalog: &Catalog,
    normalizer: &N,
    field_types: &FieldTypes,
) -> Result<ShingleIndex, MatcherError>
where
    N: TextNormalizer + ?Sized,
{
    let mut index = ShingleIndex::from_cells(catalog.cells());
    match_log!(
        "Pipeline",
        "index",
        "built {} keys with {} entries",
        index.len(),
        index.entry_count()
    );
    index.expand_with_normalization(normalizer, &field_types.stem)?;
    Ok(index)
}

/// Match every query into the audit tables, then run the co-occurrence
/// check query by query. The first oracle failure stops the batch.
pub fn detect<O, W>(
    index: &ShingleIndex,
    oracle: &O,
    queries: &[QueryRecord],
    mut audit: AuditTables<W>,
) -> Result<DetectReport, MatcherError>
where
    O: RowExistenceOracle + ?Sized,
    W: Write,
{
    let matcher = QueryMatcher::new(index);
    let outcomes: Vec<Vec<ShingleMatch>> = queries
        .par_iter()
        .map(|query| matcher.match_query(&query.text))
        .collect();
    for (query, matches) in queries.iter().zip(outcomes.iter()) {
        audit.write_query(query, matches)?;
    }
    let (matched_rows, unmatched_rows) = audit.finish()?;

    let detector = ProblematicQueryDetector::new(index, oracle);
    let mut problematic = Vec::new();
    for query in queries {
        if let Some(record) = detector.detect(query)?.into_problematic() {
            match_log!("Pipeline", "detect", "problematic search query: {}", record.query);
            problematic.push(record);
        }
    }

    match_log!(
        "Pipeline",
        "detect",
        "{} queries, {} problematic",
        queries.len(),
        problematic.len()
    );
    Ok(DetectReport {
        queries: queries.len(),
        matched_rows,
        unmatched_rows,
        problematic,
    })
}

pub fn rollup<N>(
    records: Vec<ProblematicQueryRecord>,
    normalizer: &N,
    field_types: &FieldTypes,
    policy: RepresentativePolicy,
) -> Result<Vec<RolledUpQueryRecord>, MatcherError>
where
    N: TextNormalizer + ?Sized,
{
    let inputs = prepare_inputs(records, normalizer, &field_types.stem, &field_types.synonym)?;
    Ok(roll_up(inputs, policy))
}

pub fn aggregate<N>(
    records: Vec<QueryRecord>,
    normalizer: &N,
    field_types: &FieldTypes,
) -> Result<Vec<QueryRecord>, MatcherError>
where
    N: TextNormalizer + ?Sized,
{
    Ok(traffic::aggregate_by_normalized(records, normalizer, &field_types.fold)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_field_types() {
        let field_types = FieldTypes::default();
        assert_eq!(field_types.stem, "dig_practice_char_stem");
        assert_eq!(field_types.synonym, "dig_practice_char_syns_stem");
        assert_eq!(field_types.fold, "dig_practice_char");
    }
}
