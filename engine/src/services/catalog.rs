use crate::{
    io::catalog::Catalog,
    services::{Clause, RowCondition, RowExistenceOracle, ServiceError},
};

/// Oracle answered from the item-level catalog, for runs without a search
/// engine. Every row must be one catalog item; the entity table does not
/// qualify since its columns are deduplicated independently. A clause holds on
/// a row when the row's cell for the clause's entity type contains the value
/// as a whole-word phrase, ignoring case.
pub struct CatalogRowOracle<'a> {
    catalog: &'a Catalog,
}

impl<'a> CatalogRowOracle<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        CatalogRowOracle { catalog }
    }

    fn holds(&self, row: usize, clause: &Clause) -> bool {
        self.catalog
            .cell(row, &clause.entity_type)
            .is_some_and(|cell| contains_phrase(cell, &clause.value))
    }
}

impl RowExistenceOracle for CatalogRowOracle<'_> {
    fn exists(&self, condition: &RowCondition) -> Result<bool, ServiceError> {
        if !condition.is_satisfiable() {
            return Ok(false);
        }
        Ok((0..self.catalog.len()).any(|row| {
            condition
                .groups()
                .iter()
                .all(|group| group.iter().any(|clause| self.holds(row, clause)))
        }))
    }
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let words: Vec<String> = haystack.split_whitespace().map(str::to_lowercase).collect();
    let needle: Vec<String> = phrase.split_whitespace().map(str::to_lowercase).collect();
    !needle.is_empty() && words.windows(needle.len()).any(|window| window == needle.as_slice())
}
