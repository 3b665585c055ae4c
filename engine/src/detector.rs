//! Two-pass co-occurrence check for queries that span several catalog attributes.

use crate::{
    data::{
        index::ShingleIndex,
        records::{ProblematicQueryRecord, QueryRecord},
    },
    lexer::tokenize,
    match_debug,
    services::{Clause, RowCondition, RowExistenceOracle, ServiceError},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Single token, a token outside the index, or a single entity type
    NotCandidate,
    /// Some catalog row carries the literal values together
    CoOccurs,
    Problematic(ProblematicQueryRecord),
}

impl Verdict {
    pub fn into_problematic(self) -> Option<ProblematicQueryRecord> {
        match self {
            Verdict::Problematic(record) => Some(record),
            _ => None,
        }
    }
}

pub struct ProblematicQueryDetector<'a, O: ?Sized> {
    index: &'a ShingleIndex,
    oracle: &'a O,
}

impl<'a, O> ProblematicQueryDetector<'a, O>
where
    O: RowExistenceOracle + ?Sized,
{
    pub fn new(index: &'a ShingleIndex, oracle: &'a O) -> Self {
        ProblematicQueryDetector { index, oracle }
    }

    /// Lowercase tokens of `query` when it spans more than one entity type
    /// and every token is an index key.
    pub fn candidate_tokens(&self, query: &str) -> Option<Vec<String>> {
        let tokens = tokenize(query);
        if tokens.len() < 2 || !tokens.iter().all(|t| self.index.contains_key(t)) {
            return None;
        }
        let types = self.index.entity_types_for(tokens.iter().map(String::as_str));
        if types.len() < 2 {
            return None;
        }
        Some(tokens)
    }

    pub fn detect(&self, record: &QueryRecord) -> Result<Verdict, ServiceError> {
        let tokens = match self.candidate_tokens(&record.text) {
            Some(tokens) => tokens,
            None => return Ok(Verdict::NotCandidate),
        };

        if self.exists(&self.condition(&tokens, true))? {
            match_debug!("Detector", "literal", "'{}' co-occurs", record.text);
            return Ok(Verdict::CoOccurs);
        }
        let legitimate_after_normalization = self.exists(&self.condition(&tokens, false))?;
        match_debug!(
            "Detector",
            "normalized",
            "'{}' problematic, legitimate={}",
            record.text,
            legitimate_after_normalization
        );

        let keys = || tokens.iter().map(String::as_str);
        Ok(Verdict::Problematic(ProblematicQueryRecord {
            query: record.text.clone(),
            legitimate_after_normalization,
            entity_types: self.index.entity_types_for(keys()),
            normalization_filters: self.index.filters_for(keys()),
            visits: record.visits,
            revenue: record.revenue,
        }))
    }

    /// One OR group per token over its entries, restricted to literal
    /// entries when `literal_only` is set.
    pub fn condition(&self, tokens: &[String], literal_only: bool) -> RowCondition {
        let mut condition = RowCondition::new();
        for token in tokens {
            let clauses = self
                .index
                .get(token)
                .unwrap_or_default()
                .iter()
                .filter(|entry| !literal_only || entry.is_literal())
                .map(|entry| Clause {
                    entity_type: entry.entity_type.clone(),
                    value: entry.entity_value.clone(),
                });
            condition.push_group(clauses);
        }
        condition
    }

    // A token with no usable entries leaves an empty group; nothing can match it.
    fn exists(&self, condition: &RowCondition) -> Result<bool, ServiceError> {
        if !condition.is_satisfiable() {
            return Ok(false);
        }
        self.oracle.exists(condition)
    }
}
