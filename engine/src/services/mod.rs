//! Boundaries to the search engine: text normalization and row existence.
//!
//! Both are plain traits so the pipeline can run against the live search
//! engine ([`solr`]), against the catalog file itself ([`catalog`]), or
//! against in-memory fakes in tests.

use shinglematch_client::ClientError;
use thiserror::Error;

use crate::data::entry::{EntityType, FilterSet};
use crate::lexer::lattice::LatticeToken;

pub mod catalog;
pub mod solr;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("search engine request failed: {0}")]
    Client(#[from] ClientError),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Result of running a text through a normalizer's analysis chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalization {
    /// Tokens of the last stage, with their lattice positions
    pub tokens: Vec<LatticeToken>,
    /// Stages whose output differed from their input, in chain order
    pub filters_applied: FilterSet,
}

impl Normalization {
    /// First output token, the normalized form of a single-word input.
    pub fn first_token(&self) -> Option<&str> {
        self.tokens.first().map(|t| t.text.as_str())
    }

    /// Output tokens joined by a space.
    pub fn final_text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

/// Deterministic text normalization keyed by an analysis field type.
pub trait TextNormalizer {
    fn normalize(&self, text: &str, field_type: &str) -> Result<Normalization, ServiceError>;
}

/// One entity-type-scoped phrase condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    pub entity_type: EntityType,
    pub value: String,
}

/// Conjunction of disjunctions: a row satisfies the condition when every
/// group has at least one clause the row satisfies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowCondition {
    groups: Vec<Vec<Clause>>,
}

impl RowCondition {
    pub fn new() -> Self {
        RowCondition { groups: Vec::new() }
    }

    /// Add an OR group, dropping duplicate clauses.
    pub fn push_group<I: IntoIterator<Item = Clause>>(&mut self, clauses: I) {
        let mut group: Vec<Clause> = Vec::new();
        for clause in clauses {
            if !group.contains(&clause) {
                group.push(clause);
            }
        }
        self.groups.push(group);
    }

    pub fn groups(&self) -> &[Vec<Clause>] {
        &self.groups
    }

    /// False when there is nothing to ask or some group is empty; no row can
    /// satisfy an empty disjunction.
    pub fn is_satisfiable(&self) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(|group| !group.is_empty())
    }
}

/// Answers whether some catalog row satisfies a [`RowCondition`].
pub trait RowExistenceOracle {
    fn exists(&self, condition: &RowCondition) -> Result<bool, ServiceError>;
}
