//! Detects search queries whose terms span several catalog attributes but
//! never co-occur on a real catalog item.
//!
//! The pipeline runs in strictly ordered phases: the [`ShingleIndex`] is built
//! from the catalog's entity table and expanded with normalized keys, then
//! every query is matched and checked against the catalog rows, and finally
//! the problematic queries are rolled up by normalized form.

#![forbid(unsafe_code)]

pub mod data;
pub mod detector;
pub mod io;
pub mod lexer;
pub mod pipeline;
pub mod rollup;
pub mod services;
pub mod synonyms;
mod util;

pub use crate::data::{
    entry::{EntityType, FilterSet, MatchKind, ShingleEntry},
    index::{ExpansionStats, ShingleIndex},
    records::{ProblematicQueryRecord, QueryRecord, RolledUpQueryRecord},
    MatcherError, ParseError,
};
pub use crate::detector::{ProblematicQueryDetector, Verdict};
pub use crate::lexer::{
    lattice::{expand_lattice, LatticeToken},
    matcher::{MatchClassification, QueryMatcher, ShingleMatch},
    shingles::generate_shingles,
};
pub use crate::rollup::{roll_up, RepresentativePolicy, RollupInput};
pub use crate::services::{
    Clause, Normalization, RowCondition, RowExistenceOracle, ServiceError, TextNormalizer,
};
pub use crate::util::currency::{format_revenue, parse_revenue, parse_visits};

#[macro_export]
macro_rules! match_log {
    ($module:expr, $scope:expr, $msg:expr $(, $args:expr)* $(,)?) => {
        tracing::info!("[{}][{}] {}", $module, $scope, format!($msg $(, $args)*))
    };
}

#[macro_export]
macro_rules! match_warn {
    ($module:expr, $scope:expr, $msg:expr $(, $args:expr)* $(,)?) => {
        tracing::warn!("[{}][{}] {}", $module, $scope, format!($msg $(, $args)*))
    };
}

#[macro_export]
macro_rules! match_error {
    ($module:expr, $scope:expr, $msg:expr $(, $args:expr)* $(,)?) => {
        tracing::error!("[{}][{}] {}", $module, $scope, format!($msg $(, $args)*))
    };
}

#[macro_export]
macro_rules! match_debug {
    ($module:expr, $scope:expr, $msg:expr $(, $args:expr)* $(,)?) => {
        tracing::debug!("[{}][{}] {}", $module, $scope, format!($msg $(, $args)*))
    };
}
