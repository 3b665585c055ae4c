//! Folds problematic queries that read the same once normalized.

use std::fmt::Display;
use std::str::FromStr;

use crate::{
    data::records::{ProblematicQueryRecord, RolledUpQueryRecord},
    lexer::lattice::expand_lattice,
    match_debug, match_log,
    services::{ServiceError, TextNormalizer},
};

/// Which record of a group lends its query text and flags to the output row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepresentativePolicy {
    /// Highest visits in the finished group, earliest record on ties
    #[default]
    GroupMax,
    /// A merged record takes over when its visits exceed the group's running
    /// visit total at the moment it is merged
    Running,
}

impl FromStr for RepresentativePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group-max" => Ok(RepresentativePolicy::GroupMax),
            "running" => Ok(RepresentativePolicy::Running),
            other => Err(format!(
                "unknown representative policy '{}', expected 'group-max' or 'running'",
                other
            )),
        }
    }
}

impl Display for RepresentativePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepresentativePolicy::GroupMax => f.write_str("group-max"),
            RepresentativePolicy::Running => f.write_str("running"),
        }
    }
}

/// A problematic query with its normalized readings.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupInput {
    pub record: ProblematicQueryRecord,
    /// Final text of the stemming analysis
    pub canonical: String,
    /// Every reading of the synonym analysis lattice
    pub expanded: Vec<String>,
}

/// Normalize each record twice: once for its canonical form, once for the
/// synonym lattice whose readings it can be merged under.
pub fn prepare_inputs<N>(
    records: Vec<ProblematicQueryRecord>,
    normalizer: &N,
    stem_field_type: &str,
    synonym_field_type: &str,
) -> Result<Vec<RollupInput>, ServiceError>
where
    N: TextNormalizer + ?Sized,
{
    let mut inputs = Vec::with_capacity(records.len());
    for record in records {
        let canonical = normalizer.normalize(&record.query, stem_field_type)?.final_text();
        let lattice = normalizer.normalize(&record.query, synonym_field_type)?;
        let expanded = expand_lattice(&lattice.tokens);
        match_debug!(
            "Rollup",
            "prepare",
            "'{}' canonical='{}' readings={}",
            record.query,
            canonical,
            expanded.len()
        );
        inputs.push(RollupInput {
            record,
            canonical,
            expanded,
        });
    }
    Ok(inputs)
}

/// Group records in input order.
///
/// Each record not yet consumed seeds a group and pulls in every other
/// unconsumed record whose expanded readings contain the seed's canonical
/// form. Every input lands in exactly one group, so visit and revenue totals
/// are conserved.
pub fn roll_up(inputs: Vec<RollupInput>, policy: RepresentativePolicy) -> Vec<RolledUpQueryRecord> {
    let total = inputs.len();
    let mut consumed = vec![false; total];
    let mut groups = Vec::new();

    for seed in 0..total {
        if consumed[seed] {
            continue;
        }
        consumed[seed] = true;

        let seed_record = &inputs[seed].record;
        let canonical = &inputs[seed].canonical;
        let mut representative = seed;
        let mut visits = seed_record.visits;
        let mut revenue = seed_record.revenue;
        let mut filters = seed_record.normalization_filters.clone();
        let mut merged_queries = Vec::new();

        for candidate in 0..total {
            if consumed[candidate] || !inputs[candidate].expanded.contains(canonical) {
                continue;
            }
            consumed[candidate] = true;

            let record = &inputs[candidate].record;
            match policy {
                RepresentativePolicy::Running if record.visits > visits => {
                    representative = candidate
                }
                RepresentativePolicy::GroupMax
                    if record.visits > inputs[representative].record.visits =>
                {
                    representative = candidate
                }
                _ => {}
            }
            visits += record.visits;
            revenue += record.revenue;
            filters.union(&record.normalization_filters);
            merged_queries.push(record.query.clone());
        }

        if !merged_queries.is_empty() {
            match_debug!(
                "Rollup",
                canonical,
                "merged {} queries into '{}'",
                merged_queries.len(),
                inputs[representative].record.query
            );
        }
        groups.push(RolledUpQueryRecord {
            representative: inputs[representative].record.clone(),
            aggregated_visits: visits,
            aggregated_revenue: revenue,
            merged_filters: filters,
            merged_queries,
        });
    }

    match_log!(
        "Rollup",
        policy,
        "rolled {} problematic queries into {} groups",
        total,
        groups.len()
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::entry::{EntityType, FilterSet};
    use crate::lexer::lattice::LatticeToken;
    use crate::services::Normalization;
    use rust_decimal::Decimal;

    fn record(query: &str, visits: u64, revenue: Decimal, filters: &str) -> ProblematicQueryRecord {
        ProblematicQueryRecord {
            query: query.to_string(),
            legitimate_after_normalization: true,
            entity_types: ["color", "category"].into_iter().map(EntityType::from).collect(),
            normalization_filters: FilterSet::parse(filters),
            visits,
            revenue,
        }
    }

    fn input(record: ProblematicQueryRecord, canonical: &str, expanded: &[&str]) -> RollupInput {
        RollupInput {
            record,
            canonical: canonical.to_string(),
            expanded: expanded.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_merges_on_expanded_reading() {
        let inputs = vec![
            input(
                record("blue short", 5, Decimal::new(123456, 2), "PorterStemFilter"),
                "blue short",
                &["blue short"],
            ),
            input(
                record("blue shorts", 3, Decimal::new(1000, 2), "SynonymGraphFilter"),
                "blue shorts",
                &["blue short", "navy short"],
            ),
        ];
        let groups = roll_up(inputs, RepresentativePolicy::GroupMax);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.representative.query, "blue short");
        assert_eq!(group.aggregated_visits, 8);
        assert_eq!(group.aggregated_revenue.to_string(), "1244.56");
        assert_eq!(group.merged_filters.to_string(), "PorterStemFilter/SynonymGraphFilter");
        assert_eq!(group.merged_queries, vec!["blue shorts".to_string()]);
    }

    #[test]
    fn test_merge_needs_seed_canonical_in_candidate_readings() {
        // B's canonical is in A's readings, but A seeds first and B's
        // readings do not contain A's canonical.
        let inputs = vec![
            input(record("a", 1, Decimal::ONE, ""), "a", &["a", "b"]),
            input(record("b", 1, Decimal::ONE, ""), "b", &["b"]),
        ];
        let groups = roll_up(inputs, RepresentativePolicy::GroupMax);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.merged_queries.is_empty()));
    }

    #[test]
    fn test_conserves_totals() {
        let inputs = vec![
            input(record("q1", 10, Decimal::new(100, 0), ""), "x", &["x"]),
            input(record("q2", 20, Decimal::new(250, 1), ""), "y", &["x", "y"]),
            input(record("q3", 30, Decimal::new(5, 2), ""), "x", &["x"]),
            input(record("q4", 1, Decimal::ZERO, ""), "z", &["y"]),
            input(record("q5", 7, Decimal::new(1999, 2), ""), "x", &["z"]),
        ];
        let visits_in: u64 = inputs.iter().map(|i| i.record.visits).sum();
        let revenue_in: Decimal = inputs.iter().map(|i| i.record.revenue).sum();

        for policy in [RepresentativePolicy::GroupMax, RepresentativePolicy::Running] {
            let groups = roll_up(inputs.clone(), policy);
            let visits_out: u64 = groups.iter().map(|g| g.aggregated_visits).sum();
            let revenue_out: Decimal = groups.iter().map(|g| g.aggregated_revenue).sum();
            assert_eq!(visits_out, visits_in);
            assert_eq!(revenue_out, revenue_in);
            let merged: usize = groups.iter().map(|g| g.merged_queries.len() + 1).sum();
            assert_eq!(merged, 5);
        }
    }

    #[test]
    fn test_representative_policies_differ() {
        let inputs = vec![
            input(record("seed", 10, Decimal::ZERO, ""), "c", &["c"]),
            input(record("first", 12, Decimal::ZERO, ""), "d", &["c"]),
            input(record("second", 15, Decimal::ZERO, ""), "e", &["c"]),
        ];
        let group_max = roll_up(inputs.clone(), RepresentativePolicy::GroupMax);
        assert_eq!(group_max[0].representative.query, "second");

        // 12 > 10 but 15 is not above the running total of 22.
        let running = roll_up(inputs, RepresentativePolicy::Running);
        assert_eq!(running[0].representative.query, "first");
        assert_eq!(running[0].aggregated_visits, 37);
        assert_eq!(running[0].to_record().visits, 37);
    }

    #[test]
    fn test_group_max_keeps_earliest_on_tie() {
        let inputs = vec![
            input(record("seed", 5, Decimal::ZERO, ""), "c", &["c"]),
            input(record("tie", 5, Decimal::ZERO, ""), "d", &["c"]),
        ];
        let groups = roll_up(inputs, RepresentativePolicy::GroupMax);
        assert_eq!(groups[0].representative.query, "seed");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("running".parse::<RepresentativePolicy>(), Ok(RepresentativePolicy::Running));
        assert_eq!("group-max".parse::<RepresentativePolicy>(), Ok(RepresentativePolicy::GroupMax));
        assert!("max".parse::<RepresentativePolicy>().is_err());
        assert_eq!(RepresentativePolicy::default().to_string(), "group-max");
    }

    #[test]
    fn test_prepare_inputs_uses_both_field_types() {
        struct Analyzer;
        impl TextNormalizer for Analyzer {
            fn normalize(&self, text: &str, field_type: &str) -> Result<Normalization, ServiceError> {
                let tokens = match field_type {
                    "syn" => vec![
                        LatticeToken::new("pant", 1, 1),
                        LatticeToken::new("jean", 1, 1),
                    ],
                    _ => vec![LatticeToken::new(text.trim_end_matches('s'), 1, 1)],
                };
                Ok(Normalization {
                    tokens,
                    filters_applied: FilterSet::new(),
                })
            }
        }
        let inputs = prepare_inputs(
            vec![record("pants", 1, Decimal::ZERO, "")],
            &Analyzer,
            "stem",
            "syn",
        )
        .unwrap();
        assert_eq!(inputs[0].canonical, "pant");
        assert_eq!(inputs[0].expanded, vec!["pant", "jean"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(roll_up(Vec::new(), RepresentativePolicy::Running).is_empty());
    }
}
