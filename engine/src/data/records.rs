use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::data::entry::{EntityType, FilterSet};

/// One row of the query traffic feed.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub text: String,
    pub visits: u64,
    pub revenue: Decimal,
    /// Remaining columns of the row as `(header, value)`, in table order
    pub columns: Vec<(String, String)>,
}

impl QueryRecord {
    pub fn new<S: Into<String>>(text: S, visits: u64, revenue: Decimal) -> Self {
        QueryRecord {
            text: text.into(),
            visits,
            revenue,
            columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<(String, String)>) -> Self {
        self.columns = columns;
        self
    }

    pub fn column(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value.as_str())
    }
}

/// A multi-attribute query with no literal co-occurrence in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblematicQueryRecord {
    pub query: String,
    /// A row exists once normalized index entries are allowed
    pub legitimate_after_normalization: bool,
    pub entity_types: BTreeSet<EntityType>,
    pub normalization_filters: FilterSet,
    pub visits: u64,
    pub revenue: Decimal,
}

impl ProblematicQueryRecord {
    /// `Y`/`N` as written in the problematic queries table.
    pub fn legitimacy_flag(&self) -> &'static str {
        if self.legitimate_after_normalization {
            "Y"
        } else {
            "N"
        }
    }

    pub fn entity_types_cell(&self) -> String {
        self.entity_types
            .iter()
            .map(EntityType::as_str)
            .collect::<Vec<&str>>()
            .join(crate::data::LIST_SEPARATOR)
    }
}

/// One group of the rollup: the representative record with the group totals.
#[derive(Debug, Clone, PartialEq)]
pub struct RolledUpQueryRecord {
    pub representative: ProblematicQueryRecord,
    pub aggregated_visits: u64,
    pub aggregated_revenue: Decimal,
    pub merged_filters: FilterSet,
    /// Query texts folded into this group, seed excluded, in merge order
    pub merged_queries: Vec<String>,
}

impl RolledUpQueryRecord {
    /// The representative with visits, revenue and filters replaced by the
    /// group aggregates.
    pub fn to_record(&self) -> ProblematicQueryRecord {
        ProblematicQueryRecord {
            visits: self.aggregated_visits,
            revenue: self.aggregated_revenue,
            normalization_filters: self.merged_filters.clone(),
            ..self.representative.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(query: &str, legitimate: bool) -> ProblematicQueryRecord {
        ProblematicQueryRecord {
            query: query.to_string(),
            legitimate_after_normalization: legitimate,
            entity_types: ["color", "category"].into_iter().map(EntityType::from).collect(),
            normalization_filters: FilterSet::parse("PorterStemFilter"),
            visits: 10,
            revenue: Decimal::new(1000, 2),
        }
    }

    #[test]
    fn test_cells() {
        let r = record("blue shorts", true);
        assert_eq!(r.legitimacy_flag(), "Y");
        assert_eq!(record("blue shorts", false).legitimacy_flag(), "N");
        assert_eq!(r.entity_types_cell(), "category/color");
    }

    #[test]
    fn test_rolled_up_overrides_aggregates() {
        let rolled = RolledUpQueryRecord {
            representative: record("blue shorts", true),
            aggregated_visits: 25,
            aggregated_revenue: Decimal::new(124456, 2),
            merged_filters: FilterSet::parse("PorterStemFilter/SynonymGraphFilter"),
            merged_queries: vec!["blue short".to_string()],
        };
        let flat = rolled.to_record();
        assert_eq!(flat.query, "blue shorts");
        assert_eq!(flat.visits, 25);
        assert_eq!(flat.revenue.to_string(), "1244.56");
        assert_eq!(flat.normalization_filters.len(), 2);
    }
}
