use std::collections::BTreeSet;

use crate::{
    data::{
        entry::{EntityType, MatchKind},
        index::ShingleIndex,
    },
    lexer::shingles::generate_shingles,
};

/// How one query shingle lands in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchClassification {
    /// Shingle as written in the query
    pub shingle: String,
    /// Matched entity values grouped by entity type, both in first-seen order
    pub entities_by_type: Vec<(EntityType, Vec<String>)>,
    pub overlap: bool,
    pub distinct_entities: usize,
    pub distinct_types: usize,
    pub match_kind: MatchKind,
}

impl MatchClassification {
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities_by_type.iter().map(|(entity_type, _)| entity_type)
    }

    pub fn entity_values(&self) -> impl Iterator<Item = &str> {
        self.entities_by_type
            .iter()
            .flat_map(|(_, values)| values.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShingleMatch {
    Matched(MatchClassification),
    Unmatched(String),
}

impl ShingleMatch {
    pub fn shingle(&self) -> &str {
        match self {
            ShingleMatch::Matched(classification) => &classification.shingle,
            ShingleMatch::Unmatched(shingle) => shingle,
        }
    }
}

/// Read-only view over a frozen index; safe to share across threads.
#[derive(Debug, Clone, Copy)]
pub struct QueryMatcher<'a> {
    index: &'a ShingleIndex,
}

impl<'a> QueryMatcher<'a> {
    pub fn new(index: &'a ShingleIndex) -> Self {
        QueryMatcher { index }
    }

    /// One outcome per query shingle, in shingle order.
    pub fn match_query(&self, query: &str) -> Vec<ShingleMatch> {
        generate_shingles(query)
            .into_iter()
            .map(|shingle| match self.classify(&shingle) {
                Some(classification) => ShingleMatch::Matched(classification),
                None => ShingleMatch::Unmatched(shingle),
            })
            .collect()
    }

    /// Classify a single shingle, `None` when its lowercase form is not a key.
    pub fn classify(&self, shingle: &str) -> Option<MatchClassification> {
        let entries = self.index.get(&shingle.to_lowercase())?;

        let mut entities_by_type: Vec<(EntityType, Vec<String>)> = Vec::new();
        let mut match_kind = MatchKind::Partial;
        for entry in entries {
            if entry.match_kind == MatchKind::Full {
                match_kind = MatchKind::Full;
            }
            let group = match entities_by_type
                .iter()
                .position(|(entity_type, _)| *entity_type == entry.entity_type)
            {
                Some(slot) => &mut entities_by_type[slot].1,
                None => {
                    entities_by_type.push((entry.entity_type.clone(), Vec::new()));
                    let last = entities_by_type.len() - 1;
                    &mut entities_by_type[last].1
                }
            };
            if !group.contains(&entry.entity_value) {
                group.push(entry.entity_value.clone());
            }
        }

        let distinct_entities = entities_by_type
            .iter()
            .flat_map(|(_, values)| values.iter())
            .collect::<BTreeSet<&String>>()
            .len();
        let distinct_types = entities_by_type.len();

        Some(MatchClassification {
            shingle: shingle.to_string(),
            entities_by_type,
            overlap: distinct_entities > 1 || distinct_types > 1,
            distinct_entities,
            distinct_types,
            match_kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ShingleIndex {
        let color = EntityType::from("color");
        let category = EntityType::from("category");
        let collection = EntityType::from("collection");
        ShingleIndex::from_cells(vec![
            (&color, "light blue"),
            (&color, "blue"),
            (&category, "shorts"),
            (&collection, "Align"),
            (&category, "align pant"),
        ])
    }

    #[test]
    fn test_match_query_marks_every_shingle() {
        let index = index();
        let matcher = QueryMatcher::new(&index);
        let outcomes = matcher.match_query("Blue Shorts sale");
        let shingles: Vec<&str> = outcomes.iter().map(ShingleMatch::shingle).collect();
        assert_eq!(
            shingles,
            vec!["Blue", "Blue Shorts", "Blue Shorts sale", "Shorts", "Shorts sale", "sale"]
        );
        assert!(matches!(outcomes[0], ShingleMatch::Matched(_)));
        assert_eq!(outcomes[1], ShingleMatch::Unmatched("Blue Shorts".to_string()));
        assert!(matches!(outcomes[3], ShingleMatch::Matched(_)));
        assert_eq!(outcomes[5], ShingleMatch::Unmatched("sale".to_string()));
    }

    #[test]
    fn test_classify_full_wins_and_overlap_on_entities() {
        let index = index();
        let blue = QueryMatcher::new(&index).classify("blue").unwrap();
        assert_eq!(blue.match_kind, MatchKind::Full);
        assert_eq!(blue.distinct_entities, 2);
        assert_eq!(blue.distinct_types, 1);
        assert!(blue.overlap);
        let values: Vec<&str> = blue.entity_values().collect();
        assert_eq!(values, vec!["light blue", "blue"]);
    }

    #[test]
    fn test_classify_partial_without_overlap() {
        let index = index();
        let light = QueryMatcher::new(&index).classify("LIGHT").unwrap();
        assert_eq!(light.shingle, "LIGHT");
        assert_eq!(light.match_kind, MatchKind::Partial);
        assert!(!light.overlap);
        assert_eq!(light.distinct_entities, 1);
    }

    #[test]
    fn test_classify_overlap_on_types() {
        let index = index();
        let align = QueryMatcher::new(&index).classify("align").unwrap();
        let types: Vec<&str> = align.entity_types().map(EntityType::as_str).collect();
        assert_eq!(types, vec!["collection", "category"]);
        assert_eq!(align.distinct_types, 2);
        assert_eq!(align.match_kind, MatchKind::Full);
        assert!(align.overlap);
    }

    #[test]
    fn test_matching_is_deterministic() {
        let index = index();
        let matcher = QueryMatcher::new(&index);
        let first = matcher.match_query("light blue align shorts");
        let second = matcher.match_query("light blue align shorts");
        assert_eq!(first, second);
        assert_eq!(index, self::index());
    }
}
