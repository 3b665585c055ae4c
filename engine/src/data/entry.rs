use std::fmt::Display;

use serde::Serialize;

use crate::data::LIST_SEPARATOR;

/// A catalog attribute, named after its column header (`color`, `category`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new<S: Into<String>>(name: S) -> Self {
        EntityType(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        EntityType::new(name)
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// The shingle is the whole entity value
    Full,
    /// The shingle is a strict sub-phrase of the entity value
    Partial,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Full => "full",
            MatchKind::Partial => "partial",
        }
    }
}

impl Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the normalization stages that changed a text, without
/// duplicates, in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterSet(Vec<String>);

impl FilterSet {
    pub fn new() -> Self {
        FilterSet(Vec::new())
    }

    pub fn insert<S: Into<String>>(&mut self, name: S) -> bool {
        let name = name.into();
        if name.is_empty() || self.0.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    pub fn union(&mut self, other: &FilterSet) {
        for name in other.iter() {
            self.insert(name.as_str());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a `/`-joined cell back into a set.
    pub fn parse(cell: &str) -> Self {
        cell.split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for FilterSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl Display for FilterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(LIST_SEPARATOR))
    }
}

/// One catalog entity value reachable from a shingle key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShingleEntry {
    pub entity_value: String,
    pub match_kind: MatchKind,
    pub entity_type: EntityType,
    pub normalization_filters: FilterSet,
}

impl ShingleEntry {
    pub fn new(entity_value: &str, match_kind: MatchKind, entity_type: &EntityType) -> Self {
        ShingleEntry {
            entity_value: entity_value.to_string(),
            match_kind,
            entity_type: entity_type.clone(),
            normalization_filters: FilterSet::new(),
        }
    }

    /// Entries produced straight from the catalog, before any normalization.
    pub fn is_literal(&self) -> bool {
        self.normalization_filters.is_empty()
    }

    /// Copy of this entry tagged with the stages that produced its key.
    pub fn normalized_clone(&self, filters: &FilterSet) -> ShingleEntry {
        ShingleEntry {
            normalization_filters: filters.clone(),
            ..self.clone()
        }
    }
}
