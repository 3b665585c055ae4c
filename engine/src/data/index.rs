use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use crate::{
    data::entry::{EntityType, FilterSet, MatchKind, ShingleEntry},
    lexer::shingles::generate_shingles,
    match_debug, match_log,
    services::{ServiceError, TextNormalizer},
};

/// Lowercase shingle text -> every catalog entity value it was cut from.
///
/// Keys iterate in sorted order; entries under a key keep insertion order
/// and may mix entity types and match kinds. The index only grows: it is
/// filled from the catalog, expanded once with normalized keys, and then
/// read concurrently by the matching phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShingleIndex {
    entries: BTreeMap<String, Vec<ShingleEntry>>,
}

/// Counters reported by [`ShingleIndex::expand_with_normalization`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    pub keys_examined: usize,
    pub keys_normalized: usize,
    pub entries_added: usize,
}

impl ShingleIndex {
    pub fn new() -> Self {
        ShingleIndex {
            entries: BTreeMap::new(),
        }
    }

    /// Build an index from `(entity type, entity value)` cells in catalog order.
    pub fn from_cells<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (&'a EntityType, &'a str)>,
    {
        let mut index = ShingleIndex::new();
        for (entity_type, entity_value) in cells {
            index.add_entity(entity_type, entity_value);
        }
        index
    }

    /// Append one entry per shingle of `entity_value`. Blank values are ignored.
    pub fn add_entity(&mut self, entity_type: &EntityType, entity_value: &str) {
        let whole = entity_value
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ")
            .to_lowercase();
        for shingle in generate_shingles(entity_value) {
            let key = shingle.to_lowercase();
            let match_kind = if key == whole {
                MatchKind::Full
            } else {
                MatchKind::Partial
            };
            self.entries
                .entry(key)
                .or_default()
                .push(ShingleEntry::new(entity_value, match_kind, entity_type));
        }
    }

    /// Add normalized variants of every single-word key.
    ///
    /// Keys are snapshotted before the first write, so keys created here are
    /// never normalized again in the same pass. Entries under the original
    /// key are cloned, tagged with the stages that changed the text, and
    /// appended under the normalized key; nothing already in the index is
    /// modified or replaced.
    pub fn expand_with_normalization<N>(
        &mut self,
        normalizer: &N,
        field_type: &str,
    ) -> Result<ExpansionStats, ServiceError>
    where
        N: TextNormalizer + ?Sized,
    {
        let snapshot: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.split_whitespace().count() == 1)
            .cloned()
            .collect();

        let mut stats = ExpansionStats::default();
        for original_key in snapshot {
            stats.keys_examined += 1;
            let normalization = normalizer.normalize(&original_key, field_type)?;
            let normalized_key = match normalization.first_token() {
                Some(token) if !token.is_empty() && token != original_key => token.to_string(),
                _ => continue,
            };

            let clones: Vec<ShingleEntry> = self
                .entries
                .get(&original_key)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| entry.normalized_clone(&normalization.filters_applied))
                        .collect()
                })
                .unwrap_or_default();

            match_debug!(
                "ShingleIndex",
                field_type,
                "{} -> {} ({} entries, filters={})",
                original_key,
                normalized_key,
                clones.len(),
                normalization.filters_applied
            );

            stats.keys_normalized += 1;
            stats.entries_added += clones.len();
            self.entries.entry(normalized_key).or_default().extend(clones);
        }

        match_log!(
            "ShingleIndex",
            field_type,
            "normalization expansion done keys_examined={}, keys_normalized={}, entries_added={}",
            stats.keys_examined,
            stats.keys_normalized,
            stats.entries_added
        );
        Ok(stats)
    }

    pub fn get(&self, key: &str) -> Option<&[ShingleEntry]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ShingleEntry])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries across all keys.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Entity types reachable from any of `keys`.
    pub fn entity_types_for<'a, I>(&self, keys: I) -> BTreeSet<EntityType>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .filter_map(|key| self.get(key))
            .flatten()
            .map(|entry| entry.entity_type.clone())
            .collect()
    }

    /// Normalization filters carried by any entry under any of `keys`.
    pub fn filters_for<'a, I>(&self, keys: I) -> FilterSet
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut filters = FilterSet::new();
        for entry in keys.into_iter().filter_map(|key| self.get(key)).flatten() {
            filters.union(&entry.normalization_filters);
        }
        filters
    }

    /// Write one `key: [entries]` line per key, in key order.
    pub fn write_dump<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for (key, entries) in &self.entries {
            let rendered = serde_json::to_string(entries).map_err(std::io::Error::other)?;
            writeln!(out, "{}: {}", key, rendered)?;
        }
        out.flush()
    }
}
