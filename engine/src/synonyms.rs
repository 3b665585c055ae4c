//! Rewrites explicit synonym mappings so the left term keeps matching itself.

use std::io::{BufRead, Write};

use crate::{
    data::{
        entry::{EntityType, MatchKind},
        index::ShingleIndex,
        MatcherError,
    },
    match_debug, match_log,
};

const MAPPING: &str = "=>";

/// One `left => right1, right2, ...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymRule {
    pub left: String,
    pub right: Vec<String>,
    /// The trimmed source line
    pub original: String,
}

impl SynonymRule {
    /// `None` for lines without a mapping arrow.
    pub fn parse(line: &str) -> Option<SynonymRule> {
        let original = line.trim();
        let (left, right) = original.split_once(MAPPING)?;
        Some(SynonymRule {
            left: left.trim().to_string(),
            right: right.split(',').map(|term| term.trim().to_string()).collect(),
            original: original.to_string(),
        })
    }

    /// The rule with its left term prepended to the alternatives.
    pub fn rewritten(&self) -> String {
        format!("{} {} {}, {}", self.left, MAPPING, self.left, self.right.join(", "))
    }

    /// Match kind and entity type of the first index entry for the left term,
    /// when the term is a key and not already one of its own alternatives.
    pub fn match_info(&self, index: &ShingleIndex) -> Option<(MatchKind, EntityType)> {
        if self.right.contains(&self.left) {
            return None;
        }
        let entry = index.get(&self.left.to_lowercase())?.first()?;
        Some((entry.match_kind, entry.entity_type.clone()))
    }
}

/// One row of the synonym expansions table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymExpansion {
    pub left_term: String,
    pub match_kind: Option<MatchKind>,
    pub entity_type: Option<EntityType>,
    pub original_line: String,
    pub rewritten_line: String,
}

/// Copy `rules` to `rewritten`, rewriting every mapping line and passing the
/// rest through trimmed, and return an expansion row per mapping.
pub fn process_synonyms<R, W>(
    rules: R,
    index: &ShingleIndex,
    mut rewritten: W,
) -> Result<Vec<SynonymExpansion>, MatcherError>
where
    R: BufRead,
    W: Write,
{
    let mut expansions = Vec::new();
    let mut passed_through = 0usize;

    for line in rules.lines() {
        let line = line?;
        let rule = match SynonymRule::parse(&line) {
            Some(rule) => rule,
            None => {
                writeln!(rewritten, "{}", line.trim())?;
                passed_through += 1;
                continue;
            }
        };

        let rewritten_line = rule.rewritten();
        writeln!(rewritten, "{}", rewritten_line)?;
        let info = rule.match_info(index);
        match_debug!("Synonyms", "rule", "{} matched={}", rule.left, info.is_some());

        expansions.push(SynonymExpansion {
            left_term: rule.left,
            match_kind: info.as_ref().map(|(kind, _)| *kind),
            entity_type: info.map(|(_, entity_type)| entity_type),
            original_line: rule.original,
            rewritten_line,
        });
    }
    rewritten.flush()?;

    match_log!(
        "Synonyms",
        "rewrite",
        "rewrote {} rules, passed {} lines through",
        expansions.len(),
        passed_through
    );
    Ok(expansions)
}
