//! Text-side processing: cutting phrases into shingles, matching query
//! shingles against the index, and walking synonym token lattices.

pub mod lattice;
pub mod matcher;
pub mod shingles;

/// Split a query into lowercase whitespace-separated tokens.
pub fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_collapses_whitespace() {
        assert_eq!(tokenize("  Blue\tSHORTS  "), vec!["blue", "shorts"]);
        assert!(tokenize("   ").is_empty());
    }
}
