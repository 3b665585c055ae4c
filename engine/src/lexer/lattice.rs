use std::collections::HashMap;

/// One token of a synonym token graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatticeToken {
    pub text: String,
    /// 1-based start position
    pub position: u32,
    /// Number of positions the token spans
    pub position_length: u32,
}

impl LatticeToken {
    pub fn new<S: Into<String>>(text: S, position: u32, position_length: u32) -> Self {
        LatticeToken {
            text: text.into(),
            position,
            position_length,
        }
    }

    /// `None` once the span runs past the last representable position.
    fn next_position(&self) -> Option<u32> {
        self.position.checked_add(self.position_length.max(1))
    }
}

/// Enumerate every reading of a token lattice, starting at position 1.
///
/// Each reading follows one token per visited position and jumps ahead by
/// the token's span; a position with no starting tokens, or a span past
/// `u32::MAX`, ends the reading.
/// Readings come out in depth-first order, with alternatives at a position
/// explored in input order. Duplicate readings are kept.
pub fn expand_lattice(tokens: &[LatticeToken]) -> Vec<String> {
    let mut starting_at: HashMap<u32, Vec<&LatticeToken>> = HashMap::new();
    for token in tokens {
        starting_at.entry(token.position).or_default().push(token);
    }

    let mut readings = Vec::new();
    let mut stack: Vec<(u32, String)> = vec![(1, String::new())];

    while let Some((position, accumulated)) = stack.pop() {
        match starting_at.get(&position) {
            None => readings.push(accumulated.trim().to_string()),
            Some(candidates) => {
                // Reverse so the first alternative is popped, and finished, first.
                for token in candidates.iter().rev() {
                    let mut next = accumulated.clone();
                    next.push_str(&token.text);
                    next.push(' ');
                    match token.next_position() {
                        Some(position) => stack.push((position, next)),
                        None => readings.push(next.trim().to_string()),
                    }
                }
            }
        }
    }

    readings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternatives_at_one_position() {
        let tokens = vec![LatticeToken::new("pants", 1, 1), LatticeToken::new("jeans", 1, 1)];
        assert_eq!(expand_lattice(&tokens), vec!["pants", "jeans"]);
    }

    #[test]
    fn test_multi_position_synonym() {
        // "blue jeans" with "denim" spanning both positions
        let tokens = vec![
            LatticeToken::new("denim", 1, 2),
            LatticeToken::new("blue", 1, 1),
            LatticeToken::new("jeans", 2, 1),
            LatticeToken::new("sale", 3, 1),
        ];
        assert_eq!(expand_lattice(&tokens), vec!["denim sale", "blue jeans sale"]);
    }

    #[test]
    fn test_readings_multiply_across_positions() {
        let tokens = vec![
            LatticeToken::new("a", 1, 1),
            LatticeToken::new("b", 1, 1),
            LatticeToken::new("c", 2, 1),
            LatticeToken::new("d", 2, 1),
        ];
        assert_eq!(expand_lattice(&tokens), vec!["a c", "a d", "b c", "b d"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let tokens = vec![LatticeToken::new("short", 1, 1), LatticeToken::new("short", 1, 1)];
        assert_eq!(expand_lattice(&tokens), vec!["short", "short"]);
    }

    #[test]
    fn test_empty_lattice_yields_one_empty_reading() {
        assert_eq!(expand_lattice(&[]), vec![String::new()]);
    }

    #[test]
    fn test_zero_span_still_advances() {
        let tokens = vec![LatticeToken::new("x", 1, 0), LatticeToken::new("y", 2, 1)];
        assert_eq!(expand_lattice(&tokens), vec!["x y"]);
    }

    #[test]
    fn test_last_position_ends_the_reading() {
        let tokens = vec![
            LatticeToken::new("a", 1, u32::MAX - 1),
            LatticeToken::new("b", u32::MAX, 1),
        ];
        assert_eq!(tokens[1].next_position(), None);
        assert_eq!(expand_lattice(&tokens), vec!["a b"]);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let tokens: Vec<LatticeToken> = (1..=5000)
            .map(|p| LatticeToken::new("w", p, 1))
            .collect();
        let readings = expand_lattice(&tokens);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].split(' ').count(), 5000);
    }
}
