/// Every contiguous word run of `phrase`, shortest-start first:
/// `words[0..=0], words[0..=1], ..., words[1..=1], ...`.
///
/// A phrase of `k` words yields `k * (k + 1) / 2` shingles.
pub fn generate_shingles(phrase: &str) -> Vec<String> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let mut shingles = Vec::with_capacity(shingle_count(words.len()));
    for start in 0..words.len() {
        for end in start..words.len() {
            shingles.push(words[start..=end].join(" "));
        }
    }
    shingles
}

pub fn shingle_count(word_count: usize) -> usize {
    word_count * (word_count + 1) / 2
}
