//! Text normalization shared by scoring, live analysis and exam grading

use std::collections::BTreeSet;

/// Words that carry no rubric signal on their own
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "i", "if", "in", "is",
    "it", "its", "me", "my", "no", "of", "on", "or", "our", "so", "that", "the", "their", "them",
    "they", "this", "to", "we", "will", "with", "you", "your",
];

/// Lowercase, trim, and collapse internal whitespace to single spaces
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split into lowercase word tokens, keeping inner apostrophes ("can't")
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
}

/// Whether a token is a stopword
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Light suffix stemmer: enough to line up "covers"/"covered"/"covering"
pub fn stem(word: &str) -> String {
    let len = word.chars().count();
    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if len > 5 && word.ends_with("ing") {
        return word[..word.len() - 3].to_string();
    }
    if len > 4 && word.ends_with("ed") {
        return word[..word.len() - 2].to_string();
    }
    if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Distinct stems of the non-stopword tokens in `text`
pub fn significant_stems(text: &str) -> BTreeSet<String> {
    tokens(text)
        .filter(|t| !is_stopword(t))
        .map(|t| stem(&t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Insurance \t COVERS\nthis "), "insurance covers this");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_tokens_keep_contractions() {
        let toks: Vec<String> = tokens("I can't, won't -- 'maybe'").collect();
        assert_eq!(toks, vec!["i", "can't", "won't", "maybe"]);
    }

    #[test]
    fn test_stem_suffixes() {
        assert_eq!(stem("covers"), "cover");
        assert_eq!(stem("covered"), "cover");
        assert_eq!(stem("covering"), "cover");
        assert_eq!(stem("policies"), "policy");
        assert_eq!(stem("glass"), "glass");
        assert_eq!(stem("is"), "is");
    }

    #[test]
    fn test_significant_stems_drop_stopwords() {
        let stems = significant_stems("no out of pocket");
        assert_eq!(stems.into_iter().collect::<Vec<_>>(), vec!["out", "pocket"]);
    }
}
