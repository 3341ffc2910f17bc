//! Relevance scoring for catalog search
//!
//! Plain substring containment, case-insensitive. No stemming or fuzzy matching.

use crate::models::CatalogEntry;

const FULL_QUERY_IN_TITLE: u32 = 10;
const WORD_IN_TITLE: u32 = 5;
const FULL_QUERY_IN_SEARCH_TEXT: u32 = 3;
const WORD_IN_SEARCH_TEXT: u32 = 1;
const FULL_QUERY_IN_CATEGORY: u32 = 2;

/// Lowercased, trimmed query plus its whitespace-separated words.
#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    pub text: String,
    pub words: Vec<String>,
}

impl NormalizedQuery {
    pub fn new(query: &str) -> Self {
        let text = query.trim().to_lowercase();
        // Repeated words are kept and score once per occurrence.
        let words = text.split_whitespace().map(str::to_string).collect();
        Self { text, words }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Score one entry against a normalized query. Higher is more relevant; zero
/// means no match at all.
pub fn score(entry: &CatalogEntry, query: &NormalizedQuery) -> u32 {
    let title = entry.title.to_lowercase();
    let search_text = entry.search_text.to_lowercase();
    let category = entry.category.to_lowercase();

    let mut score = 0;

    if title.contains(&query.text) {
        score += FULL_QUERY_IN_TITLE;
    }
    score += WORD_IN_TITLE * count_contained(&title, &query.words);

    if search_text.contains(&query.text) {
        score += FULL_QUERY_IN_SEARCH_TEXT;
    }
    score += WORD_IN_SEARCH_TEXT * count_contained(&search_text, &query.words);

    if category.contains(&query.text) {
        score += FULL_QUERY_IN_CATEGORY;
    }

    score
}

fn count_contained(haystack: &str, words: &[String]) -> u32 {
    words.iter().filter(|word| haystack.contains(word.as_str())).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, search_text: &str, category: &str) -> CatalogEntry {
        CatalogEntry {
            title: title.to_string(),
            search_text: search_text.to_string(),
            url: String::new(),
            image_url: String::new(),
            category: category.to_string(),
            price: String::new(),
            variants: String::new(),
            discount: 0,
        }
    }

    #[test]
    fn test_weights_add_up() {
        let phone = entry("iPhone 14", "Apple smartphone with A15 chip", "Phones");
        let query = NormalizedQuery::new("  Phone ");

        // title full (10) + title word (5) + text full (3) + text word (1) + category (2)
        assert_eq!(score(&phone, &query), 21);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let watch = entry("SMART WATCH", "", "");

        assert_eq!(score(&watch, &NormalizedQuery::new("smart watch")), 10 + 5 + 5);
    }

    #[test]
    fn test_repeated_words_compound() {
        let hose = entry("Garden Hose", "", "");

        let once = score(&hose, &NormalizedQuery::new("hose"));
        let twice = score(&hose, &NormalizedQuery::new("hose hose"));

        assert_eq!(once, 15);
        // full-query match is lost, but each repeated word scores again
        assert_eq!(twice, 10);
    }

    #[test]
    fn test_unrelated_entry_scores_zero() {
        let hose = entry("Garden Hose", "Flexible 20m hose", "Garden");

        assert_eq!(score(&hose, &NormalizedQuery::new("phone")), 0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let phone = entry("iPhone 14", "Apple smartphone", "Phones");
        let query = NormalizedQuery::new("I am looking for a phone");

        let first = score(&phone, &query);
        assert!((0..10).all(|_| score(&phone, &query) == first));
    }

    #[test]
    fn test_normalized_query_splits_on_whitespace_runs() {
        let query = NormalizedQuery::new("\tRed   running\nshoes ");

        assert_eq!(query.text, "red   running\nshoes");
        assert_eq!(query.words, vec!["red", "running", "shoes"]);
        assert!(NormalizedQuery::new("   ").is_empty());
    }
}
