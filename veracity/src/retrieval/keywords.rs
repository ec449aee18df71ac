use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const MAX_KEYWORDS: usize = 5;

static PROPER_NOUN_PATTERN: OnceLock<Regex> = OnceLock::new();
static WORD_PATTERN: OnceLock<Regex> = OnceLock::new();

fn proper_noun_pattern() -> &'static Regex {
    PROPER_NOUN_PATTERN.get_or_init(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid regex"))
}

fn word_pattern() -> &'static Regex {
    WORD_PATTERN.get_or_init(|| Regex::new(r"\b\w+\b").expect("valid regex"))
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s", "same", "she", "should",
    "so", "some", "such", "t", "than", "that", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "you", "your", "yours", "yourself", "yourselves", "known",
];

/// Keeps the first occurrence of each item.
fn dedup_in_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Capitalised words first, then remaining non-stop-words in lower case.
pub fn extract_keywords(question: &str) -> Vec<String> {
    let proper_nouns: Vec<String> = proper_noun_pattern()
        .find_iter(question)
        .map(|m| m.as_str().to_string())
        .collect();
    let proper_lower: HashSet<String> = proper_nouns.iter().map(|p| p.to_lowercase()).collect();

    let lowered = question.to_lowercase();
    let other_words = word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| !STOP_WORDS.contains(word) && !proper_lower.contains(*word))
        .map(str::to_string);

    let mut keywords = dedup_in_order(proper_nouns.into_iter().chain(other_words).collect());
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

/// The joined keywords, the question itself, then each keyword alone.
pub fn search_queries(question: &str, keywords: &[String]) -> Vec<String> {
    let mut queries = Vec::with_capacity(keywords.len() + 2);
    if !keywords.is_empty() {
        queries.push(keywords.join(" "));
    }
    queries.push(question.to_string());
    queries.extend(keywords.iter().cloned());
    dedup_in_order(queries)
}
