// @module: Emphasis keyword selection for the overlay line

/// Characters trimmed from both ends of every candidate word
const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '[', ']', '{', '}',
];

/// Longest keyword returned
pub const MAX_KEYWORD_CHARS: usize = 20;

/// Words never picked as keywords
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "then", "so", "to", "of", "in", "on", "for",
    "with", "at", "by", "is", "am", "are", "was", "were", "be", "been", "being", "it", "this",
    "that", "those", "these", "you", "i", "we", "they", "he", "she", "them", "us", "me", "my",
    "your", "our", "their", "as", "from", "not", "no", "yes",
];

/// Pick the longest non-stopword alphabetic word of `text`, lower-cased.
///
/// The first of several equally long words wins. Returns an empty string
/// when nothing qualifies.
pub fn pick_keyword(text: &str) -> String {
    let mut best: Option<String> = None;

    for raw in text.split_whitespace() {
        let word = raw.trim_matches(EDGE_PUNCTUATION).to_lowercase();
        if word.is_empty() || !word.chars().all(char::is_alphabetic) || is_stopword(&word) {
            continue;
        }
        let longer = best
            .as_ref()
            .is_none_or(|b| word.chars().count() > b.chars().count());
        if longer {
            best = Some(word);
        }
    }

    best.map(|word| word.chars().take(MAX_KEYWORD_CHARS).collect())
        .unwrap_or_default()
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}
