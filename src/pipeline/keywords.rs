use std::collections::HashSet;

/// Keywords and their hashtag forms, in the same order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTags {
    pub keywords: Vec<String>,
    pub hashtags: Vec<String>,
}

/// Local keyword/hashtag extractor over summary text
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    max_keywords: usize,
    min_chars: usize,
}

impl KeywordExtractor {
    /// Keeps tokens longer than `min_chars` characters, at most `max_keywords`
    pub fn new(max_keywords: usize, min_chars: usize) -> Self {
        Self { max_keywords, min_chars }
    }

    /// Whitespace tokens, `.,!?` trimmed from both ends, lowercased, long
    /// tokens only, deduplicated in first-occurrence order.
    pub fn extract(&self, text: &str) -> ExtractedTags {
        let mut seen = HashSet::new();
        let keywords: Vec<String> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c| matches!(c, '.' | ',' | '!' | '?')).to_lowercase())
            .filter(|w| w.chars().count() > self.min_chars)
            .filter(|w| seen.insert(w.clone()))
            .take(self.max_keywords)
            .collect();

        let hashtags = keywords.iter().map(|k| hashtag(k)).collect();
        ExtractedTags { keywords, hashtags }
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(5, 5)
    }
}

fn hashtag(keyword: &str) -> String {
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => format!("#{}{}", first.to_uppercase(), chars.as_str()),
        None => "#".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_order_and_cap() {
        let text = "Drones delivered medicines. Drones! Regulators approved corridors, \
                    operators welcomed approved rules; startups expanded quickly";
        let tags = KeywordExtractor::default().extract(text);

        assert_eq!(
            tags.keywords,
            vec!["drones", "delivered", "medicines", "regulators", "approved"]
        );
        assert_eq!(
            tags.hashtags,
            vec!["#Drones", "#Delivered", "#Medicines", "#Regulators", "#Approved"]
        );
    }

    #[test]
    fn test_short_tokens_are_dropped() {
        let tags = KeywordExtractor::default().extract("The UAV flew over fields");
        assert_eq!(tags.keywords, vec!["fields"]);
    }

    #[test]
    fn test_strips_leading_and_trailing_punctuation_only() {
        let tags = KeywordExtractor::default().extract("?!surveillance... long-range");
        assert_eq!(tags.keywords, vec!["surveillance", "long-range"]);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // five characters, more than five bytes
        let tags = KeywordExtractor::default().extract("ड्रोन");
        assert!(tags.keywords.is_empty());
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert_eq!(KeywordExtractor::default().extract("   "), ExtractedTags::default());
    }
}
