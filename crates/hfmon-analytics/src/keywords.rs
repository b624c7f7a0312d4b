//! Lightweight term extraction for trend detection.
//!
//! No morphological analysis: text is cleaned, split on whitespace, and each
//! token is filtered by a fixed rule chain.

use std::collections::HashSet;

use hfmon_core::Watchlist;
use regex::Regex;

/// Vocabulary configuration for [`KeywordExtractor`].
#[derive(Debug, Clone, Default)]
pub struct KeywordRules {
    /// Tokens shorter than this many characters are dropped.
    pub min_token_len: usize,
    /// Exact-match tokens that are never candidates.
    pub stopwords: Vec<String>,
    /// Terms always kept, compared case-insensitively.
    pub protected: Vec<String>,
}

impl KeywordRules {
    /// Rules from the watchlist. Watch keywords are protected alongside the
    /// explicit `protected_terms`.
    #[must_use]
    pub fn from_watchlist(watchlist: &Watchlist) -> Self {
        Self {
            min_token_len: watchlist.min_token_len,
            stopwords: watchlist.stopwords.clone(),
            protected: watchlist
                .keywords
                .iter()
                .chain(&watchlist.protected_terms)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    min_token_len: usize,
    stopwords: HashSet<String>,
    protected: HashSet<String>,
    url_re: Regex,
    punct_re: Regex,
    digits_re: Regex,
    single_latin_re: Regex,
    jamo_only_re: Regex,
    hangul_run_re: Regex,
    latin_run_re: Regex,
}

impl KeywordExtractor {
    /// # Panics
    ///
    /// Does not panic: the patterns are fixed literals.
    #[must_use]
    pub fn new(rules: KeywordRules) -> Self {
        Self {
            min_token_len: rules.min_token_len,
            stopwords: rules.stopwords.into_iter().collect(),
            protected: rules
                .protected
                .iter()
                .map(|term| term.to_lowercase())
                .collect(),
            url_re: Regex::new(r"https?://\S+").expect("valid url regex"),
            punct_re: Regex::new(r"[[:punct:]]").expect("valid punctuation regex"),
            digits_re: Regex::new(r"[0-9]+").expect("valid digits regex"),
            single_latin_re: Regex::new(r"^[a-zA-Z]$").expect("valid latin letter regex"),
            jamo_only_re: Regex::new(r"^[ㄱ-ㅎㅏ-ㅣ]+$").expect("valid jamo regex"),
            hangul_run_re: Regex::new(r"[가-힣]{2,}").expect("valid hangul regex"),
            latin_run_re: Regex::new(r"[a-zA-Z]{3,}").expect("valid latin run regex"),
        }
    }

    #[must_use]
    pub fn from_watchlist(watchlist: &Watchlist) -> Self {
        Self::new(KeywordRules::from_watchlist(watchlist))
    }

    /// Candidate terms in `text`, in order of appearance. Duplicates are kept
    /// so callers can count frequencies.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let cleaned = self.url_re.replace_all(text, " ");
        let cleaned = self.punct_re.replace_all(&cleaned, " ");
        let cleaned = self.digits_re.replace_all(&cleaned, " ");

        cleaned
            .split_whitespace()
            .filter(|token| self.keep(token))
            .map(str::to_string)
            .collect()
    }

    fn keep(&self, token: &str) -> bool {
        if token.chars().count() < self.min_token_len {
            return false;
        }
        if self.stopwords.contains(token) {
            return false;
        }
        if self.single_latin_re.is_match(token) {
            return false;
        }
        if self.protected.contains(&token.to_lowercase()) {
            return true;
        }
        if self.jamo_only_re.is_match(token) {
            return false;
        }
        self.hangul_run_re.is_match(token) || self.latin_run_re.is_match(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::new(KeywordRules {
            min_token_len: 2,
            stopwords: vec!["관련".to_string(), "the".to_string()],
            protected: vec!["HF".to_string(), "MBS".to_string()],
        })
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn urls_punctuation_and_digits_are_removed() {
        let terms = extractor().extract("보금자리론 https://example.com/a?b=1 금리, 2024년 인하!");
        assert_eq!(terms, vec!["보금자리론", "금리", "인하"]);
    }

    #[test]
    fn digits_split_mixed_tokens() {
        // "2024년" loses its digits and leaves a single syllable, too short
        assert!(extractor().extract("2024년").is_empty());
    }

    #[test]
    fn stopwords_are_dropped() {
        assert_eq!(extractor().extract("관련 정책 the policy"), vec!["정책", "policy"]);
    }

    #[test]
    fn short_tokens_are_dropped() {
        assert!(extractor().extract("가 a").is_empty());
    }

    #[test]
    fn protected_terms_survive_case_insensitively() {
        // "hf" would fail the 3+ latin letter rule without protection
        assert_eq!(extractor().extract("hf MBS mbs xy"), vec!["hf", "MBS", "mbs"]);
    }

    #[test]
    fn jamo_only_tokens_are_dropped() {
        assert!(extractor().extract("ㅋㅋㅋ ㅠㅠ").is_empty());
    }

    #[test]
    fn token_needs_a_hangul_or_latin_run() {
        assert_eq!(extractor().extract("가a 주택연금 ab abc"), vec!["주택연금", "abc"]);
    }

    #[test]
    fn duplicates_are_preserved() {
        assert_eq!(
            extractor().extract("주택연금 주택연금 가입"),
            vec!["주택연금", "주택연금", "가입"]
        );
    }

    #[test]
    fn min_token_len_counts_characters_not_bytes() {
        let strict = KeywordExtractor::new(KeywordRules {
            min_token_len: 3,
            ..KeywordRules::default()
        });
        assert_eq!(strict.extract("금리 보금자리"), vec!["보금자리"]);
    }

    #[test]
    fn rules_from_watchlist_protect_watch_keywords() {
        let watchlist = hfmon_core::parse_watchlist(
            "keywords: [HF]\nprotected_terms: [MBS]\nstopwords: [관련]\nmin_token_len: 2",
        )
        .unwrap();
        let rules = KeywordRules::from_watchlist(&watchlist);
        assert_eq!(rules.protected, vec!["HF", "MBS"]);
        assert_eq!(rules.min_token_len, 2);
        let terms = KeywordExtractor::new(rules).extract("HF 관련 소식");
        assert_eq!(terms, vec!["HF", "소식"]);
    }
}
