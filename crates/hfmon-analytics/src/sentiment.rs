//! Rule-based lexicon classifier for Korean media mentions.

use hfmon_core::{RawDocument, Sentiment};
use serde::{Deserialize, Serialize};

use crate::types::AnalyzedDocument;

/// Terms that signal a favorable mention. Matched as substrings.
pub(crate) const POSITIVE_TERMS: &[&str] = &[
    "좋은", "훌륭한", "우수한", "탁월한", "성공", "성장", "증가", "향상", "개선", "혜택",
    "지원", "보호", "안전", "안정", "신뢰", "확대", "강화", "활성화", "추진", "달성",
    "완료", "해결", "획득", "승인", "긍정", "호조", "상승", "회복", "정상", "원활",
    "효율", "효과", "최고", "최우수", "적극", "우대", "편리", "신속", "정확", "투명",
    "공정", "합리", "도움", "지지", "응원", "기대", "희망", "만족", "인정", "수혜",
    "유리", "긍정적", "호평", "인기", "수요증가", "흑자", "절감", "우호", "환영",
    "혜택확대", "금리인하", "지원확대", "조건완화", "혜택증가",
];

/// Terms that signal an unfavorable mention. Matched as substrings.
pub(crate) const NEGATIVE_TERMS: &[&str] = &[
    "우려", "문제", "위기", "위험", "손실", "감소", "하락", "악화", "부실", "부담",
    "논란", "갈등", "비판", "반발", "거부", "거절", "실패", "취소", "지연", "중단",
    "파산", "도산", "손해", "피해", "사기", "부정", "불법", "위반", "제재", "처벌",
    "소송", "고발", "조사", "수사", "적발", "발각", "스캔들", "사고", "오류", "결함",
    "불만", "항의", "거센", "비난", "폭락", "급락", "급등", "혼란", "불안", "공포",
    "충격", "경고", "적자", "부채", "연체", "부도", "디폴트", "위축", "침체", "불황",
    "규제강화", "금리인상", "문제점", "리스크", "부담증가", "조건강화", "자격박탈",
    "사태", "횡령", "배임", "비리", "부정부패", "불투명", "논쟁", "분쟁",
];

/// Negation particles. Any occurrence anywhere in the text adds
/// [`NEGATION_PENALTY`] to the negative tally, regardless of position.
pub(crate) const NEGATION_MARKERS: &[&str] = &["아니", "않", "못", "불", "비", "무", "미"];

const NEGATION_PENALTY: f64 = 0.5;

/// Share of the net tally that must be exceeded to leave neutral.
const LABEL_THRESHOLD: f64 = 0.2;

/// Label plus continuous score in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub score: f64,
}

impl SentimentResult {
    const NEUTRAL: Self = Self {
        sentiment: Sentiment::Neutral,
        score: 0.0,
    };
}

/// Classify a document from its title and body.
///
/// Lexicon entries are counted once each if they appear anywhere in the
/// lower-cased `"{title} {text}"`. The net ratio `(p - n) / (p + n)` decides the
/// label: above `0.2` positive, below `-0.2` negative, otherwise neutral.
#[must_use]
pub fn classify(title: &str, text: &str) -> SentimentResult {
    let full_text = format!("{title} {text}").to_lowercase();

    let positive = count_present(&full_text, POSITIVE_TERMS);
    let mut negative = count_present(&full_text, NEGATIVE_TERMS);

    for marker in NEGATION_MARKERS {
        if full_text.contains(marker) {
            negative += NEGATION_PENALTY;
        }
    }

    let total = positive + negative;
    if total == 0.0 {
        return SentimentResult::NEUTRAL;
    }

    let raw = (positive - negative) / total;
    if raw > LABEL_THRESHOLD {
        SentimentResult {
            sentiment: Sentiment::Positive,
            score: raw.min(1.0),
        }
    } else if raw < -LABEL_THRESHOLD {
        SentimentResult {
            sentiment: Sentiment::Negative,
            score: raw.max(-1.0),
        }
    } else {
        SentimentResult {
            sentiment: Sentiment::Neutral,
            score: raw,
        }
    }
}

fn count_present(text: &str, terms: &[&str]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let hits = terms.iter().filter(|term| text.contains(*term)).count() as f64;
    hits
}

/// Classify every document once, preserving input order.
#[must_use]
pub fn classify_all(documents: Vec<RawDocument>) -> Vec<AnalyzedDocument> {
    documents
        .into_iter()
        .map(|document| {
            let result = classify(&document.title, &document.text);
            AnalyzedDocument {
                document,
                sentiment: result.sentiment,
                sentiment_score: result.score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn lexicons_are_disjoint() {
        let positive: HashSet<_> = POSITIVE_TERMS.iter().collect();
        let negative: HashSet<_> = NEGATIVE_TERMS.iter().collect();
        assert!(positive.is_disjoint(&negative));
    }

    #[test]
    fn empty_text_is_neutral_zero() {
        assert_eq!(classify("", ""), SentimentResult::NEUTRAL);
    }

    #[test]
    fn unknown_text_is_neutral_zero() {
        let result = classify("the quick brown fox", "");
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn positive_terms_only_is_fully_positive() {
        let result = classify("보금자리론 실적 성장", "성공적인 달성");
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn negative_terms_only_is_fully_negative() {
        let result = classify("전세자금보증 사기 의혹", "피해 확산");
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.score, -1.0);
    }

    #[test]
    fn terms_are_counted_once_regardless_of_repeats() {
        // 성공 x3 still counts one; 위기 counts one: raw = 0
        let result = classify("성공 성공 성공", "위기");
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn compound_terms_count_alongside_their_parts() {
        assert_eq!(
            classify("집값 급등", ""),
            SentimentResult {
                sentiment: Sentiment::Negative,
                score: -1.0,
            }
        );
        // 긍정 and 긍정적 both match.
        assert_eq!(classify("긍정적 평가", "").score, 1.0);
        // 부담, 부담증가 against 증가: raw = (1 - 2) / 3
        let result = classify("이자 부담증가", "");
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert!((result.score + 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn negation_marker_anywhere_adds_half_point() {
        // p = 1 (성공), n = 0.5 (않): raw = 0.5 / 1.5 = 0.333..
        let result = classify("성공", "그렇지 않다");
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert!((result.score - 1.0 / 3.0).abs() < 1e-12, "got {}", result.score);
    }

    #[test]
    fn negation_alone_is_negative() {
        let result = classify("못 가요", "");
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.score, -1.0);
    }

    #[test]
    fn near_balance_stays_neutral_with_raw_score() {
        // p = 3 (성공, 성장, 개선), n = 2 (위기, 손실): raw = 0.2, not > 0.2
        let result = classify("성공 성장 개선", "위기 손실");
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert!((result.score - 0.2).abs() < 1e-12, "got {}", result.score);
    }

    #[test]
    fn latin_text_is_lower_cased_before_matching() {
        // No Latin lexicon entries: stays neutral even when upper-cased.
        assert_eq!(classify("GREAT", "NEWS").sentiment, Sentiment::Neutral);
    }

    #[test]
    fn classification_is_idempotent() {
        let a = classify("보금자리론 금리 인하 결정", "서민 주거 안정 지원 확대");
        let b = classify("보금자리론 금리 인하 결정", "서민 주거 안정 지원 확대");
        assert_eq!(a, b);
    }
}
