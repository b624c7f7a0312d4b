//! Rule-based narrative summary and response guide for an analytics result.

use chrono::{DateTime, Utc};
use hfmon_core::Sentiment;
use serde::{Deserialize, Serialize};

use crate::aggregate::percent;
use crate::types::{AnalyticsResult, TrendKeyword};

const MAX_KEY_ISSUES: usize = 7;
const MAX_MONITORING_KEYWORDS: usize = 5;
const ISSUE_TITLE_CHARS: usize = 50;

/// Negative share (percent) above which the ratio itself is reported as an issue.
const NEGATIVE_RATIO_ISSUE_PCT: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub q: String,
    pub a: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseGuide {
    pub fact_check: Vec<String>,
    pub faq: Vec<FaqEntry>,
    pub notice_short: String,
    pub notice_long: String,
    pub monitoring_keywords: Vec<String>,
    pub escalation_criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: String,
    pub key_issues: Vec<String>,
    pub response_guide: ResponseGuide,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub from_cache: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    positive: usize,
    neutral: usize,
    negative: usize,
}

/// Summarize `analytics`, stamped with the current time.
#[must_use]
pub fn summarize(analytics: &AnalyticsResult) -> SummaryReport {
    summarize_at(analytics, Utc::now())
}

#[must_use]
pub fn summarize_at(analytics: &AnalyticsResult, generated_at: DateTime<Utc>) -> SummaryReport {
    let meta = &analytics.meta;
    let totals = analytics
        .sentiment
        .iter()
        .fold(Totals::default(), |acc, point| Totals {
            positive: acc.positive + point.positive,
            neutral: acc.neutral + point.neutral,
            negative: acc.negative + point.negative,
        });

    let total_docs = meta.total_documents;
    let negative_pct = percent(totals.negative, total_docs);
    let has_spike = analytics.negative_spikes.iter().any(|s| s.is_spike);
    let trending: Vec<&TrendKeyword> = analytics
        .trend_keywords
        .iter()
        .filter(|k| k.is_trending)
        .take(5)
        .collect();

    let mut sentences = vec![
        format!(
            "{} ~ {} 기간 동안 총 {total_docs}건의 문서가 수집되었습니다.",
            meta.start_date, meta.end_date
        ),
        format!(
            "감성 분포는 긍정 {}건({}%), 중립 {}건, 부정 {}건({negative_pct}%)입니다.",
            totals.positive,
            percent(totals.positive, total_docs),
            totals.neutral,
            totals.negative,
        ),
        if has_spike {
            "부정 언급 급증 구간이 감지되었습니다. 모니터링 강화가 필요합니다.".to_string()
        } else {
            "특이한 부정 급증 구간은 감지되지 않았습니다.".to_string()
        },
    ];
    if !trending.is_empty() {
        sentences.push(format!("트렌드 키워드: {}", join_keywords(&trending)));
    }

    let mut key_issues = Vec::new();
    if has_spike {
        key_issues.push("부정 언급 급증 구간 감지, 즉시 대응 필요".to_string());
    }
    if negative_pct > NEGATIVE_RATIO_ISSUE_PCT {
        key_issues.push(format!("부정 언급 비율 {negative_pct}%, 대응 필요"));
    }
    for doc in analytics
        .top_documents
        .iter()
        .filter(|d| d.sentiment == Sentiment::Negative)
        .take(3)
    {
        let title: String = doc.document.title.chars().take(ISSUE_TITLE_CHARS).collect();
        key_issues.push(format!("부정 이슈: {title}..."));
    }
    if !trending.is_empty() {
        let detail = trending
            .iter()
            .map(|k| format!("{}(z={})", k.keyword, k.zscore))
            .collect::<Vec<_>>()
            .join(", ");
        key_issues.push(format!("트렌드 키워드 급상승: {detail}"));
    }
    if key_issues.is_empty() {
        key_issues.push("현재 기간 내 특이 이슈 없음".to_string());
        key_issues.push("일반 모니터링 지속 권장".to_string());
    }
    key_issues.truncate(MAX_KEY_ISSUES);

    let mut monitoring_keywords: Vec<String> = meta.keywords.iter().take(3).cloned().collect();
    monitoring_keywords.extend(trending.iter().take(2).map(|k| k.keyword.clone()));
    monitoring_keywords.truncate(MAX_MONITORING_KEYWORDS);

    let headline_keywords = meta
        .keywords
        .iter()
        .take(3)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    SummaryReport {
        summary: sentences.join(" "),
        key_issues,
        response_guide: ResponseGuide {
            fact_check: vec![
                format!("{} 관련 보도 사실 여부 확인", meta.keywords.join("/")),
                "공식 발표 내용과 언론 보도 내용 대조".to_string(),
                "수치 오류 여부 확인 (금리, 한도, 조건 등)".to_string(),
                "출처 신뢰성 검토 (주요 언론사 대 블로그/커뮤니티)".to_string(),
                "시간적 맥락 확인 (과거 정책과 현행 정책 혼동 여부)".to_string(),
            ],
            faq: default_faq(),
            notice_short: format!(
                "한국주택금융공사는 {}~{} 기간 발생한 관련 이슈를 면밀히 모니터링하고 있으며, 고객 불편을 최소화하기 위해 최선을 다하겠습니다.",
                meta.start_date, meta.end_date
            ),
            notice_long: format!(
                "한국주택금융공사(HF)는 최근 온라인상에서 발생한 {headline_keywords} 관련 보도 및 커뮤니티 게시글에 신속하게 대응하고 있습니다.\n\n\
                 정확한 정보는 공식 채널(홈페이지, 고객센터)을 통해 확인하시기 바랍니다. \
                 잘못된 정보로 인한 혼란이 없도록 지속적으로 모니터링하고 있으며, 필요한 경우 해명 자료를 배포할 예정입니다."
            ),
            monitoring_keywords,
            escalation_criteria: vec![
                "일별 부정 언급 30건 초과 시 긴급 대응팀 알림".to_string(),
                "부정 언급 비율 40% 초과 시 상위 보고".to_string(),
                "트렌드 키워드 z-score 3.0 이상 시 즉시 검토".to_string(),
                "주요 언론사 부정 보도 발생 시 즉각 대응".to_string(),
                "커뮤니티 부정 게시글 100건 초과 시 FAQ 갱신".to_string(),
            ],
        },
        generated_at,
        from_cache: false,
    }
}

fn join_keywords(keywords: &[&TrendKeyword]) -> String {
    keywords
        .iter()
        .map(|k| k.keyword.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn default_faq() -> Vec<FaqEntry> {
    [
        (
            "한국주택금융공사의 주요 역할은 무엇인가요?",
            "주택담보대출 유동화, 주택연금, 전세자금보증 등을 통해 국민 주거 안정을 지원하는 공공기관입니다.",
        ),
        (
            "보금자리론은 누가 신청할 수 있나요?",
            "소득과 주택 가격 요건을 충족하는 무주택 세대주가 신청할 수 있으며, 세부 요건은 공식 홈페이지에서 확인할 수 있습니다.",
        ),
        (
            "주택연금이란 무엇인가요?",
            "소유 주택을 담보로 평생 매월 연금을 받는 역모기지 상품입니다.",
        ),
        (
            "전세자금보증 신청은 어떻게 하나요?",
            "전세 계약 후 금융기관에서 신청하며, 보증 한도와 조건은 지역과 소득, 자산에 따라 다릅니다.",
        ),
        (
            "MBS란 무엇인가요?",
            "주택담보대출을 기초로 발행되는 주택저당증권으로, 장기 주택금융의 안정적 공급을 지원합니다.",
        ),
    ]
    .into_iter()
    .map(|(q, a)| FaqEntry {
        q: q.to_string(),
        a: a.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use hfmon_core::{document_id, Channel, Granularity, RawDocument};

    use super::*;
    use crate::aggregate::{aggregate_at, AggregateInput};
    use crate::keywords::{KeywordExtractor, KeywordRules};

    fn analytics(titles: &[&str]) -> AnalyticsResult {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let documents = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let url = format!("https://news.example/{i}");
                RawDocument {
                    id: document_id(Channel::News, "HF", &url, &at),
                    channel: Channel::News,
                    keyword: "HF".to_string(),
                    title: (*title).to_string(),
                    text: String::new(),
                    url,
                    published_at: at,
                    fetched_at: at,
                    source_meta: serde_json::Map::new(),
                }
            })
            .collect();
        aggregate_at(
            AggregateInput {
                documents,
                start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
                granularity: Granularity::Monthly,
                keywords: vec!["HF".to_string(), "보금자리론".to_string()],
                channels: vec![Channel::News],
                collect_statuses: Vec::new(),
            },
            &KeywordExtractor::new(KeywordRules {
                min_token_len: 2,
                ..KeywordRules::default()
            }),
            at,
        )
    }

    #[test]
    fn quiet_period_reports_no_issues() {
        let report = summarize(&analytics(&["공지", "소식"]));
        assert!(report.summary.contains("총 2건"));
        assert!(report.summary.contains("감지되지 않았습니다"));
        assert_eq!(report.key_issues.len(), 2);
        assert_eq!(report.key_issues[0], "현재 기간 내 특이 이슈 없음");
        assert!(!report.from_cache);
    }

    #[test]
    fn high_negative_ratio_and_titles_become_issues() {
        let report = summarize(&analytics(&["전세 사기 의혹", "손실 발생", "소식"]));
        assert!(report.key_issues.iter().any(|i| i.starts_with("부정 언급 비율 67%")));
        let titled = report
            .key_issues
            .iter()
            .filter(|i| i.starts_with("부정 이슈:"))
            .count();
        assert_eq!(titled, 2);
    }

    #[test]
    fn long_titles_are_truncated_by_characters() {
        let long = "위기".repeat(40);
        let report = summarize(&analytics(&[&long]));
        let issue = report
            .key_issues
            .iter()
            .find(|i| i.starts_with("부정 이슈:"))
            .unwrap();
        assert_eq!(issue.chars().count(), "부정 이슈: ".chars().count() + 50 + 3);
    }

    #[test]
    fn monitoring_keywords_start_with_watch_keywords() {
        let report = summarize(&analytics(&["소식"]));
        assert_eq!(
            report.response_guide.monitoring_keywords[..2],
            ["HF".to_string(), "보금자리론".to_string()]
        );
        assert!(report.response_guide.fact_check[0].starts_with("HF/보금자리론"));
    }

    #[test]
    fn faq_covers_each_core_product() {
        let report = summarize(&analytics(&["소식"]));
        let questions: Vec<_> = report
            .response_guide
            .faq
            .iter()
            .map(|entry| entry.q.as_str())
            .collect();
        assert_eq!(questions.len(), 5);
        for product in ["보금자리론", "주택연금", "전세자금보증", "MBS"] {
            assert!(
                questions.iter().any(|q| q.contains(product)),
                "no FAQ entry for {product}"
            );
        }
    }

    #[test]
    fn empty_result_does_not_divide_by_zero() {
        let report = summarize(&analytics(&[]));
        assert!(report.summary.contains("긍정 0건(0%)"));
    }
}
