//! Synthetic documents for demos and offline development.
//!
//! The generator is seeded, so the same request always yields the same
//! documents. Output goes through the real [`aggregate`](crate::aggregate)
//! pipeline rather than fabricating aggregates directly.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use hfmon_core::{document_id, Channel, CollectStatus, Granularity, RawDocument};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use crate::aggregate::{aggregate_at, AggregateInput};
use crate::keywords::KeywordExtractor;
use crate::types::AnalyticsResult;

pub const DEFAULT_SEED: u64 = 20_240_101;

const NEWS_TITLES: &[&str] = &[
    "한국주택금융공사, 보금자리론 금리 인하 결정",
    "주택연금 수령액 상향 개정안 발표",
    "전세자금보증 사기 의혹, 주금공 조사 착수",
    "보금자리론 한도 확대 검토",
    "MBS 발행 규모 역대 최대... 시장 우려 목소리",
    "한국주택금융공사 연간 보증 규모 집계",
    "전세보증 신청자 급증, 접수 지연 사태",
    "주택연금 가입자 50만 명 달성",
    "커버드본드 지급보증 관련 규제강화 논의",
    "저소득층 보금자리론 우대금리 확대",
    "건설자금보증 부실 우려... 업계 긴장",
    "주금공, 디지털 전환 가속화 발표",
    "보금자리론 2년 연속 실적 성장",
];

const YOUTUBE_TITLES: &[&str] = &[
    "보금자리론 완벽 가이드 - 자격요건부터 신청까지",
    "주택연금 가입 전 알아야 할 5가지",
    "전세사기 예방법, 전세자금보증 활용하기",
    "한국주택금융공사 논란 총정리",
    "MBS란 무엇인가? 주택시장과의 관계",
];

const DC_TITLES: &[&str] = &[
    "보금자리론 신청했는데 거절됨 이유가 뭔가요",
    "주택연금 진짜 가입할만한가요 후기 궁금",
    "전세사기 당한 것 같아요 보증 소용없네요",
    "주금공 대출 심사 기준 바뀐 건가요",
    "MBS 금리 오르면 보금자리론도 오르나요",
    "주택연금 신청 완료했습니다 도움 많이 받았어요",
];

const BLOG_TITLES: &[&str] = &[
    "[후기] 보금자리론으로 내집마련 성공했어요",
    "주택연금 신청 과정 정리",
    "전세자금보증 피해 사례 공유합니다",
    "보금자리론과 시중은행 금리 분석",
    "전세보증 신청했는데 거절됐어요",
];

const TISTORY_TITLES: &[&str] = &[
    "보금자리론 올해 달라진 점 총정리",
    "주택연금 수령액 계산법과 실제 사례",
    "전세자금보증 한도와 조건 정리",
    "보금자리론 거절 사유 TOP 5",
];

const BLIND_TITLES: &[&str] = &[
    "한국주택금융공사 재직자인데 내부 분위기",
    "주금공 직원이 말하는 보금자리론 심사 기준",
    "전세사기 관련 보증 이게 말이 되냐",
    "주택금융공사 채용 정보 공유",
];

const INSTAGRAM_TITLES: &[&str] = &[
    "#보금자리론 #내집마련 드디어 성공했어요",
    "#주택연금 부모님께 신청해드렸어요 만족",
    "#전세사기 조심하세요 피해 보지 마세요",
    "#보금자리론 금리 너무 높아졌어요 #주거비부담",
];

struct ChannelPlan {
    channel: Channel,
    count: usize,
    titles: &'static [&'static str],
}

const PLANS: &[ChannelPlan] = &[
    ChannelPlan { channel: Channel::News, count: 30, titles: NEWS_TITLES },
    ChannelPlan { channel: Channel::Youtube, count: 15, titles: YOUTUBE_TITLES },
    ChannelPlan { channel: Channel::Dc, count: 25, titles: DC_TITLES },
    ChannelPlan { channel: Channel::Blog, count: 20, titles: BLOG_TITLES },
    ChannelPlan { channel: Channel::Tistory, count: 15, titles: TISTORY_TITLES },
    ChannelPlan { channel: Channel::Blind, count: 12, titles: BLIND_TITLES },
    ChannelPlan { channel: Channel::Instagram, count: 15, titles: INSTAGRAM_TITLES },
];

/// Seeded synthetic documents for `channels`, spread over
/// `[start 00:00, end 23:59:59]` UTC. Keywords rotate through `keywords`.
#[must_use]
pub fn generate_documents(
    start: NaiveDate,
    end: NaiveDate,
    keywords: &[String],
    channels: &[Channel],
    seed: u64,
) -> Vec<RawDocument> {
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let window_start = start.and_time(NaiveTime::MIN).and_utc();
    let span_secs = (end.and_time(NaiveTime::MIN).and_utc() - window_start).num_seconds() + 86_399;
    let fetched_at = end.and_time(NaiveTime::MIN).and_utc();

    let mut documents = Vec::new();
    for plan in PLANS.iter().filter(|p| channels.contains(&p.channel)) {
        let mut timestamps: Vec<DateTime<Utc>> = (0..plan.count)
            .map(|_| window_start + Duration::seconds(rng.random_range(0..=span_secs.max(0))))
            .collect();
        timestamps.sort();

        for (i, published_at) in timestamps.into_iter().enumerate() {
            let keyword = &keywords[i % keywords.len()];
            let title = plan.titles[i % plan.titles.len()];
            let url = demo_url(plan.channel, i);
            documents.push(RawDocument {
                id: document_id(plan.channel, keyword, &url, &published_at),
                channel: plan.channel,
                keyword: keyword.clone(),
                title: title.to_string(),
                text: demo_text(plan.channel, title, keyword),
                url,
                published_at,
                fetched_at,
                source_meta: demo_meta(plan.channel, i, &mut rng),
            });
        }
    }

    documents
}

/// Demo analytics: synthetic documents aggregated exactly like collected ones.
/// Every requested channel reports a `success` status.
#[must_use]
pub fn demo_analytics(
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
    keywords: Vec<String>,
    channels: Vec<Channel>,
    extractor: &KeywordExtractor,
    seed: u64,
) -> AnalyticsResult {
    let documents = generate_documents(start, end, &keywords, &channels, seed);
    let collect_statuses = channels
        .iter()
        .map(|&channel| {
            let count = documents.iter().filter(|d| d.channel == channel).count();
            CollectStatus {
                channel,
                source: "demo".to_string(),
                keyword: None,
                status: hfmon_core::CollectState::Success,
                count,
                error: None,
            }
        })
        .collect();

    aggregate_at(
        AggregateInput {
            documents,
            start_date: start,
            end_date: end,
            granularity,
            keywords,
            channels,
            collect_statuses,
        },
        extractor,
        Utc::now(),
    )
}

fn demo_url(channel: Channel, i: usize) -> String {
    match channel {
        Channel::News => format!("https://news.example.com/articles/{i}"),
        Channel::Youtube => format!("https://www.youtube.com/watch?v=demo{i}"),
        Channel::Dc => format!(
            "https://gall.dcinside.com/board/view/?id=immovables&no={}",
            10_000 + i
        ),
        Channel::Blog => format!("https://blog.naver.com/demo_user/{i}"),
        Channel::Tistory => format!("https://demo-finance.tistory.com/{i}"),
        Channel::Blind => format!("https://www.teamblind.com/kr/post/demo-{i}"),
        Channel::Instagram => format!("https://www.instagram.com/p/demo{i}/"),
    }
}

fn demo_text(channel: Channel, title: &str, keyword: &str) -> String {
    match channel {
        Channel::News => format!("{title}. 서민 주거 안정을 위한 정책의 일환으로 추진된다."),
        Channel::Youtube => format!("{title}. 이 영상에서는 {keyword} 관련 최신 정보를 알아봅니다."),
        Channel::Dc => format!("{title}. 갤러리 회원들 사이에서 논의가 활발합니다."),
        Channel::Blog | Channel::Tistory => {
            format!("{title}. 이 글에서는 {keyword} 관련 경험과 정보를 공유합니다.")
        }
        Channel::Blind => format!("{title}. 현직자 의견입니다."),
        Channel::Instagram => format!("{title} {keyword} 관련 이슈"),
    }
}

const NEWS_SOURCES: &[&str] = &["조선일보", "한겨레", "중앙일보", "경향신문", "매일경제"];
const YOUTUBE_CHANNELS: &[&str] = &["부동산TV", "금융채널", "주거복지TV"];
const DC_GALLERIES: &[&str] = &["부동산", "금융", "대출"];
const BLIND_COMPANIES: &[&str] = &["공기업", "시중은행", "부동산업계"];

fn pick(items: &[&'static str], i: usize) -> &'static str {
    items[i % items.len()]
}

fn demo_meta(channel: Channel, i: usize, rng: &mut StdRng) -> Map<String, Value> {
    let value = match channel {
        Channel::News => json!({ "source": pick(NEWS_SOURCES, i) }),
        Channel::Youtube => json!({
            "video_id": format!("demo{i}"),
            "channel_title": pick(YOUTUBE_CHANNELS, i),
            "view_count": rng.random_range(1_000..=100_000u64),
            "like_count": rng.random_range(10..=5_000u64),
        }),
        Channel::Dc => json!({
            "gallery_name": pick(DC_GALLERIES, i),
            "comment_count": rng.random_range(0..=50u64),
        }),
        Channel::Blog => json!({ "source": "naver_blog", "blogger_name": format!("blogger{}", i % 4) }),
        Channel::Tistory => json!({ "source": "tistory", "blogger_name": format!("writer{}", i % 3) }),
        Channel::Blind => json!({ "source": "blind", "company": pick(BLIND_COMPANIES, i) }),
        Channel::Instagram => json!({ "source": "instagram", "like_count": rng.random_range(10..=5_000u64) }),
    };
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
