use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// 缺失槽位的占位值
pub const NOT_AVAILABLE: &str = "not_available";
/// 未匹配时的 matched_url
pub const NOT_AVAILABLE_EVERYWHERE: &str = "not_available_everywhere";

/// 相似度并列时的取舍规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// 排名靠前的槽位优先
    EarliestSlot,
    LatestSlot,
}

/// 候选标题 (外部搜索结果)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// 1 起始
    pub slot: usize,
    pub url: String,
    pub title: String,
}

impl MatchCandidate {
    pub fn new(slot: usize, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slot,
            url: url.into(),
            title: title.into(),
        }
    }

    /// 标题为空或为占位值时视为不可用
    pub fn is_available(&self) -> bool {
        !is_placeholder(&self.title)
    }
}

pub(crate) fn is_placeholder(text: &str) -> bool {
    let t = text.trim();
    t.is_empty()
        || t.eq_ignore_ascii_case(NOT_AVAILABLE)
        || t.eq_ignore_ascii_case("not available")
}

/// 一条匹配请求: 标准标题 + 有序候选
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchQuery {
    pub id: String,
    pub serial_number: Option<String>,
    pub input_title: String,
    pub candidates: Vec<MatchCandidate>,
}

impl MatchQuery {
    /// 从采集记录 (url_i / url_i_title 扁平字段) 构造
    pub fn from_record(record: &Map<String, Value>, max_slots: usize) -> Self {
        let candidates = (1..=max_slots)
            .map(|i| {
                let url = text_field(record, &format!("url_{}", i));
                let title = text_field(record, &format!("url_{}_title", i));
                MatchCandidate::new(
                    i,
                    url.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    title.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                )
            })
            .collect();

        Self {
            id: text_field(record, "id").unwrap_or_default(),
            serial_number: text_field(record, "serial_number"),
            input_title: text_field(record, "input_title").unwrap_or_default(),
            candidates,
        }
    }
}

/// 字符串或数字字段转为文本, 空值返回 None
fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Matched,
    Unmatched,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Matched => "MATCHED",
            MatchStatus::Unmatched => "UNMATCHED",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 匹配结论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 槽位 -> 相似度 (已舍入), 不可用槽位不出现
    pub per_slot_similarity: BTreeMap<usize, f64>,
    pub best_similarity: f64,
    pub best_slot: Option<usize>,
    pub matched_url: String,
    pub status: MatchStatus,
}

impl MatchResult {
    /// 把相似度、最佳相似度、匹配URL和状态写回原始记录
    pub fn augment(&self, record: &mut Map<String, Value>) {
        for (slot, score) in &self.per_slot_similarity {
            record.insert(format!("url_{}_similarity", slot), Value::from(*score));
        }
        record.insert("best_similarity".to_string(), Value::from(self.best_similarity));
        record.insert("matched_url".to_string(), Value::from(self.matched_url.clone()));
        record.insert("status".to_string(), Value::from(self.status.as_str()));
    }
}

/// 匹配结果汇总表 (url_similarity_results)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: String,
    pub serial_number: Option<String>,
    pub input_title: String,
    pub matched_url: String,
    pub status: MatchStatus,
    pub best_similarity: f64,
    pub processed_at: DateTime<Utc>,
}

impl MatchSummary {
    pub fn new(query: &MatchQuery, result: &MatchResult, processed_at: DateTime<Utc>) -> Self {
        Self {
            id: query.id.clone(),
            serial_number: query.serial_number.clone(),
            input_title: query.input_title.clone(),
            matched_url: result.matched_url.clone(),
            status: result.status,
            best_similarity: result.best_similarity,
            processed_at,
        }
    }
}
