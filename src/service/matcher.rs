use crate::db::queries;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{MatchQuery, MatchStatus, MatchSummary};
use crate::service::resolver::MatchResolver;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::sync::Arc;

/// 标题匹配服务
pub struct MatcherService {
    pool: PgPool,
    resolver: Arc<MatchResolver>,
    max_slots: usize,
}

impl MatcherService {
    pub fn new(pool: PgPool, resolver: MatchResolver, max_slots: usize) -> Self {
        Self {
            pool,
            resolver: Arc::new(resolver),
            max_slots,
        }
    }

    /// 批量匹配: 计算相似度 -> 回写记录 -> 汇总入库
    pub async fn batch_match(
        &self,
        records: Vec<Map<String, Value>>,
    ) -> PipelineResult<Vec<Map<String, Value>>> {
        let resolver = Arc::clone(&self.resolver);
        let max_slots = self.max_slots;

        let (records, summaries) =
            tokio::task::spawn_blocking(move || match_records(&resolver, max_slots, records))
                .await
                .map_err(|e| PipelineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        for chunk in summaries.chunks(queries::INSERT_CHUNK_SIZE) {
            queries::insert_match_summaries(&self.pool, chunk).await?;
        }

        Ok(records)
    }
}

/// 纯计算部分: 解析记录、判定、回写, 返回增强后的记录和汇总行
pub fn match_records(
    resolver: &MatchResolver,
    max_slots: usize,
    mut records: Vec<Map<String, Value>>,
) -> (Vec<Map<String, Value>>, Vec<MatchSummary>) {
    let queries: Vec<MatchQuery> = records
        .iter()
        .map(|r| MatchQuery::from_record(r, max_slots))
        .collect();

    tracing::info!("[Match] 开始匹配 {} 条记录", queries.len());
    let results = resolver.resolve_batch(&queries);

    let processed_at = Utc::now();
    let mut summaries = Vec::with_capacity(results.len());
    let mut matched_count = 0;

    for ((record, query), result) in records.iter_mut().zip(&queries).zip(&results) {
        result.augment(record);

        match result.status {
            MatchStatus::Matched => {
                matched_count += 1;
                tracing::debug!(
                    "[Match] ID={} 匹配成功 (similarity={:.3}) -> {}",
                    query.id,
                    result.best_similarity,
                    result.matched_url
                );
            }
            MatchStatus::Unmatched => tracing::info!(
                "[Match] ID={} 未找到匹配 (max similarity={:.3})",
                query.id,
                result.best_similarity
            ),
        }

        summaries.push(MatchSummary::new(query, result, processed_at));
    }

    tracing::info!(
        "[Match] 匹配完成: 总数 {}, 已匹配 {}, 阈值 {}",
        queries.len(),
        matched_count,
        resolver.threshold()
    );

    (records, summaries)
}
