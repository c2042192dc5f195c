use crate::error::PipelineError;
use crate::models::CatalogReport;
use crate::service::{CatalogService, MatcherService};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// 请求体: 按名称选择已配置的供应商, 为空时合并全部
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsolidateRequest {
    #[serde(default)]
    pub suppliers: Vec<String>,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct ConsolidateResponse {
    pub success: bool,
    pub message: String,
    pub skipped: Vec<String>,
    pub report: Option<CatalogReport>,
}

#[derive(Debug, Serialize)]
pub struct BatchMatchResponse {
    pub success: bool,
    pub message: String,
    pub records: Vec<Map<String, Value>>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 合并供应商目录
pub async fn consolidate_catalog(
    State(service): State<Arc<CatalogService>>,
    Json(req): Json<ConsolidateRequest>,
) -> Response {
    let sources = match service.select_sources(&req.suppliers) {
        Ok(sources) => sources,
        Err(e) => return failure(StatusCode::BAD_REQUEST, &e),
    };

    match service.consolidate(&sources).await {
        Ok(outcome) => {
            let response = ConsolidateResponse {
                success: true,
                message: format!(
                    "Consolidated {} products from {} sources ({} duplicates dropped)",
                    outcome.entries.len(),
                    sources.len() - outcome.skipped.len(),
                    outcome.duplicates_dropped
                ),
                skipped: outcome.skipped,
                report: Some(outcome.report),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("[Catalog] 合并失败: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

fn failure(status: StatusCode, err: &PipelineError) -> Response {
    let response = ConsolidateResponse {
        success: false,
        message: format!("Error: {}", err),
        skipped: Vec::new(),
        report: None,
    };
    (status, Json(response)).into_response()
}

/// 批量标题匹配, 返回补充了相似度和判定结果的记录
pub async fn batch_match(
    State(service): State<Arc<MatcherService>>,
    Json(records): Json<Vec<Map<String, Value>>>,
) -> Response {
    let total = records.len();

    match service.batch_match(records).await {
        Ok(records) => {
            let response = BatchMatchResponse {
                success: true,
                message: format!("Successfully matched {} records", total),
                records,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("[Match] 批量匹配失败: {}", e);
            let response = BatchMatchResponse {
                success: false,
                message: format!("Error: {}", e),
                records: Vec::new(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}
