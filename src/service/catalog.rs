use crate::config::{CatalogConfig, SourceConfig};
use crate::db::{files, queries};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{CatalogReport, MasterCatalogEntry};
use crate::service::consolidator::consolidate;
use crate::service::normalizer::CatalogNormalizer;
use chrono::Utc;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 一次合并的结果
#[derive(Debug, Clone)]
pub struct CatalogOutcome {
    pub entries: Vec<MasterCatalogEntry>,
    pub report: CatalogReport,
    /// 因文件缺失或无法读取而跳过的供应商
    pub skipped: Vec<String>,
    pub duplicates_dropped: usize,
}

/// 商品目录合并服务
pub struct CatalogService {
    pool: PgPool,
    config: CatalogConfig,
    normalizer: Arc<CatalogNormalizer>,
    /// 同一时间只允许一次合并 (输出文件和 products 表)
    run_lock: Mutex<()>,
}

impl CatalogService {
    pub fn new(pool: PgPool, config: CatalogConfig) -> Self {
        let normalizer = Arc::new(CatalogNormalizer::from_config(&config));
        Self {
            pool,
            config,
            normalizer,
            run_lock: Mutex::new(()),
        }
    }

    /// 按供应商名选择已配置的数据源, 为空时选择全部
    pub fn select_sources(&self, suppliers: &[String]) -> PipelineResult<Vec<SourceConfig>> {
        select_sources(&self.config.sources, suppliers)
    }

    /// 合并 -> 导出 CSV 和报告 -> 替换 products 表
    pub async fn consolidate(&self, sources: &[SourceConfig]) -> PipelineResult<CatalogOutcome> {
        let _guard = self.run_lock.lock().await;

        let normalizer = Arc::clone(&self.normalizer);
        let owned_sources = sources.to_vec();
        let output_path = PathBuf::from(&self.config.output_path);
        let report_path = PathBuf::from(&self.config.report_path);

        let outcome = tokio::task::spawn_blocking(move || -> PipelineResult<CatalogOutcome> {
            let outcome = build_master_catalog(&normalizer, &owned_sources)?;
            files::export_master_catalog_csv(&outcome.entries, &output_path)?;
            files::export_report_csv(&outcome.report, &report_path)?;
            tracing::info!("[Catalog] 已导出 {} 和 {}", output_path.display(), report_path.display());
            Ok(outcome)
        })
        .await
        .map_err(|e| PipelineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

        queries::ensure_schema(&self.pool).await?;
        queries::replace_products(&self.pool, &outcome.entries, sources, Utc::now()).await?;

        Ok(outcome)
    }
}

/// 请求只能引用配置中的供应商, 不接受文件路径
pub fn select_sources(
    configured: &[SourceConfig],
    suppliers: &[String],
) -> PipelineResult<Vec<SourceConfig>> {
    if suppliers.is_empty() {
        return Ok(configured.to_vec());
    }

    let unknown: Vec<String> = suppliers
        .iter()
        .filter(|name| !configured.iter().any(|s| &s.supplier == *name))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(PipelineError::UnknownSupplier { names: unknown });
    }

    Ok(configured
        .iter()
        .filter(|s| suppliers.contains(&s.supplier))
        .cloned()
        .collect())
}

/// 读取并标准化所有供应商, 合并为主目录
///
/// 文件缺失或无法读取的供应商跳过并告警; 缺少商品名列则整体失败。
pub fn build_master_catalog(
    normalizer: &CatalogNormalizer,
    sources: &[SourceConfig],
) -> PipelineResult<CatalogOutcome> {
    let mut batches = Vec::with_capacity(sources.len());
    let mut skipped = Vec::new();

    for source in sources {
        let path = Path::new(&source.path);
        if !path.is_file() {
            let err = PipelineError::MissingInput {
                supplier: source.supplier.clone(),
                path: path.to_path_buf(),
            };
            tracing::warn!("[Catalog] 跳过: {}", err);
            skipped.push(source.supplier.clone());
            continue;
        }

        let raw = match files::read_source_csv(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("[Catalog] 跳过 {}: 无法读取 {}: {}", source.supplier, path.display(), e);
                skipped.push(source.supplier.clone());
                continue;
            }
        };
        tracing::info!(
            "[Catalog] {}: 开始处理 {} ({} 行)",
            source.supplier,
            path.display(),
            raw.records.len()
        );
        batches.push(normalizer.normalize(&source.supplier, raw)?);
    }

    let consolidation = consolidate(batches);
    let report = CatalogReport::from_catalog(&consolidation.entries);

    Ok(CatalogOutcome {
        entries: consolidation.entries,
        report,
        skipped,
        duplicates_dropped: consolidation.duplicates_dropped,
    })
}
