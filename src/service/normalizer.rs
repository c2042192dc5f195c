use crate::config::{CatalogConfig, ColumnAlias};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{CanonicalField, NormalizedRecord, RawBatch, RawRecord, SourceBatch};
use crate::service::carton::extract_units_per_carton;
use crate::service::packaging::{PackagingClassifier, PackagingStrategy};
use crate::service::units::extract_weight_quantity;
use indexmap::IndexMap;
use rayon::prelude::*;

/// 供应商数据标准化
///
/// 列名映射 -> 校验商品名列 -> 逐行提取重量/箱规/包装类型 -> 标记供应商。
/// 行与行之间无共享状态, 按行并行。
#[derive(Debug, Clone)]
pub struct CatalogNormalizer {
    /// 小写列名 -> 标准字段
    aliases: IndexMap<String, CanonicalField>,
    packaging: PackagingClassifier,
}

impl CatalogNormalizer {
    pub fn new(aliases: &[ColumnAlias], packaging: PackagingClassifier) -> Self {
        let mut table = IndexMap::new();
        for alias in aliases {
            for name in &alias.aliases {
                let key = alias_key(name);
                if !key.is_empty() {
                    table.entry(key).or_insert(alias.field);
                }
            }
        }
        Self {
            aliases: table,
            packaging,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(
            &config.column_aliases,
            PackagingClassifier::from_overrides(&config.packaging_overrides),
        )
    }

    /// 原始列名 -> 标准列名; 同一标准字段只取第一个出现的列
    pub fn column_mapping(&self, headers: &[String]) -> IndexMap<String, String> {
        let mut mapping = IndexMap::new();
        let mut taken = Vec::new();

        for header in headers {
            let Some(field) = self.aliases.get(&alias_key(header)) else {
                continue;
            };
            if taken.contains(field) {
                tracing::debug!("column {:?} also maps to {:?}, keeping original name", header, field);
                continue;
            }
            taken.push(*field);
            mapping.insert(header.clone(), field.column_name().to_string());
        }

        mapping
    }

    /// 标准化一个供应商的全部行
    pub fn normalize(&self, supplier: &str, batch: RawBatch) -> PipelineResult<SourceBatch> {
        let mapping = self.column_mapping(&batch.headers);
        let columns: Vec<String> = batch
            .headers
            .iter()
            .map(|h| mapping.get(h).cloned().unwrap_or_else(|| h.clone()))
            .collect();

        let product_column = CanonicalField::ProductName.column_name();
        if !columns.iter().any(|c| c == product_column) {
            return Err(PipelineError::MissingProductColumn {
                supplier: supplier.to_string(),
                columns: batch.headers,
            });
        }

        let strategy = self.packaging.strategy_for(supplier, &columns);

        let records: Vec<NormalizedRecord> = batch
            .records
            .into_par_iter()
            .map(|raw| normalize_record(supplier, strategy, &raw.rename_columns(&mapping)))
            .collect();

        tracing::info!("[Catalog] {}: 标准化完成, {} 行", supplier, records.len());

        Ok(SourceBatch {
            supplier: supplier.to_string(),
            records,
        })
    }
}

/// 单行标准化 (列名已映射)
pub fn normalize_record(
    supplier: &str,
    packaging: &dyn PackagingStrategy,
    record: &RawRecord,
) -> NormalizedRecord {
    let product_name = record
        .get(CanonicalField::ProductName.column_name())
        .unwrap_or_default()
        .to_string();

    NormalizedRecord {
        weight_quantity: extract_weight_quantity(&product_name),
        units_per_carton: extract_units_per_carton(&product_name),
        packaging_type: packaging.classify(record),
        serial_number: record
            .get(CanonicalField::SerialNumber.column_name())
            .map(str::to_string),
        supplier: supplier.to_string(),
        product_name,
    }
}

fn alias_key(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}
