use crate::models::{MasterCatalogEntry, SourceBatch};
use indexmap::IndexSet;

/// 合并结果
#[derive(Debug, Clone, Default)]
pub struct Consolidation {
    pub entries: Vec<MasterCatalogEntry>,
    pub duplicates_dropped: usize,
}

/// 按供应商顺序合并, (商品名, 供应商) 去重保留首条, 再顺序分配 product_<n>
///
/// 必须在所有供应商标准化完成后单线程执行, 编号只在本次合并内稳定。
pub fn consolidate<I>(batches: I) -> Consolidation
where
    I: IntoIterator<Item = SourceBatch>,
{
    let mut seen: IndexSet<(String, String)> = IndexSet::new(); // 保序去重
    let mut entries = Vec::new();
    let mut duplicates_dropped = 0;

    for batch in batches {
        let before = entries.len();

        for record in batch.records {
            let key = (record.product_name.clone(), record.supplier.clone());
            if !seen.insert(key) {
                duplicates_dropped += 1;
                continue;
            }
            entries.push(MasterCatalogEntry {
                product_id: format!("product_{}", entries.len() + 1),
                record,
            });
        }

        tracing::info!(
            "[Catalog] 合并供应商 {}: 新增 {} 条",
            batch.supplier,
            entries.len() - before
        );
    }

    tracing::info!(
        "[Catalog] 合并完成: 共 {} 条, 去重 {} 条",
        entries.len(),
        duplicates_dropped
    );

    Consolidation {
        entries,
        duplicates_dropped,
    }
}
