use crate::config::SourceConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{MasterCatalogEntry, MatchSummary};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 单条 INSERT 的最大行数
pub const INSERT_CHUNK_SIZE: usize = 1000;

const INSERT_TIMEOUT: Duration = Duration::from_secs(30);

/// 建表 (幂等)
pub async fn ensure_schema(pool: &PgPool) -> PipelineResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            product_id       TEXT PRIMARY KEY,
            product_name     TEXT NOT NULL,
            serial_number    TEXT,
            supplier         TEXT NOT NULL,
            weight_quantity  TEXT,
            packaging_type   TEXT NOT NULL,
            units_per_carton BIGINT,
            source_file      TEXT,
            last_updated     TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS url_similarity_results (
            id              TEXT NOT NULL,
            serial_number   TEXT,
            input_title     TEXT NOT NULL,
            matched_url     TEXT NOT NULL,
            status          TEXT NOT NULL,
            best_similarity DOUBLE PRECISION NOT NULL,
            processed_at    TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// 全量替换主目录: 同一事务内先清空再分批插入
pub async fn replace_products(
    pool: &PgPool,
    entries: &[MasterCatalogEntry],
    sources: &[SourceConfig],
    updated_at: DateTime<Utc>,
) -> PipelineResult<u64> {
    let source_files: HashMap<&str, &str> = sources
        .iter()
        .map(|s| (s.supplier.as_str(), s.path.as_str()))
        .collect();

    tracing::debug!("开始替换 products 表, {} 条记录", entries.len());
    let start_time = Instant::now();

    let work = async {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;

        let mut inserted = 0;
        for chunk in entries.chunks(INSERT_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO products (
                    product_id, product_name, serial_number, supplier,
                    weight_quantity, packaging_type, units_per_carton,
                    source_file, last_updated
                ) ",
            );
            query_builder.push_values(chunk, |mut b, entry| {
                let r = &entry.record;
                b.push_bind(&entry.product_id)
                    .push_bind(&r.product_name)
                    .push_bind(r.serial_number.as_deref())
                    .push_bind(&r.supplier)
                    .push_bind(r.weight_quantity.as_deref())
                    .push_bind(r.packaging_type.as_str())
                    .push_bind(r.units_per_carton.map(i64::from))
                    .push_bind(source_files.get(r.supplier.as_str()).copied())
                    .push_bind(updated_at);
            });
            inserted += query_builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok::<u64, sqlx::Error>(inserted)
    };

    match tokio::time::timeout(INSERT_TIMEOUT, work).await {
        Ok(Ok(inserted)) => {
            tracing::info!("✓ products 替换成功, 写入 {} 行, 耗时: {:?}", inserted, start_time.elapsed());
            Ok(inserted)
        }
        Ok(Err(e)) => {
            tracing::error!("✗ products 替换失败, 耗时: {:?}, 错误: {:?}", start_time.elapsed(), e);
            Err(e.into())
        }
        Err(_) => {
            tracing::error!("✗ products 替换超时 (>30秒)!");
            Err(PipelineError::Timeout("replace products"))
        }
    }
}

/// 批量插入匹配汇总
pub async fn insert_match_summaries(pool: &PgPool, summaries: &[MatchSummary]) -> PipelineResult<()> {
    if summaries.is_empty() {
        return Ok(());
    }

    tracing::debug!("开始构建批量插入语句, {} 条记录", summaries.len());
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO url_similarity_results (
            id, serial_number, input_title, matched_url,
            status, best_similarity, processed_at
        ) ",
    );
    query_builder.push_values(summaries, |mut b, s| {
        b.push_bind(&s.id)
            .push_bind(s.serial_number.as_deref())
            .push_bind(&s.input_title)
            .push_bind(&s.matched_url)
            .push_bind(s.status.as_str())
            .push_bind(s.best_similarity)
            .push_bind(s.processed_at);
    });

    let execute_start = Instant::now();
    let execute_result =
        tokio::time::timeout(INSERT_TIMEOUT, query_builder.build().execute(pool)).await;

    match execute_result {
        Ok(Ok(result)) => {
            tracing::info!(
                "✓ INSERT执行成功, 影响 {} 行, 耗时: {:?}",
                result.rows_affected(),
                execute_start.elapsed()
            );
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!("✗ INSERT执行失败, 耗时: {:?}, 错误: {:?}", execute_start.elapsed(), e);
            Err(e.into())
        }
        Err(_) => {
            tracing::error!("✗ INSERT操作超时 (>30秒)!");
            Err(PipelineError::Timeout("insert match summaries"))
        }
    }
}
