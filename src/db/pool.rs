use crate::error::PipelineResult;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// 创建连接池 (惰性连接, 首次使用时才建立连接)
pub fn create_pool(database_url: &str) -> PipelineResult<PgPool> {
    // 超过 5 秒的语句记为慢查询
    let connect_options = PgConnectOptions::from_str(database_url)?
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5));

    Ok(PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy_with(connect_options))
}
