use axum::{routing::{get, post}, Router};
use catalog_matcher::db::files;
use catalog_matcher::{
    api, build_master_catalog, create_pool, match_records, AppConfig, CatalogNormalizer,
    CatalogService, MatchResolver, MatcherService,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Loaded config: {:?}", config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => serve(config).await,
        Some("consolidate") => consolidate_offline(&config),
        Some("match") if args.len() == 3 => match_offline(&config, &args[1], &args[2]),
        _ => {
            eprintln!("usage: catalog-matcher [serve | consolidate | match <input.json> <output.json>]");
            std::process::exit(2);
        }
    }
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = create_pool(&config.database.url)?;
    info!("Database pool created");

    let catalog_service = Arc::new(CatalogService::new(pool.clone(), config.catalog.clone()));
    let matcher_service = Arc::new(MatcherService::new(
        pool,
        MatchResolver::new(&config.matching),
        config.matching.max_slots,
    ));

    let catalog_routes = Router::new()
        .route("/api/catalog/consolidate", post(api::consolidate_catalog))
        .with_state(catalog_service);

    let match_routes = Router::new()
        .route("/api/match/batch", post(api::batch_match))
        .with_state(matcher_service);

    let app = Router::new()
        .route("/health", get(api::health_check))
        .merge(catalog_routes)
        .merge(match_routes)
        .layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/catalog/consolidate - 合并供应商目录");
    info!("  POST /api/match/batch         - 标题相似度匹配");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 不连数据库, 只生成目录 CSV 和报告
fn consolidate_offline(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let normalizer = CatalogNormalizer::from_config(&config.catalog);
    let outcome = build_master_catalog(&normalizer, &config.catalog.sources)?;

    files::export_master_catalog_csv(&outcome.entries, Path::new(&config.catalog.output_path))?;
    files::export_report_csv(&outcome.report, Path::new(&config.catalog.report_path))?;

    info!(
        "Consolidated {} products ({} duplicates dropped, skipped: {:?})",
        outcome.entries.len(),
        outcome.duplicates_dropped,
        outcome.skipped
    );
    Ok(())
}

fn match_offline(config: &AppConfig, input: &str, output: &str) -> Result<(), Box<dyn std::error::Error>> {
    let records = files::read_match_records(Path::new(input))?;
    let resolver = MatchResolver::new(&config.matching);
    let (records, _) = match_records(&resolver, config.matching.max_slots, records);
    files::write_match_records(&records, Path::new(output))?;
    Ok(())
}
