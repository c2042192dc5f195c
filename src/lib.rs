pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use db::create_pool;
pub use error::{PipelineError, PipelineResult};
pub use service::{
    build_master_catalog, consolidate, cosine_similarity, extract_units_per_carton,
    extract_weight_quantity, match_records, normalize_to_grams, CatalogNormalizer,
    CatalogService, MatchResolver, MatcherService,
};
