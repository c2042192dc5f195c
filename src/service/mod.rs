pub mod carton;
pub mod catalog;
pub mod consolidator;
pub mod matcher;
pub mod normalizer;
pub mod packaging;
pub mod resolver;
pub mod similarity;
pub mod units;

pub use carton::{extract_units_per_carton, CartonRule, CARTON_RULES};
pub use catalog::{build_master_catalog, CatalogOutcome, CatalogService};
pub use consolidator::{consolidate, Consolidation};
pub use matcher::{match_records, MatcherService};
pub use normalizer::CatalogNormalizer;
pub use packaging::{
    detect_packaging_type, ExplicitFieldStrategy, KeywordStrategy, PackagingClassifier,
    PackagingStrategy,
};
pub use resolver::MatchResolver;
pub use similarity::{cosine_similarity, tokenize};
pub use units::{extract_weight_quantity, normalize_to_grams};
