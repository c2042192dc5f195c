pub mod files;
pub mod pool;
pub mod queries;

pub use pool::create_pool;
pub use queries::{ensure_schema, insert_match_summaries, replace_products};
