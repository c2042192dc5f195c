pub mod catalog;
pub mod matching;
pub mod report;

pub use catalog::{
    CanonicalField, MasterCatalogEntry, NormalizedRecord, PackagingType, RawBatch, RawRecord,
    SourceBatch, MASTER_CATALOG_COLUMNS,
};
pub use matching::{
    MatchCandidate, MatchQuery, MatchResult, MatchStatus, MatchSummary, TieBreak, NOT_AVAILABLE,
    NOT_AVAILABLE_EVERYWHERE,
};
pub use report::{CatalogReport, SerialCount, SupplierCount};
