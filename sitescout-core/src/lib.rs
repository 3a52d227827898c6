pub mod api;
pub mod cache;
pub mod directory;
pub mod model;
pub mod report;
pub mod scoring;
pub mod service;

pub use cache::{CacheError, CacheKey, MemoryCache, PageCache, SqliteCache};
pub use directory::{CompanyDirectory, CompanyRecord, JsonDirectory};
pub use model::{CacheClearReport, Category, RelevantPages, ScoredPage};
pub use scoring::{rank, score_pages, score_pages_at};
pub use service::{PageService, ProgressCallback, ServiceConfig};
