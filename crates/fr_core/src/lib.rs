pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod retry;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use models::{Completion, InferenceModel, TokenUsage};
pub use storage::{LedgerState, LedgerStore};
pub use types::{
    clamp_score, truncate_chars, AnalyzedArticle, ArticleLink, ArticleMetadata, ExportFormat,
    ScrapedArticle, LINK_CSV_HEADERS, MAX_SCORE, SCRAPED_CSV_HEADERS,
};
