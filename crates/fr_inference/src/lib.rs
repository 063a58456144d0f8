pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod queue;

pub use models::create_model;
pub use parser::{parse_response, ParseOutcome, ParseStrategy, ParsedScore};
pub use pipeline::{AnalyzerConfig, BatchState, RelevanceAnalyzer};
pub use queue::DispatchQueue;

pub mod prelude {
    pub use super::models::{create_model, DummyModel, OpenAiModel};
    pub use super::pipeline::RelevanceAnalyzer;
    pub use fr_core::{AnalyzedArticle, Error, InferenceModel, Result, ScrapedArticle};
}
