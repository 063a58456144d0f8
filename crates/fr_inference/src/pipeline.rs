use crate::parser::{parse_response, ParseStrategy};
use crate::prompt::build_batch_prompt;
use crate::queue::DispatchQueue;
use fr_core::config::AnalysisSettings;
use fr_core::logging::Logger;
use fr_core::{AnalyzedArticle, InferenceModel, ScrapedArticle, TokenUsage};
use fr_storage::{estimate_tokens, CostLedger};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::info;

pub const MISSING_SCORE_EXPLANATION: &str =
    "Failed to extract relevance score for this article from the model response";

/// Lifecycle of one batch. `BudgetExceeded` batches never reach the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    InFlight,
    ParsedOk,
    ParsedPartial,
    Failed,
    BudgetExceeded,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::Pending => "pending",
            BatchState::InFlight => "in flight",
            BatchState::ParsedOk => "parsed",
            BatchState::ParsedPartial => "partially parsed",
            BatchState::Failed => "failed",
            BatchState::BudgetExceeded => "skipped (budget)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    pub batch_size: usize,
    pub content_char_limit: usize,
}

impl From<&AnalysisSettings> for AnalyzerConfig {
    fn from(settings: &AnalysisSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            content_char_limit: settings.content_char_limit,
        }
    }
}

#[derive(Debug)]
pub struct BatchReport {
    pub index: usize,
    pub state: BatchState,
    pub results: Vec<AnalyzedArticle>,
}

/// Scores scraped articles against a rubric.
///
/// Articles are split into batches that share one prompt each. Every batch
/// passes the dispatch queue and the budget check before the model is called,
/// and every completed call is charged to the ledger. Whatever happens to a
/// batch, each of its articles comes back exactly once.
pub struct RelevanceAnalyzer {
    model: Arc<dyn InferenceModel>,
    ledger: Arc<CostLedger>,
    queue: DispatchQueue,
    config: AnalyzerConfig,
}

impl RelevanceAnalyzer {
    pub fn new(model: Arc<dyn InferenceModel>, ledger: Arc<CostLedger>, queue: DispatchQueue, config: AnalyzerConfig) -> Self {
        Self {
            model,
            ledger,
            queue,
            config: AnalyzerConfig {
                batch_size: config.batch_size.max(1),
                ..config
            },
        }
    }

    pub fn from_settings(model: Arc<dyn InferenceModel>, ledger: Arc<CostLedger>, settings: &AnalysisSettings) -> Self {
        let queue = DispatchQueue::new(settings.concurrency, settings.requests_per_minute);
        Self::new(model, ledger, queue, AnalyzerConfig::from(settings))
    }

    /// Returns one `AnalyzedArticle` per input, highest score first. Ties
    /// keep input order.
    pub async fn analyze(&self, articles: &[ScrapedArticle], rubric: &str) -> Vec<AnalyzedArticle> {
        if articles.is_empty() {
            return Vec::new();
        }

        let batches: Vec<&[ScrapedArticle]> = articles.chunks(self.config.batch_size).collect();
        let total = batches.len();
        info!(
            "🔍 Analyzing {} articles in {} batches with {}",
            articles.len(),
            total,
            self.model.name()
        );

        let reports = join_all(
            batches
                .into_iter()
                .enumerate()
                .map(|(i, batch)| self.run_batch(i + 1, total, batch, rubric)),
        )
        .await;

        let count = |state: BatchState| reports.iter().filter(|r| r.state == state).count();
        info!(
            "✨ Batches: {} parsed, {} partial, {} failed, {} over budget",
            count(BatchState::ParsedOk),
            count(BatchState::ParsedPartial),
            count(BatchState::Failed),
            count(BatchState::BudgetExceeded)
        );

        let mut results: Vec<AnalyzedArticle> = reports.into_iter().flat_map(|r| r.results).collect();
        results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        results
    }

    async fn run_batch(&self, index: usize, total: usize, batch: &[ScrapedArticle], rubric: &str) -> BatchReport {
        let logger = Logger::new().with_prefix(format!("[batch {}/{}]", index, total));
        let mut state = BatchState::Pending;
        logger.debug(&format!("{} with {} articles", state, batch.len()));

        let _permit = match self.queue.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                logger.error(&format!("❌ Dispatch queue closed: {}", e));
                return zeroed(index, BatchState::Failed, batch, &format!("Analysis failed: {}", e));
            }
        };

        if !self.ledger.check_budget().await {
            state = BatchState::BudgetExceeded;
            logger.warn(&format!("🛑 {}", state));
            let explanation = format!(
                "Not analyzed: monthly cost limit of ${:.2} reached",
                self.ledger.monthly_limit()
            );
            return zeroed(index, state, batch, &explanation);
        }

        self.queue.throttle().await;

        let numbered: Vec<(usize, &ScrapedArticle)> = batch.iter().enumerate().map(|(i, a)| (i + 1, a)).collect();
        let prompt = build_batch_prompt(rubric, &numbered, self.config.content_char_limit);

        state = BatchState::InFlight;
        logger.info(&format!("🤖 {}: {} articles", state, batch.len()));

        let completion = match self.model.complete(&prompt).await {
            Ok(completion) => completion,
            Err(e) => {
                state = BatchState::Failed;
                logger.error(&format!("❌ Inference call failed: {}", e));
                return zeroed(index, state, batch, &format!("Analysis failed: {}", e));
            }
        };

        let usage = completion.usage.unwrap_or_else(|| TokenUsage {
            input_tokens: estimate_tokens(&prompt),
            output_tokens: estimate_tokens(&completion.text),
        });
        match self.ledger.record_usage(usage).await {
            Ok(cost) => logger.debug(&format!("💰 Charged ${:.5}", cost)),
            Err(e) => logger.warn(&format!("⚠️ Failed to record usage: {}", e)),
        }

        let ids: Vec<usize> = numbered.iter().map(|(id, _)| *id).collect();
        let outcome = parse_response(&completion.text, &ids);
        if outcome.strategy == ParseStrategy::Fallback {
            logger.debug("Scores read with the fallback parser");
        }

        state = if outcome.is_complete() {
            BatchState::ParsedOk
        } else if outcome.missing.len() == ids.len() {
            BatchState::Failed
        } else {
            BatchState::ParsedPartial
        };
        if !outcome.missing.is_empty() {
            logger.warn(&format!("⚠️ No score for ids {:?}", outcome.missing));
        }
        logger.info(&format!("✨ {}", state));

        let results = numbered
            .into_iter()
            .map(|(id, article)| match outcome.scores.get(&id) {
                Some(parsed) => AnalyzedArticle::new(article.clone(), parsed.score as i64, parsed.explanation.clone()),
                None => AnalyzedArticle::new(article.clone(), 0, MISSING_SCORE_EXPLANATION),
            })
            .collect();

        BatchReport { index, state, results }
    }
}

fn zeroed(index: usize, state: BatchState, batch: &[ScrapedArticle], explanation: &str) -> BatchReport {
    BatchReport {
        index,
        state,
        results: batch
            .iter()
            .map(|article| AnalyzedArticle::new(article.clone(), 0, explanation))
            .collect(),
    }
}
