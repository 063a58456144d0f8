use fr_core::{AnalyzedArticle, Error, InferenceModel, LedgerState, Result, ScrapedArticle, Settings};
use fr_export::{export, write_links, write_scraped, ExportOptions};
use fr_inference::RelevanceAnalyzer;
use fr_scrapers::{dedupe, read_input, read_rubric, read_scraped_articles, InputFile, ScrapeManager};
use fr_storage::CostLedger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: Option<PathBuf>,
    pub rubric: PathBuf,
    pub skip_scraping: bool,
    pub scraped_file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunSummary {
    /// Scrape output written during this run, if scraping happened.
    pub scraped_file: Option<PathBuf>,
    pub report: PathBuf,
    pub analyzed: Vec<AnalyzedArticle>,
}

/// Wires fetcher, analyzer, ledger and exporter together for one run.
pub struct Pipeline {
    settings: Settings,
    include_full_content: bool,
    model: Arc<dyn InferenceModel>,
    ledger: Arc<CostLedger>,
    scraper: ScrapeManager,
}

impl Pipeline {
    pub fn new(settings: Settings, model: Arc<dyn InferenceModel>, ledger: Arc<CostLedger>) -> Result<Self> {
        let scraper = ScrapeManager::from_settings(&settings.fetch)?;
        Ok(Self {
            settings,
            include_full_content: false,
            model,
            ledger,
            scraper,
        })
    }

    /// Builds the model and opens the on-disk ledger named by `settings`.
    pub async fn from_settings(settings: Settings) -> Result<Self> {
        let model = fr_inference::create_model(&settings)?;
        let ledger = fr_storage::open_ledger(&settings).await?;
        Self::new(settings, model, ledger)
    }

    pub fn with_full_content(mut self, include_full_content: bool) -> Self {
        self.include_full_content = include_full_content;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Input → scrape → dedupe → analyze → export.
    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let rubric = read_rubric(&options.rubric)?;

        let (articles, scraped_file) = if options.skip_scraping {
            let path = options
                .scraped_file
                .as_deref()
                .ok_or_else(|| Error::Config("--scraped-file is required with --skip-scraping".to_string()))?;
            info!("📂 Reusing scraped articles from {}", path.display());
            (dedupe(read_scraped_articles(path)?), None)
        } else {
            let input = options
                .input
                .as_deref()
                .ok_or_else(|| Error::Config("--input is required unless --skip-scraping is set".to_string()))?;
            let articles = self.scrape(input).await?;
            let path = write_scraped(&articles, &self.settings.output_dir)?;
            (articles, Some(path))
        };

        let (analyzed, report) = self.analyze_and_export(&articles, &rubric).await?;
        Ok(RunSummary {
            scraped_file,
            report,
            analyzed,
        })
    }

    /// Scores an existing scraped-articles file (CSV or JSON).
    pub async fn analyze_file(&self, articles: &Path, rubric: &Path) -> Result<RunSummary> {
        let rubric = read_rubric(rubric)?;
        let articles = dedupe(read_scraped_articles(articles)?);
        let (analyzed, report) = self.analyze_and_export(&articles, &rubric).await?;
        Ok(RunSummary {
            scraped_file: None,
            report,
            analyzed,
        })
    }

    async fn scrape(&self, input: &Path) -> Result<Vec<ScrapedArticle>> {
        let links = match read_input(input)? {
            InputFile::Articles(links) => {
                info!("📄 Article mode: {} links in {}", links.len(), input.display());
                links
            }
            InputFile::Feeds(feeds) => {
                info!("📡 Feed mode: {} feeds in {}", feeds.len(), input.display());
                self.scraper.collect_links(&feeds).await
            }
        };
        Ok(self.scraper.scrape_and_dedupe(links).await)
    }

    async fn analyze_and_export(&self, articles: &[ScrapedArticle], rubric: &str) -> Result<(Vec<AnalyzedArticle>, PathBuf)> {
        let analyzer = RelevanceAnalyzer::from_settings(self.model.clone(), self.ledger.clone(), &self.settings.analysis);
        let analyzed = analyzer.analyze(articles, rubric).await;

        let options = ExportOptions {
            output_dir: self.settings.output_dir.clone(),
            min_relevance_score: self.settings.min_relevance_score,
            include_full_content: self.include_full_content,
        };
        let report = export(&analyzed, self.settings.export_format, &options)?;
        Ok((analyzed, report))
    }
}

/// Reads feeds from `input` and writes the discovered links without scraping them.
pub async fn collect_feed_links(settings: &Settings, input: &Path) -> Result<PathBuf> {
    let feeds = match read_input(input)? {
        InputFile::Feeds(feeds) => feeds,
        InputFile::Articles(_) => {
            return Err(Error::Config(format!("{} has no 'Feed URL' column", input.display())));
        }
    };
    let scraper = ScrapeManager::from_settings(&settings.fetch)?;
    let links = scraper.collect_links(&feeds).await;
    write_links(&links, &settings.output_dir)
}

/// Human-readable ledger summary for the `cost` command.
pub fn format_cost_summary(state: &LedgerState, monthly_limit: f64) -> String {
    let remaining = (monthly_limit - state.total_cost_usd).max(0.0);
    format!(
        "Period:     {:04}-{:02}\n\
         Spent:      ${:.4} of ${:.2} (${:.4} remaining)\n\
         Requests:   {}\n\
         Tokens:     {} in / {} out\n\
         Updated:    {}",
        state.year,
        state.month,
        state.total_cost_usd,
        monthly_limit,
        remaining,
        state.request_count,
        state.input_tokens,
        state.output_tokens,
        state.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
