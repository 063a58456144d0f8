//! Command-line and environment settings.
//!
//! Every knob is a clap argument backed by an environment variable, so
//! `--batch-size 3` and `ANALYSIS_BATCH_SIZE=3` are interchangeable and the
//! flag wins when both are given. Malformed values are rejected by clap
//! before anything runs.

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::ExportFormat;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    Dummy,
}

#[derive(Args, Debug, Clone)]
pub struct InferenceSettings {
    /// Inference backend
    #[arg(long = "provider", env = "INFERENCE_PROVIDER", global = true, value_enum, ignore_case = true, default_value_t = Provider::OpenAi)]
    pub provider: Provider,
    #[arg(long = "api-key", env = "INFERENCE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long = "model", env = "INFERENCE_MODEL", global = true, default_value = "gpt-4o-mini")]
    pub model_name: String,
    #[arg(long = "inference-base-url", env = "INFERENCE_BASE_URL", global = true, default_value = "https://api.openai.com/v1")]
    pub base_url: String,
    #[arg(id = "inference_timeout", long = "inference-timeout-ms", env = "INFERENCE_TIMEOUT_MS", global = true, default_value = "60000", value_parser = parse_millis)]
    pub timeout: Duration,
    #[arg(id = "inference_max_retries", long = "inference-max-retries", env = "INFERENCE_MAX_RETRIES", global = true, default_value_t = 2)]
    pub max_retries: u32,
}

#[derive(Args, Debug, Clone)]
pub struct AnalysisSettings {
    /// Articles per inference request
    #[arg(long = "batch-size", env = "ANALYSIS_BATCH_SIZE", global = true, default_value_t = 1, value_parser = at_least_one())]
    pub batch_size: usize,
    /// Inference requests in flight at once
    #[arg(id = "analysis_concurrency", long = "analysis-concurrency", env = "ANALYSIS_CONCURRENCY", global = true, default_value_t = 2, value_parser = at_least_one())]
    pub concurrency: usize,
    #[arg(long = "requests-per-minute", env = "REQUESTS_PER_MINUTE", global = true, default_value_t = 20, value_parser = at_least_one())]
    pub requests_per_minute: usize,
    /// Article text sent to the model is cut to this many characters
    #[arg(long = "content-char-limit", env = "CONTENT_CHAR_LIMIT", global = true, default_value_t = 7_500)]
    pub content_char_limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct CostSettings {
    /// Monthly inference budget in USD
    #[arg(long = "monthly-limit", env = "MONTHLY_COST_LIMIT", global = true, default_value_t = 10.0, value_parser = parse_usd)]
    pub monthly_limit_usd: f64,
    #[arg(long = "price-per-1k-input", env = "PRICE_PER_1K_INPUT", global = true, default_value_t = 0.00015, value_parser = parse_usd)]
    pub price_per_1k_input: f64,
    #[arg(long = "price-per-1k-output", env = "PRICE_PER_1K_OUTPUT", global = true, default_value_t = 0.0006, value_parser = parse_usd)]
    pub price_per_1k_output: f64,
}

#[derive(Args, Debug, Clone)]
pub struct FetchSettings {
    #[arg(id = "fetch_concurrency", long = "fetch-concurrency", env = "FETCH_CONCURRENCY", global = true, default_value_t = 5, value_parser = at_least_one())]
    pub concurrency: usize,
    #[arg(id = "fetch_timeout", long = "fetch-timeout-ms", env = "FETCH_TIMEOUT_MS", global = true, default_value = "30000", value_parser = parse_millis)]
    pub timeout: Duration,
    #[arg(id = "fetch_max_retries", long = "fetch-max-retries", env = "FETCH_MAX_RETRIES", global = true, default_value_t = 3)]
    pub max_retries: u32,
    /// Pause between page requests
    #[arg(long = "fetch-delay-ms", env = "FETCH_DELAY_MS", global = true, default_value = "0", value_parser = parse_millis)]
    pub delay: Duration,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    #[command(flatten)]
    pub inference: InferenceSettings,
    #[command(flatten)]
    pub analysis: AnalysisSettings,
    #[command(flatten)]
    pub cost: CostSettings,
    #[command(flatten)]
    pub fetch: FetchSettings,
    /// Report format
    #[arg(long = "format", env = "EXPORT_FORMAT", global = true, value_enum, ignore_case = true, default_value_t = ExportFormat::Html)]
    pub export_format: ExportFormat,
    /// Only export articles scoring at least this much
    #[arg(long = "min-score", env = "MIN_RELEVANCE_SCORE", global = true, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub min_relevance_score: u8,
    /// Directory for scraped files, reports and the cost ledger
    #[arg(long = "output-dir", env = "OUTPUT_DIR", global = true, default_value = "output")]
    pub output_dir: PathBuf,
    /// Port for the report server
    #[arg(long = "port", env = "SERVER_PORT", global = true, default_value_t = 8080)]
    pub server_port: u16,
}

pub const LEDGER_FILE_NAME: &str = "cost-ledger.json";

#[derive(Parser, Debug)]
#[command(name = "feedrank")]
struct SettingsOnly {
    #[command(flatten)]
    settings: Settings,
}

impl Settings {
    /// Parses settings on their own, without a subcommand. Unset flags fall
    /// back to the environment, then to the defaults.
    pub fn try_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        SettingsOnly::try_parse_from(args)
            .map(|parsed| parsed.settings)
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.output_dir.join(LEDGER_FILE_NAME)
    }
}

fn at_least_one() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

fn parse_millis(raw: &str) -> std::result::Result<Duration, String> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| format!("expected milliseconds: {}", e))
}

fn parse_usd(raw: &str) -> std::result::Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Ok(value) => Err(format!("must be a non-negative amount, got {}", value)),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_from(args: &[&str]) -> Result<Settings> {
        Settings::try_from_args(std::iter::once("feedrank").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.analysis.batch_size, 1);
        assert_eq!(settings.analysis.content_char_limit, 7_500);
        assert_eq!(settings.fetch.timeout, Duration::from_secs(30));
        assert_eq!(settings.inference.max_retries, 2);
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            "--provider",
            "dummy",
            "--batch-size",
            "2",
            "--monthly-limit",
            "0.01",
            "--format",
            "md",
            "--fetch-delay-ms",
            "250",
            "--output-dir",
            "/tmp/reports",
        ])
        .unwrap();
        assert_eq!(settings.inference.provider, Provider::Dummy);
        assert_eq!(settings.analysis.batch_size, 2);
        assert_eq!(settings.cost.monthly_limit_usd, 0.01);
        assert_eq!(settings.export_format, ExportFormat::Markdown);
        assert_eq!(settings.fetch.delay, Duration::from_millis(250));
        assert_eq!(settings.ledger_path(), PathBuf::from("/tmp/reports").join(LEDGER_FILE_NAME));
    }

    #[test]
    fn test_provider_is_case_insensitive() {
        let settings = settings_from(&["--provider", "OpenAI"]).unwrap();
        assert_eq!(settings.inference.provider, Provider::OpenAi);
    }

    #[test]
    fn test_malformed_values_are_fatal() {
        let err = settings_from(&["--batch-size", "many"]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = settings_from(&["--batch-size", "0"]).unwrap_err();
        assert!(err.to_string().contains("batch-size"));

        assert!(settings_from(&["--min-score", "150"]).is_err());
        assert!(settings_from(&["--monthly-limit", "-1"]).is_err());
        assert!(settings_from(&["--fetch-timeout-ms", "soon"]).is_err());
        assert!(settings_from(&["--provider", "llama"]).is_err());
    }
}
