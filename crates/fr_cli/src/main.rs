use clap::{Parser, Subcommand};
use fr_cli::commands::{collect_feed_links, format_cost_summary, Pipeline, RunOptions, RunSummary};
use fr_core::logging::init_logging;
use fr_core::Settings;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Score feed articles against a relevance rubric", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    settings: Settings,
    /// Write full article bodies instead of excerpts
    #[arg(long, global = true)]
    include_content: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape, analyze and export in one go
    Run {
        /// CSV with `Alert Name,Title,Link` or `Feed URL,Alert Name` columns
        #[arg(long)]
        input: Option<PathBuf>,
        /// Text file holding the relevance rubric
        #[arg(long)]
        rubric: PathBuf,
        /// Analyze a previous scrape instead of fetching again
        #[arg(long, requires = "scraped_file")]
        skip_scraping: bool,
        #[arg(long)]
        scraped_file: Option<PathBuf>,
        /// Serve the output directory once the report is written
        #[arg(long)]
        serve: bool,
    },
    /// Score an existing scraped-articles file (CSV or JSON)
    Analyze {
        #[arg(long)]
        articles: PathBuf,
        #[arg(long)]
        rubric: PathBuf,
    },
    /// Collect links from feeds without scraping them
    Feeds {
        #[arg(long)]
        input: PathBuf,
    },
    /// Serve the output directory
    Serve,
    /// Show this month's inference spend
    Cost,
}

fn report(summary: &RunSummary) {
    if let Some(scraped) = &summary.scraped_file {
        info!("📄 Scraped articles: {}", scraped.display());
    }
    info!("✨ Analyzed {} articles", summary.analyzed.len());
    for article in summary.analyzed.iter().take(5) {
        info!("   {:>3}  {}", article.relevance_score, article.title());
    }
    info!("💾 Report: {}", summary.report.display());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let settings = &cli.settings;

    match &cli.command {
        Commands::Run {
            input,
            rubric,
            skip_scraping,
            scraped_file,
            serve,
        } => {
            let pipeline = Pipeline::from_settings(settings.clone())
                .await?
                .with_full_content(cli.include_content);
            let options = RunOptions {
                input: input.clone(),
                rubric: rubric.clone(),
                skip_scraping: *skip_scraping,
                scraped_file: scraped_file.clone(),
            };
            let summary = pipeline.run(&options).await?;
            report(&summary);

            if *serve {
                fr_web::serve(settings.output_dir.clone(), settings.server_port).await?;
            }
        }
        Commands::Analyze { articles, rubric } => {
            let pipeline = Pipeline::from_settings(settings.clone())
                .await?
                .with_full_content(cli.include_content);
            let summary = pipeline.analyze_file(articles, rubric).await?;
            report(&summary);
        }
        Commands::Feeds { input } => {
            let path = collect_feed_links(settings, input).await?;
            info!("💾 Links written to {}", path.display());
        }
        Commands::Serve => {
            fr_web::serve(settings.output_dir.clone(), settings.server_port).await?;
        }
        Commands::Cost => {
            let ledger = fr_storage::open_ledger(settings).await?;
            println!("{}", format_cost_summary(&ledger.snapshot().await, ledger.monthly_limit()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fr_core::ExportFormat;

    #[test]
    fn test_settings_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "feedrank",
            "run",
            "--rubric",
            "rubric.txt",
            "--format",
            "csv",
            "--batch-size",
            "4",
            "--output-dir",
            "reports",
        ])
        .unwrap();

        assert_eq!(cli.settings.export_format, ExportFormat::Csv);
        assert_eq!(cli.settings.analysis.batch_size, 4);
        assert_eq!(cli.settings.output_dir, PathBuf::from("reports"));
        assert!(matches!(cli.command, Commands::Run { .. }));
    }

    #[test]
    fn test_invalid_setting_is_a_usage_error() {
        let err = Cli::try_parse_from(["feedrank", "--fetch-concurrency", "0", "serve"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
