use crate::dedupe::{dedupe, dedupe_links};
use crate::feeds::{fetch_feed, FeedSource};
use crate::fetcher::{ContentFetcher, FetchConfig};
use fr_core::config::FetchSettings;
use fr_core::{ArticleLink, Result, ScrapedArticle};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Drives the fetcher over many links with bounded concurrency.
#[derive(Debug, Clone)]
pub struct ScrapeManager {
    fetcher: Arc<ContentFetcher>,
    concurrency: usize,
    delay: Duration,
}

impl ScrapeManager {
    pub fn new(fetcher: ContentFetcher, concurrency: usize, delay: Duration) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            concurrency: concurrency.max(1),
            delay,
        }
    }

    pub fn from_settings(settings: &FetchSettings) -> Result<Self> {
        let fetcher = ContentFetcher::new(FetchConfig::from(settings))?;
        Ok(Self::new(fetcher, settings.concurrency, settings.delay))
    }

    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    /// Collects links from every feed. A feed that fails is logged and skipped.
    pub async fn collect_links(&self, feeds: &[FeedSource]) -> Vec<ArticleLink> {
        info!("📡 Reading {} feeds", feeds.len());
        let results: Vec<(String, Result<Vec<ArticleLink>>)> = stream::iter(feeds)
            .map(|feed| {
                let fetcher = self.fetcher.clone();
                async move { (feed.url.clone(), fetch_feed(&fetcher, feed).await) }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut links = Vec::new();
        for (url, result) in results {
            match result {
                Ok(found) => links.extend(found),
                Err(e) => warn!("❌ Skipping feed {}: {}", url, e),
            }
        }

        let links = dedupe_links(links);
        info!("🔗 Collected {} unique links", links.len());
        links
    }

    /// Scrapes every link and returns one article per link, in input order.
    /// At most `concurrency` requests are in flight and consecutive
    /// dispatches are spaced by `delay`.
    pub async fn scrape_all(&self, links: Vec<ArticleLink>) -> Vec<ScrapedArticle> {
        let total = links.len();
        info!("🦗 Scraping {} articles with concurrency {}", total, self.concurrency);
        let delay = self.delay;

        let articles: Vec<ScrapedArticle> = stream::iter(links.into_iter().enumerate())
            .then(|(i, link)| async move {
                if i > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                link
            })
            .map(|link| {
                let fetcher = self.fetcher.clone();
                async move { fetcher.fetch(&link).await }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let failed = articles.iter().filter(|a| a.extraction_error.is_some()).count();
        info!("💾 Scraped {} articles ({} with errors)", total, failed);
        articles
    }

    /// Scrapes and removes duplicates.
    pub async fn scrape_and_dedupe(&self, links: Vec<ArticleLink>) -> Vec<ScrapedArticle> {
        dedupe(self.scrape_all(links).await)
    }
}
