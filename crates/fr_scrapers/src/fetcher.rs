use crate::extract::extract_content;
use crate::metadata::extract_metadata;
use backoff::backoff::Backoff;
use fr_core::config::FetchSettings;
use fr_core::retry::exponential_backoff;
use fr_core::{ArticleLink, Error, Result, ScrapedArticle};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(10),
        }
    }
}

impl From<&FetchSettings> for FetchConfig {
    fn from(settings: &FetchSettings) -> Self {
        Self {
            timeout: settings.timeout,
            max_retries: settings.max_retries,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    config: FetchConfig,
}

impl ContentFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GETs `url`, retrying network errors, timeouts and non-2xx statuses
    /// up to `max_retries` times.
    pub async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut backoff = exponential_backoff(self.config.backoff_base, self.config.backoff_cap);
        let mut attempt = 0;
        loop {
            let error = match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            if attempt >= self.config.max_retries {
                return Err(error);
            }

            let Some(delay) = backoff.next_backoff() else {
                return Err(error);
            };
            warn!(
                "Attempt {} failed for {}: {}. Retrying in {:?}",
                attempt + 1,
                url,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn get_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Scraping(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }
        Ok(response.text().await?)
    }

    /// Fetches and extracts one article. Failures are recorded on the
    /// returned article instead of being propagated.
    pub async fn fetch(&self, link: &ArticleLink) -> ScrapedArticle {
        let url = link.url.trim();
        if url.is_empty() {
            return ScrapedArticle::failed(link.clone(), "Missing article URL");
        }
        if let Err(e) = Url::parse(url) {
            return ScrapedArticle::failed(link.clone(), format!("Invalid URL {}: {}", url, e));
        }

        debug!("🦗 Fetching {}", url);
        let body = match self.fetch_with_retry(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("❌ Giving up on {}: {}", url, e);
                return ScrapedArticle::failed(
                    link.clone(),
                    format!("Failed after {} attempts: {}", self.config.max_retries + 1, e),
                );
            }
        };

        let article = parse_article(link, &body);
        info!("✨ Extracted {} chars from {}", article.content.chars().count(), url);
        article
    }
}

/// Turns a fetched page into a `ScrapedArticle`.
pub fn parse_article(link: &ArticleLink, html: &str) -> ScrapedArticle {
    let document = Html::parse_document(html);
    let extraction = extract_content(&document);
    let page = extract_metadata(&document, &extraction.text);

    let mut link = link.clone();
    if link.title.trim().is_empty() {
        if let Some(title) = page.title {
            link.title = title;
        }
    }

    let mut article = ScrapedArticle::new(link, extraction.text);
    article.metadata = page.metadata;
    if article.content.is_empty() {
        article.extraction_error = Some("No readable content found".to_string());
    }
    article
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_article_fills_missing_title() {
        let link = ArticleLink::new("alerts", "", "https://example.com/a");
        let html = format!(
            "<html><head><meta property=\"og:title\" content=\"Found title\"></head>\
             <body><article><p>{}</p></article></body></html>",
            "Grid upgrades announced. ".repeat(20)
        );
        let article = parse_article(&link, &html);
        assert_eq!(article.title(), "Found title");
        assert!(article.extraction_error.is_none());
        assert!(article.content.starts_with("Grid upgrades announced."));
    }

    #[test]
    fn test_parse_article_flags_empty_pages() {
        let link = ArticleLink::new("alerts", "Kept", "https://example.com/a");
        let article = parse_article(&link, "<html><body><script>x()</script></body></html>");
        assert_eq!(article.title(), "Kept");
        assert!(article.content.is_empty());
        assert!(article.extraction_error.is_some());
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_fetched() {
        let fetcher = ContentFetcher::new(FetchConfig::default()).unwrap();
        let article = fetcher.fetch(&ArticleLink::new("alerts", "t", "not a url")).await;
        assert!(article.content.is_empty());
        assert!(article.extraction_error.unwrap().starts_with("Invalid URL"));
    }
}
