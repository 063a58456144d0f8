//! RSS/Atom ingestion: turns feed documents into article links.

use crate::extract::{normalize_whitespace, strip_tags};
use crate::fetcher::ContentFetcher;
use feed_rs::model::Text;
use feed_rs::parser;
use fr_core::{ArticleLink, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    /// Label carried onto every link from this feed. Empty means "use the feed title".
    pub label: String,
}

impl FeedSource {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// Parses a feed document into links. Entries without a link are skipped.
pub fn parse_feed(bytes: &[u8], label: &str) -> Result<Vec<ArticleLink>> {
    let feed = parser::parse(bytes).map_err(|e| Error::Feed(format!("failed to parse feed: {}", e)))?;

    let label = if label.trim().is_empty() {
        feed.title.map(|t| text_content(&t)).unwrap_or_default()
    } else {
        label.trim().to_string()
    };

    let links = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let href = entry.links.first().map(|l| l.href.trim().to_string())?;
            if href.is_empty() {
                return None;
            }
            let title = entry.title.map(|t| text_content(&t)).unwrap_or_default();
            Some(ArticleLink::new(label.clone(), title, unwrap_redirect(&href)))
        })
        .collect();

    Ok(links)
}

/// Feed text arrives already unescaped. Only html-typed text still carries markup.
fn text_content(text: &Text) -> String {
    if text.content_type.as_str().contains("html") {
        strip_tags(&text.content)
    } else {
        normalize_whitespace(&text.content)
    }
}

/// Alert feeds wrap targets in `https://www.google.com/url?...&url=<target>`.
/// Returns the target, or the input unchanged when it is not such a wrapper.
pub fn unwrap_redirect(href: &str) -> String {
    let Ok(parsed) = Url::parse(href) else {
        return href.to_string();
    };
    let is_google = parsed
        .host_str()
        .map(|host| host == "google.com" || host.ends_with(".google.com"))
        .unwrap_or(false);
    if !is_google || parsed.path() != "/url" {
        return href.to_string();
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "url" || key == "q")
        .map(|(_, target)| target.into_owned())
        .filter(|target| target.starts_with("http://") || target.starts_with("https://"))
        .unwrap_or_else(|| href.to_string())
}

/// Downloads and parses one feed.
pub async fn fetch_feed(fetcher: &ContentFetcher, source: &FeedSource) -> Result<Vec<ArticleLink>> {
    Url::parse(source.url.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", source.url, e)))?;
    let body = fetcher.fetch_with_retry(&source.url).await?;
    let links = parse_feed(body.as_bytes(), &source.label)?;
    info!("📰 {} links from {}", links.len(), source.url);
    Ok(links)
}
