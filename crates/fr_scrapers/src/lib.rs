pub mod dedupe;
pub mod extract;
pub mod feeds;
pub mod fetcher;
pub mod input;
pub mod manager;
pub mod metadata;

pub use dedupe::{content_fingerprint, dedupe, dedupe_links, normalize_url};
pub use feeds::{parse_feed, FeedSource};
pub use fetcher::{ContentFetcher, FetchConfig};
pub use input::{read_input, read_rubric, read_scraped_articles, InputFile};
pub use manager::ScrapeManager;

pub mod prelude {
    pub use super::fetcher::{ContentFetcher, FetchConfig};
    pub use super::manager::ScrapeManager;
    pub use fr_core::{ArticleLink, Error, Result, ScrapedArticle};
}
