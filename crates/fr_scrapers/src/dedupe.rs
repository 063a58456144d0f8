use fr_core::{ArticleLink, ScrapedArticle};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::info;
use url::Url;

const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "mc_cid", "mc_eid", "ref", "ref_src", "igshid", "yclid",
    "_ga", "_hsenc", "_hsmi", "cmpid",
];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "in",
    "is", "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "were", "will", "with",
];

/// Number of normalized characters that go into a content fingerprint.
pub const FINGERPRINT_CHARS: usize = 200;

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Canonical form used as the URL identity key.
///
/// Lowercases scheme and host, drops the fragment, tracking parameters and a
/// trailing slash on the path. Unparseable input is only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(url) = Url::parse(raw) else {
        return raw.trim_end_matches('/').to_string();
    };
    let Some(host) = url.host_str() else {
        return raw.trim_end_matches('/').to_string();
    };

    let mut normalized = format!("{}://{}", url.scheme(), host.to_lowercase());
    if let Some(port) = url.port() {
        normalized.push_str(&format!(":{}", port));
    }
    normalized.push_str(url.path().trim_end_matches('/'));

    let kept: Vec<String> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| {
            if value.is_empty() {
                key.into_owned()
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect();
    if !kept.is_empty() {
        normalized.push('?');
        normalized.push_str(&kept.join("&"));
    }

    normalized
}

/// Hash of the leading normalized text, or `None` when there is no text to compare.
pub fn content_fingerprint(content: &str) -> Option<String> {
    let lowered = content.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect();
    if words.is_empty() {
        return None;
    }
    let joined = words.join(" ");
    let prefix: String = joined.chars().take(FINGERPRINT_CHARS).collect();

    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    Some(format!("{:x}", hasher.finalize()))
}

/// Removes duplicates by normalized URL or by content fingerprint.
/// Keeps input order and the first occurrence. Articles without a URL are
/// always kept and never claim a key.
pub fn dedupe(articles: Vec<ScrapedArticle>) -> Vec<ScrapedArticle> {
    let before = articles.len();
    let mut seen_urls = HashSet::new();
    let mut seen_content = HashSet::new();
    let mut kept = Vec::with_capacity(articles.len());

    for article in articles {
        if article.url().trim().is_empty() {
            kept.push(article);
            continue;
        }

        let url_key = normalize_url(article.url());
        let fingerprint = content_fingerprint(&article.content);
        let duplicate = seen_urls.contains(&url_key)
            || fingerprint.as_ref().is_some_and(|f| seen_content.contains(f));
        if duplicate {
            continue;
        }

        seen_urls.insert(url_key);
        if let Some(fingerprint) = fingerprint {
            seen_content.insert(fingerprint);
        }
        kept.push(article);
    }

    if kept.len() < before {
        info!("🧹 Removed {} duplicate articles", before - kept.len());
    }
    kept
}

/// URL-only variant used before scraping.
pub fn dedupe_links(links: Vec<ArticleLink>) -> Vec<ArticleLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| link.url.trim().is_empty() || seen.insert(normalize_url(&link.url)))
        .collect()
}
