use chrono::{DateTime, Utc};
use fr_core::Result;
use fr_export::{ANALYZED_PREFIX, LINKS_PREFIX, SCRAPED_PREFIX};
use serde::Serialize;
use std::path::Path;

const REPORT_PREFIXES: &[&str] = &[ANALYZED_PREFIX, SCRAPED_PREFIX, LINKS_PREFIX];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub url: String,
}

impl ReportEntry {
    pub fn is_analyzed(&self) -> bool {
        self.name.starts_with(ANALYZED_PREFIX)
    }
}

pub fn is_report_name(name: &str) -> bool {
    REPORT_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Reports in `dir`, newest first. A missing directory lists as empty.
pub async fn list_reports(dir: &Path) -> Result<Vec<ReportEntry>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reports = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_report_name(&name) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        reports.push(ReportEntry {
            url: format!("/{}", name),
            name,
            size: metadata.len(),
            modified,
        });
    }

    // Report names carry their timestamp, so the name breaks mtime ties.
    reports.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
    Ok(reports)
}

/// The report `/` should open: the newest analyzed report, else the newest of any kind.
pub fn landing_report(reports: &[ReportEntry]) -> Option<&ReportEntry> {
    reports.iter().find(|r| r.is_analyzed()).or_else(|| reports.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_names() {
        assert!(is_report_name("analyzed-articles-20240101-000000.html"));
        assert!(is_report_name("article-links-20240101-000000.csv"));
        assert!(!is_report_name("cost-ledger.json"));
        assert!(!is_report_name("notes.txt"));
    }

    #[tokio::test]
    async fn test_missing_dir_lists_empty() {
        let reports = list_reports(Path::new("/definitely/not/here")).await.unwrap();
        assert!(reports.is_empty());
    }
}
