use async_trait::async_trait;
use fr_core::{Completion, InferenceModel, Result};
use std::collections::BTreeSet;

const IGNORED_TERMS: &[&str] = &[
    "about", "article", "articles", "score", "scores", "that", "this", "with", "from", "relevant",
    "relevance", "news", "into", "their", "there", "which", "should",
];

/// Offline model that answers in the scoring protocol without calling out.
///
/// Each article scores the share of rubric terms found in its title and
/// content, so results are deterministic for a given prompt.
#[derive(Debug, Default, Clone)]
pub struct DummyModel;

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() >= 4 && !IGNORED_TERMS.contains(&word.as_str()))
        .collect()
}

fn rubric_section(prompt: &str) -> &str {
    let Some(start) = prompt.find("RUBRIC:\n") else {
        return "";
    };
    let rest = &prompt[start + "RUBRIC:\n".len()..];
    rest.find("\nEND RUBRIC").map_or(rest, |end| &rest[..end])
}

/// `(id, block text)` for every article block in the prompt.
fn article_blocks(prompt: &str) -> Vec<(usize, &str)> {
    let body = prompt.find("ARTICLES (").map_or(prompt, |start| &prompt[start..]);
    let mut blocks = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("ARTICLE_ID: ") {
        let after = &rest[start + "ARTICLE_ID: ".len()..];
        let end = after.find("ARTICLE_ID: ").unwrap_or(after.len());
        let block = &after[..end];
        let id = block
            .lines()
            .next()
            .and_then(|line| line.trim().parse::<usize>().ok());
        if let Some(id) = id {
            blocks.push((id, block));
        }
        rest = &after[end..];
    }
    blocks
}

#[async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let rubric = terms(rubric_section(prompt));
        let mut response = String::new();

        for (id, block) in article_blocks(prompt) {
            let found = terms(block);
            let matched: Vec<&String> = rubric.intersection(&found).collect();
            let score = if rubric.is_empty() {
                0
            } else {
                (matched.len() * 100 + rubric.len() / 2) / rubric.len()
            };
            let explanation = if matched.is_empty() {
                "No rubric terms appear in the article.".to_string()
            } else {
                format!(
                    "Matched {} of {} rubric terms: {}.",
                    matched.len(),
                    rubric.len(),
                    matched.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
                )
            };
            response.push_str(&format!(
                "ARTICLE_ID: {}\nRELEVANCE_SCORE: {}\nEXPLANATION: {}\n\n",
                id, score, explanation
            ));
        }

        Ok(Completion::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_response;
    use crate::prompt::build_batch_prompt;
    use fr_core::{ArticleLink, ScrapedArticle};

    #[tokio::test]
    async fn test_dummy_answers_in_protocol() {
        let relevant = ScrapedArticle::new(
            ArticleLink::new("alerts", "Bridge funding approved", "https://x.com/1"),
            "The council approved infrastructure funding for three bridges.",
        );
        let unrelated = ScrapedArticle::new(
            ArticleLink::new("alerts", "Local team wins", "https://x.com/2"),
            "A late goal settled the match.",
        );
        let prompt = build_batch_prompt(
            "score infrastructure funding articles",
            &[(1, &relevant), (2, &unrelated)],
            1000,
        );

        let completion = DummyModel::new().complete(&prompt).await.unwrap();
        let outcome = parse_response(&completion.text, &[1, 2]);

        assert!(outcome.is_complete());
        assert_eq!(outcome.scores[&1].score, 100);
        assert_eq!(outcome.scores[&2].score, 0);
        assert!(completion.usage.is_none());
    }

    #[test]
    fn test_rubric_terms_skip_filler() {
        let found = terms("score infrastructure funding articles");
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["funding", "infrastructure"]);
    }
}
