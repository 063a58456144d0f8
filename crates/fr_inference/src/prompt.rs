use fr_core::{truncate_chars, ScrapedArticle, MAX_SCORE};

pub const TRUNCATION_MARKER: &str = "[Content truncated]";

/// Builds the scoring prompt for one batch. Each entry pairs a 1-based
/// batch-local id with the article it stands for.
pub fn build_batch_prompt(rubric: &str, batch: &[(usize, &ScrapedArticle)], content_char_limit: usize) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are screening news articles for an analyst. Score how relevant each \
         article below is to the rubric.\n\n",
    );
    prompt.push_str("RUBRIC:\n");
    prompt.push_str(rubric.trim());
    prompt.push_str("\nEND RUBRIC\n\n");

    prompt.push_str(&format!(
        "Score every article on a scale from 0 to {max}, where 0 means not relevant at all \
         and {max} means highly relevant.\n\n",
        max = MAX_SCORE
    ));
    prompt.push_str(
        "Respond with one block per article, in this exact format and nothing else:\n\
         ARTICLE_ID: <id>\n\
         RELEVANCE_SCORE: <integer>\n\
         EXPLANATION: <one or two sentences>\n\n",
    );

    prompt.push_str(&format!("ARTICLES ({}):\n\n", batch.len()));
    for (id, article) in batch {
        prompt.push_str(&format!("ARTICLE_ID: {}\n", id));
        prompt.push_str(&format!("TITLE: {}\n", article.title()));
        prompt.push_str(&format!("URL: {}\n", article.url()));
        prompt.push_str(&format!("SOURCE: {}\n", article.link.source_label));
        prompt.push_str("CONTENT:\n");

        let (content, truncated) = truncate_chars(&article.content, content_char_limit);
        if content.trim().is_empty() {
            prompt.push_str("(no content could be extracted; judge from the title)");
        } else {
            prompt.push_str(content);
        }
        if truncated {
            prompt.push('\n');
            prompt.push_str(TRUNCATION_MARKER);
        }
        prompt.push_str("\n\n");
    }

    prompt
}
