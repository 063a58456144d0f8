//! Reads per-article scores out of a free-text model response.
//!
//! Two strategies are tried in order:
//!
//! * **Primary**: split the response on `ARTICLE_ID: <n>` markers and read
//!   `RELEVANCE_SCORE` / `EXPLANATION` inside each segment.
//! * **Fallback**: used only when the primary strategy resolves nothing.
//!   Searches for each expected id separately and tolerates looser forms such
//!   as `ARTICLE ID 2` or `Article 2 - Score: 40`.
//!
//! Ids the batch did not ask for are ignored. When an id appears twice the
//! first block wins. A block whose score is not a number stays unresolved.

use fr_core::clamp_score;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref ID_MARKER: Regex = Regex::new(r"(?i)\**ARTICLE_ID\**\s*:\s*\**\s*\[?\s*(\d+)").unwrap();
    static ref SCORE: Regex =
        Regex::new(r"(?i)RELEVANCE_SCORE\**\s*:\s*\**\s*\[?\s*(-?\d+(?:\.\d+)?)").unwrap();
    static ref EXPLANATION: Regex = Regex::new(r"(?is)EXPLANATION\**\s*:\s*\**\s*(.*)").unwrap();
    static ref LOOSE_SCORE: Regex =
        Regex::new(r"(?i)(?:RELEVANCE[_ ]SCORE|SCORE)\**\s*:?\s*\**\s*(-?\d+(?:\.\d+)?)").unwrap();
    static ref LOOSE_EXPLANATION: Regex = Regex::new(r"(?is)(?:EXPLANATION|REASON)\**\s*:?\s*\**\s*(.*)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Primary,
    Fallback,
    /// Neither strategy resolved a single id.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScore {
    pub score: u8,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub scores: BTreeMap<usize, ParsedScore>,
    /// Expected ids that got no usable block, ascending.
    pub missing: Vec<usize>,
    pub strategy: ParseStrategy,
}

impl ParseOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn parse_response(text: &str, expected: &[usize]) -> ParseOutcome {
    let (scores, strategy) = match parse_primary(text, expected) {
        scores if !scores.is_empty() => (scores, ParseStrategy::Primary),
        _ => match parse_fallback(text, expected) {
            scores if !scores.is_empty() => (scores, ParseStrategy::Fallback),
            scores => (scores, ParseStrategy::Unresolved),
        },
    };

    let mut missing: Vec<usize> = expected.iter().copied().filter(|id| !scores.contains_key(id)).collect();
    missing.sort_unstable();
    missing.dedup();

    ParseOutcome {
        scores,
        missing,
        strategy,
    }
}

fn parse_primary(text: &str, expected: &[usize]) -> BTreeMap<usize, ParsedScore> {
    let markers: Vec<(usize, Option<usize>)> = ID_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            Some((start, caps[1].parse::<usize>().ok()))
        })
        .collect();

    let mut scores = BTreeMap::new();
    for (i, (start, id)) in markers.iter().enumerate() {
        let Some(id) = id else { continue };
        if !expected.contains(id) || scores.contains_key(id) {
            continue;
        }
        let end = markers.get(i + 1).map_or(text.len(), |(next, _)| *next);
        if let Some(parsed) = read_block(&text[*start..end], &SCORE, &EXPLANATION) {
            scores.insert(*id, parsed);
        }
    }
    scores
}

fn parse_fallback(text: &str, expected: &[usize]) -> BTreeMap<usize, ParsedScore> {
    let mut scores = BTreeMap::new();
    for &id in expected {
        if scores.contains_key(&id) {
            continue;
        }
        let pattern = format!(
            r"(?is)ARTICLE(?:[_ ]ID)?\s*#?\s*:?\s*\**\s*\[?{}\b(.*?)(?:ARTICLE(?:[_ ]ID)?\s*#?\s*:?\s*\**\s*\[?\d|\z)",
            id
        );
        let Ok(block) = Regex::new(&pattern) else { continue };
        let parsed = block
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|segment| read_block(segment.as_str(), &LOOSE_SCORE, &LOOSE_EXPLANATION));
        if let Some(parsed) = parsed {
            scores.insert(id, parsed);
        }
    }
    scores
}

fn read_block(segment: &str, score: &Regex, explanation: &Regex) -> Option<ParsedScore> {
    let raw = score.captures(segment)?.get(1)?.as_str();
    let value = raw.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }

    let explanation = explanation
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_matches('*').trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "No explanation provided".to_string());

    Some(ParsedScore {
        score: clamp_score(value.round() as i64),
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_three_blocks() {
        let text = "ARTICLE_ID: 1\nRELEVANCE_SCORE: 85\nEXPLANATION: Covers bridge funding.\n\n\
                    ARTICLE_ID: 2\nRELEVANCE_SCORE: 10\nEXPLANATION: Sports.\n\n\
                    ARTICLE_ID: 3\nRELEVANCE_SCORE: 55\nEXPLANATION: Partly related.";
        let outcome = parse_response(text, &[1, 2, 3]);

        assert_eq!(outcome.strategy, ParseStrategy::Primary);
        assert!(outcome.is_complete());
        assert_eq!(outcome.scores[&1].score, 85);
        assert_eq!(outcome.scores[&1].explanation, "Covers bridge funding.");
        assert_eq!(outcome.scores[&2].score, 10);
        assert_eq!(outcome.scores[&3].explanation, "Partly related.");
    }

    #[test]
    fn test_missing_id_is_reported() {
        let text = "ARTICLE_ID: 1\nRELEVANCE_SCORE: 70\nEXPLANATION: yes\n\n\
                    ARTICLE_ID: 3\nRELEVANCE_SCORE: 20\nEXPLANATION: no";
        let outcome = parse_response(text, &[1, 2, 3]);

        assert_eq!(outcome.missing, vec![2]);
        assert_eq!(outcome.scores.len(), 2);
    }

    #[test]
    fn test_reordered_and_decorated_blocks() {
        let text = "Here are the scores:\n\n\
                    **ARTICLE_ID:** 2\n**RELEVANCE_SCORE:** 40\n**EXPLANATION:** Tangential.\n\n\
                    **ARTICLE_ID:** [1]\n**RELEVANCE_SCORE:** 90\n**EXPLANATION:** Direct hit.";
        let outcome = parse_response(text, &[1, 2]);

        assert!(outcome.is_complete());
        assert_eq!(outcome.scores[&1].score, 90);
        assert_eq!(outcome.scores[&1].explanation, "Direct hit.");
        assert_eq!(outcome.scores[&2].score, 40);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let text = "ARTICLE_ID: 1\nRELEVANCE_SCORE: 150\nEXPLANATION: a\n\
                    ARTICLE_ID: 2\nRELEVANCE_SCORE: -5\nEXPLANATION: b\n\
                    ARTICLE_ID: 3\nRELEVANCE_SCORE: 72.6\nEXPLANATION: c";
        let outcome = parse_response(text, &[1, 2, 3]);

        assert_eq!(outcome.scores[&1].score, 100);
        assert_eq!(outcome.scores[&2].score, 0);
        assert_eq!(outcome.scores[&3].score, 73);
    }

    #[test]
    fn test_non_numeric_score_stays_unresolved() {
        let text = "ARTICLE_ID: 1\nRELEVANCE_SCORE: high\nEXPLANATION: a\n\
                    ARTICLE_ID: 2\nRELEVANCE_SCORE: 30\nEXPLANATION: b";
        let outcome = parse_response(text, &[1, 2]);

        assert_eq!(outcome.missing, vec![1]);
        assert_eq!(outcome.scores[&2].score, 30);
    }

    #[test]
    fn test_unexpected_and_duplicate_ids() {
        let text = "ARTICLE_ID: 9\nRELEVANCE_SCORE: 99\nEXPLANATION: stray\n\
                    ARTICLE_ID: 1\nRELEVANCE_SCORE: 60\nEXPLANATION: first\n\
                    ARTICLE_ID: 1\nRELEVANCE_SCORE: 5\nEXPLANATION: second";
        let outcome = parse_response(text, &[1]);

        assert_eq!(outcome.scores.len(), 1);
        assert_eq!(outcome.scores[&1], ParsedScore { score: 60, explanation: "first".to_string() });
    }

    #[test]
    fn test_fallback_loose_format() {
        let text = "Article 1: Score: 80\nExplanation: good fit\n\n\
                    ARTICLE ID 2 - Score 15. Reason: unrelated article about sports";
        let outcome = parse_response(text, &[1, 2]);

        assert_eq!(outcome.strategy, ParseStrategy::Fallback);
        assert!(outcome.is_complete());
        assert_eq!(outcome.scores[&1].score, 80);
        assert_eq!(outcome.scores[&1].explanation, "good fit");
        assert_eq!(outcome.scores[&2].score, 15);
        assert_eq!(outcome.scores[&2].explanation, "unrelated article about sports");
    }

    #[test]
    fn test_fallback_does_not_run_when_primary_resolves() {
        let text = "ARTICLE_ID: 1\nRELEVANCE_SCORE: 50\nEXPLANATION: ok\n\nArticle 2: Score: 30";
        let outcome = parse_response(text, &[1, 2]);

        assert_eq!(outcome.strategy, ParseStrategy::Primary);
        assert_eq!(outcome.missing, vec![2]);
    }

    #[test]
    fn test_garbage_resolves_nothing() {
        let outcome = parse_response("I cannot help with that.", &[1, 2]);
        assert_eq!(outcome.strategy, ParseStrategy::Unresolved);
        assert_eq!(outcome.missing, vec![1, 2]);
    }
}
