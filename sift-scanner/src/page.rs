use crate::score::{KeywordHit, KeywordScorer, ScoreBreakdown};
use scraper::{Html, Node};

/// Elements whose text never reaches a reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// One fetched page and its keyword score.
///
/// The score is computed once, at construction, from the readable text of
/// the body. Neither changes afterwards.
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    title: String,
    raw_text: String,
    breakdown: ScoreBreakdown,
}

impl Page {
    /// A page reached by following a link: scored from its body alone.
    pub fn fetched(url: &str, raw_text: String, scorer: &KeywordScorer, user_term: &str) -> Self {
        let breakdown = scorer.score(&readable_text(&raw_text), user_term);
        Self {
            url: url.to_string(),
            title: String::new(),
            raw_text,
            breakdown,
        }
    }

    /// A search hit: the body is appended to the title and snippet before
    /// scoring, so an empty body still leaves title and snippet scored.
    pub fn candidate(
        url: &str,
        title: &str,
        snippet: &str,
        raw_text: String,
        scorer: &KeywordScorer,
        user_term: &str,
    ) -> Self {
        let body = readable_text(&raw_text);
        let scored: Vec<&str> = [title, snippet, body.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect();
        let breakdown = scorer.score(&scored.join(" "), user_term);
        Self {
            url: url.to_string(),
            title: title.to_string(),
            raw_text,
            breakdown,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn score(&self) -> f64 {
        self.breakdown.total
    }

    pub fn ai_count(&self) -> u32 {
        self.breakdown.ai_count
    }

    pub fn user_count(&self) -> u32 {
        self.breakdown.user_count
    }

    pub fn hits(&self) -> &[KeywordHit] {
        &self.breakdown.hits
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    /// Character count of the body's readable text.
    pub fn content_length(&self) -> usize {
        readable_text(&self.raw_text).chars().count()
    }
}

/// Visible text of a body. Markup is parsed and hidden elements dropped;
/// bodies without markup are returned whitespace-normalised.
pub fn readable_text(body: &str) -> String {
    if !body.contains('<') {
        return normalise_whitespace(body);
    }

    let document = Html::parse_document(body);
    let mut parts: Vec<&str> = Vec::new();
    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| HIDDEN_ELEMENTS.contains(&name.as_str()));
        if !hidden {
            parts.push(text);
        }
    }
    normalise_whitespace(&parts.join(" "))
}

fn normalise_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
