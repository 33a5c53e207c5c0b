//! Summary struct - the combined result of one summarisation run.

use serde::{Deserialize, Serialize};

/// The full payload produced for one URL: the generated summary, the
/// token count the completion service reported, and the related articles
/// returned by the similarity search.
///
/// This is what gets cached; a `Summary` only exists once both service
/// calls have succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Generated summary text
    pub text: String,
    /// Total tokens reported by the completion service
    pub tokens_used: u32,
    /// Related articles in service-provided relevance order
    pub related: Vec<RelatedArticle>,
}

/// A single related article from the similarity-search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedArticle {
    /// Article title
    pub title: String,
    /// Article URL
    pub url: String,
    /// Text excerpt, kept under the service's wire name
    #[serde(rename = "text")]
    pub excerpt: String,
}

impl Summary {
    /// Create a new summary
    pub fn new(text: String, tokens_used: u32, related: Vec<RelatedArticle>) -> Self {
        Self {
            text,
            tokens_used,
            related,
        }
    }

    /// First line of the summary, truncated to at most `max_chars`
    /// characters for list and search output.
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.text.lines().next().unwrap_or("").trim();
        if first_line.chars().count() <= max_chars {
            return first_line.to_string();
        }
        let truncated: String = first_line.chars().take(max_chars).collect();
        format!("{}…", truncated.trim_end())
    }
}
