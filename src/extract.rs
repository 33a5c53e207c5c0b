//! Content-extraction strategies.
//!
//! A URL is either a video on a known platform (summarised from its
//! caption track) or an ordinary page (summarised from its scraped text).
//! The strategy also decides which system prompt the completion service
//! receives.

use crate::{scraper, transcript};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to fetch content: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("no readable content found on page")]
    ContentUnavailable,
    #[error("video has no transcript")]
    TranscriptUnavailable,
    #[error("malformed transcript data: {0}")]
    MalformedTranscript(String),
}

/// System prompt for ordinary pages.
const PAGE_PROMPT: &str = "You are an AI assistant expert in summarizing content. \
Provide a concise summary of the given text.";

/// System prompt for video transcripts: chapter-by-chapter, English,
/// no minor detail.
const TRANSCRIPT_PROMPT: &str = r#"You are an AI assistant expert in summarizing content. Provide a concise summary of the given text.

<VideoChapterGeneration>
  <GenerationRules>
    <Rule>Generate chapters in the format given under FormatForChapterOutput.</Rule>
    <Rule>Write a detailed summary of each chapter.</Rule>
    <Rule>The summary must be in the English language.</Rule>
    <Rule>Avoid minor details or examples unless they are crucial to understanding the main point.</Rule>
  </GenerationRules>
  <FormatForChapterOutput>
    <detailed summary of chapter>
    <detailed summary of chapter>
    <!-- additional chapters as needed -->
  </FormatForChapterOutput>
</VideoChapterGeneration>"#;

/// How to turn a URL into text worth summarising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch the video's caption track and serialise it
    Transcript,
    /// Scrape the page and extract its readable text
    Page,
}

impl Strategy {
    /// Pick the strategy for a URL: video-platform hosts get the
    /// transcript treatment, everything else is scraped as a page.
    pub fn for_url(url: &str) -> Self {
        if is_video_host(url) {
            Strategy::Transcript
        } else {
            Strategy::Page
        }
    }

    /// The system prompt matching this strategy.
    pub fn prompt(&self) -> &'static str {
        match self {
            Strategy::Transcript => TRANSCRIPT_PROMPT,
            Strategy::Page => PAGE_PROMPT,
        }
    }
}

/// Host-based video-platform check. Matching on the parsed host rather
/// than a substring keeps `https://example.com/?ref=youtube.com` out of
/// the transcript path.
fn is_video_host(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    match parsed.host_str() {
        Some(host) => {
            host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
        }
        None => false,
    }
}

/// Source of raw text for a URL, selected by [`Strategy`].
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Produce the text blob to summarise for `url`.
    async fn extract(&self, url: &str, strategy: Strategy) -> Result<String, ExtractError>;
}

/// Production content source: scrapes pages and fetches caption tracks
/// over HTTP.
#[derive(Debug, Default)]
pub struct WebContentSource;

impl WebContentSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentSource for WebContentSource {
    async fn extract(&self, url: &str, strategy: Strategy) -> Result<String, ExtractError> {
        match strategy {
            Strategy::Transcript => transcript::fetch_transcript(url).await,
            Strategy::Page => {
                let content = scraper::fetch_content(url).await?;
                // Keep the page title in the blob; it anchors the summary
                // the same way the visible headline does for a reader.
                Ok(match content.title {
                    Some(title) => format!("{}\n\n{}", title, content.text),
                    None => content.text,
                })
            }
        }
    }
}
