//! Related-article lookup via a similarity-search service.
//!
//! Sends the source URL to an Exa-compatible `findSimilar` endpoint,
//! excluding the URL's own host so the results point somewhere new.
//! Service order is relevance order and is preserved as-is.

use crate::summary::RelatedArticle;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.exa.ai";

/// Default timeout for HTTP requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on related articles per lookup.
const MAX_RESULTS: usize = 10;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("request to similarity-search service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("similarity-search service error ({status}): {body}")]
    Service { status: u16, body: String },
    #[error("malformed similarity-search response: {0}")]
    MalformedResponse(String),
    #[error("cannot derive a host to exclude from: {0}")]
    InvalidUrl(String),
}

/// Related-article seam used by the pipeline.
#[async_trait]
pub trait RelatedFinder: Send + Sync {
    /// Find up to ten articles related to `url`, excluding its own host.
    async fn find_related(&self, url: &str) -> Result<Vec<RelatedArticle>, EnrichError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindSimilarRequest<'a> {
    url: &'a str,
    num_results: usize,
    exclude_domains: Vec<String>,
    contents: ContentsSpec,
}

#[derive(Debug, Serialize)]
struct ContentsSpec {
    text: bool,
}

#[derive(Debug, Deserialize)]
struct FindSimilarResponse {
    results: Vec<RelatedArticle>,
}

/// Production finder against the Exa API.
pub struct ExaClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ExaClient {
    /// Create a finder for the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Set a custom base URL (useful for testing with a mock server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Build the lookup request, deriving the excluded host from the URL.
fn build_request(url: &str) -> Result<FindSimilarRequest<'_>, EnrichError> {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .ok_or_else(|| EnrichError::InvalidUrl(url.to_string()))?;

    Ok(FindSimilarRequest {
        url,
        num_results: MAX_RESULTS,
        exclude_domains: vec![host],
        contents: ContentsSpec { text: true },
    })
}

/// Apply the result bound without disturbing service order.
fn related_from(response: FindSimilarResponse) -> Vec<RelatedArticle> {
    let mut results = response.results;
    results.truncate(MAX_RESULTS);
    results
}

#[async_trait]
impl RelatedFinder for ExaClient {
    async fn find_related(&self, url: &str) -> Result<Vec<RelatedArticle>, EnrichError> {
        let request = build_request(url)?;

        let response = self
            .client
            .post(format!("{}/findSimilar", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "similarity-search service returned an error");
            return Err(EnrichError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: FindSimilarResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::MalformedResponse(e.to_string()))?;

        let results = related_from(parsed);
        debug!(count = results.len(), "related articles fetched");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_excludes_own_host() {
        let request = build_request("https://example.com/article1").unwrap();
        assert_eq!(request.exclude_domains, vec!["example.com".to_string()]);
        assert_eq!(request.num_results, 10);
        assert!(request.contents.text);
        assert_eq!(request.url, "https://example.com/article1");
    }

    #[test]
    fn request_uses_service_field_names() {
        let request = build_request("https://example.com/article1").unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["numResults"], 10);
        assert_eq!(json["excludeDomains"][0], "example.com");
        assert_eq!(json["contents"]["text"], true);
    }

    #[test]
    fn port_is_not_part_of_the_excluded_host() {
        let request = build_request("https://example.com:8443/article1").unwrap();
        assert_eq!(request.exclude_domains, vec!["example.com".to_string()]);
    }

    #[test]
    fn subdomains_are_excluded_as_given() {
        let request = build_request("https://blog.example.com/post").unwrap();
        assert_eq!(request.exclude_domains, vec!["blog.example.com".to_string()]);
    }

    #[test]
    fn hostless_identifier_is_rejected() {
        assert!(matches!(
            build_request("not a url"),
            Err(EnrichError::InvalidUrl(_))
        ));
    }

    #[test]
    fn results_are_capped_at_ten_in_service_order() {
        let results: Vec<RelatedArticle> = (0..12)
            .map(|i| RelatedArticle {
                title: format!("title {i}"),
                url: format!("https://other.com/{i}"),
                excerpt: String::new(),
            })
            .collect();
        let capped = related_from(FindSimilarResponse { results });

        assert_eq!(capped.len(), 10);
        assert_eq!(capped[0].title, "title 0");
        assert_eq!(capped[9].title, "title 9");
    }

    #[test]
    fn response_parsing_reads_wire_text_as_excerpt() {
        let parsed: FindSimilarResponse = serde_json::from_str(
            r#"{
                "results": [
                    {"title": "A", "url": "https://other.com/a", "text": "excerpt A", "score": 0.92, "publishedDate": "2024-01-01"}
                ],
                "requestId": "abc"
            }"#,
        )
        .unwrap();
        let results = related_from(parsed);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].excerpt, "excerpt A");
        assert_eq!(results[0].title, "A");
    }
}
