//! Web search request/response types.

use serde::{Deserialize, Serialize};

use crate::conversation::{ImageResult, Resource};

/// Raw page content format requested from the search provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawContentFormat {
    Text,
    Markdown,
}

/// A web search query with its inclusion flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub include_answer: bool,
    pub include_images: bool,
    pub include_image_descriptions: bool,
    pub include_favicon: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_raw_content: Option<RawContentFormat>,
}

impl SearchRequest {
    /// Everything the web tool needs: answer, images with descriptions,
    /// favicons, and plain-text page contents.
    pub fn full(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            include_answer: true,
            include_images: true,
            include_image_descriptions: true,
            include_favicon: true,
            include_raw_content: Some(RawContentFormat::Text),
        }
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub score: f64,
}

/// An image found by the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchImage {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Normalized search provider output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub images: Vec<SearchImage>,
}

impl SearchResponse {
    /// Cited pages, one per result; a missing favicon becomes `""`.
    pub fn resources(&self) -> Vec<Resource> {
        self.results
            .iter()
            .map(|r| Resource {
                url: r.url.clone(),
                favicon: r.favicon.clone().unwrap_or_default(),
            })
            .collect()
    }

    /// Raw page contents in rank order. Results without raw content
    /// contribute `null` so positions stay aligned with `results`.
    pub fn contents(&self) -> Vec<Option<String>> {
        self.results.iter().map(|r| r.raw_content.clone()).collect()
    }

    /// Image list for persistence; a missing description becomes `""`.
    pub fn image_results(&self) -> Vec<ImageResult> {
        self.images
            .iter()
            .map(|i| ImageResult {
                url: i.url.clone(),
                description: i.description.clone().unwrap_or_default(),
            })
            .collect()
    }
}

/// Errors from the web search provider.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("search response could not be decoded: {0}")]
    Deserialization(String),

    #[error("search provider rejected the API key")]
    AuthenticationFailed,
}
