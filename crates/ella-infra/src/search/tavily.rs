//! TavilySearch -- [`WebSearchProvider`] backed by the Tavily REST API.
//!
//! The API key is a [`SecretString`] and only leaves it for the
//! `Authorization` header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use ella_core::provider::search::WebSearchProvider;
use ella_types::search::{SearchError, SearchImage, SearchRequest, SearchResponse, SearchResult};

/// Searches can pull raw page content, so allow more than a chat call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct TavilySearch {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl TavilySearch {
    pub fn new(api_key: SecretString, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

/// Tavily returns bare URL strings for images unless descriptions were
/// requested, in which case it returns objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireImage {
    Url(String),
    Described {
        url: String,
        #[serde(default)]
        description: Option<String>,
    },
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    images: Vec<WireImage>,
}

impl From<WireResponse> for SearchResponse {
    fn from(wire: WireResponse) -> Self {
        SearchResponse {
            answer: wire.answer,
            results: wire.results,
            images: wire
                .images
                .into_iter()
                .map(|image| match image {
                    WireImage::Url(url) => SearchImage {
                        url,
                        description: None,
                    },
                    WireImage::Described { url, description } => SearchImage { url, description },
                })
                .collect(),
        }
    }
}

fn parse_response(body: &str) -> Result<SearchResponse, SearchError> {
    serde_json::from_str::<WireResponse>(body)
        .map(SearchResponse::from)
        .map_err(|e| SearchError::Deserialization(e.to_string()))
}

impl WebSearchProvider for TavilySearch {
    #[tracing::instrument(skip_all, fields(provider = "tavily"))]
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => SearchError::AuthenticationFailed,
                code => SearchError::Status { status: code, body },
            });
        }

        let parsed = parse_response(&body)?;
        tracing::debug!(
            results = parsed.results.len(),
            images = parsed.images.len(),
            "Web search completed"
        );
        Ok(parsed)
    }
}
