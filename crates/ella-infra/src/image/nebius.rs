//! NebiusImages -- [`ImageGenerator`] for the Nebius OpenAI-compatible
//! images endpoint.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use ella_core::provider::image::ImageGenerator;
use ella_types::image::{ImageError, ImageGenerationRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct NebiusImages {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl NebiusImages {
    pub fn new(api_key: SecretString, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

#[derive(Deserialize)]
struct WireImage {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    data: Vec<WireImage>,
}

/// URLs in provider order; entries without a URL are skipped.
fn parse_urls(body: &str) -> Result<Vec<String>, ImageError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| ImageError::Deserialization(e.to_string()))?;
    Ok(wire.data.into_iter().filter_map(|image| image.url).collect())
}

impl ImageGenerator for NebiusImages {
    #[tracing::instrument(skip_all, fields(provider = "nebius", model = %request.model))]
    async fn generate(&self, request: &ImageGenerationRequest) -> Result<Vec<String>, ImageError> {
        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|e| ImageError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ImageError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ImageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let urls = parse_urls(&body)?;
        tracing::debug!(count = urls.len(), "Image generation completed");
        Ok(urls)
    }
}
