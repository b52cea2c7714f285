//! Image generation types.
//!
//! [`ImageProperties`] is what the extraction model returns for a free-form
//! image request; [`ImageGenerationRequest`] is the fixed-shape call made to
//! the image provider.

use serde::{Deserialize, Serialize};

/// Status code the extraction model uses to signal an empty prompt.
pub const PROMPT_NOT_FOUND: u16 = 404;

/// Inference steps used for every generation.
pub const NUM_INFERENCE_STEPS: u32 = 4;

/// Seed value the provider interprets as "random".
pub const RANDOM_SEED: i64 = -1;

fn default_status_code() -> u16 {
    200
}

fn default_extension() -> String {
    "png".to_string()
}

fn default_dimension() -> u32 {
    1024
}

/// Image parameters inferred from user text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageProperties {
    #[serde(rename = "statusCode", default = "default_status_code")]
    pub status_code: u16,
    #[serde(default = "default_extension")]
    pub response_extension: String,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ImageProperties {
    /// The local answer for an empty prompt, matching what the model is
    /// instructed to return.
    pub fn not_found() -> Self {
        Self {
            status_code: PROMPT_NOT_FOUND,
            response_extension: default_extension(),
            width: default_dimension(),
            height: default_dimension(),
            negative_prompt: String::new(),
            prompt: String::new(),
            message: Some("Prompt not found".to_string()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == PROMPT_NOT_FOUND
    }
}

/// Request sent to the image provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub response_format: String,
    pub response_extension: String,
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub negative_prompt: String,
    pub seed: i64,
    pub loras: Option<serde_json::Value>,
    pub prompt: String,
}

impl ImageGenerationRequest {
    pub fn from_properties(model: impl Into<String>, props: &ImageProperties) -> Self {
        Self {
            model: model.into(),
            response_format: "url".to_string(),
            response_extension: props.response_extension.clone(),
            width: props.width,
            height: props.height,
            num_inference_steps: NUM_INFERENCE_STEPS,
            negative_prompt: props.negative_prompt.clone(),
            seed: RANDOM_SEED,
            loras: None,
            prompt: props.prompt.clone(),
        }
    }
}

/// Errors from the image provider.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image request failed: {0}")]
    Request(String),

    #[error("image provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("image response could not be decoded: {0}")]
    Deserialization(String),

    #[error("image provider returned no image")]
    NoImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_defaults() {
        let props: ImageProperties =
            serde_json::from_str(r#"{"statusCode":200,"prompt":"a fox"}"#).unwrap();
        assert_eq!(props.response_extension, "png");
        assert_eq!(props.width, 1024);
        assert_eq!(props.height, 1024);
        assert_eq!(props.negative_prompt, "");
        assert!(!props.is_not_found());
    }

    #[test]
    fn test_properties_not_found_from_model() {
        let props: ImageProperties =
            serde_json::from_str(r#"{"statusCode":404,"message":"Prompt not found"}"#).unwrap();
        assert!(props.is_not_found());
        assert_eq!(props, ImageProperties::not_found());
    }

    #[test]
    fn test_generation_request_fixed_fields() {
        let props: ImageProperties = serde_json::from_str(
            r#"{"statusCode":200,"response_extension":"jpg","width":512,"height":768,"negative_prompt":"fire","prompt":"dragon"}"#,
        )
        .unwrap();
        let req = ImageGenerationRequest::from_properties("black-forest-labs/flux-schnell", &props);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["response_format"], "url");
        assert_eq!(json["num_inference_steps"], 4);
        assert_eq!(json["seed"], -1);
        assert!(json["loras"].is_null());
        assert_eq!(json["width"], 512);
        assert_eq!(json["response_extension"], "jpg");
    }
}
