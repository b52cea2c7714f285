//! Application configuration types for Ella.
//!
//! `AppConfig` represents `config.toml` in the data directory. Every field
//! has a default so an empty or partial file is valid.

use serde::{Deserialize, Serialize};

use crate::job::RetryConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Provider models and endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// OpenAI-compatible endpoint serving the text model.
    #[serde(default = "default_text_base_url")]
    pub text_base_url: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_text_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_image_model() -> String {
    "black-forest-labs/flux-schnell".to_string()
}

fn default_image_base_url() -> String {
    "https://api.studio.nebius.com/v1".to_string()
}

fn default_search_base_url() -> String {
    "https://api.tavily.com".to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            text_model: default_text_model(),
            text_base_url: default_text_base_url(),
            image_model: default_image_model(),
            image_base_url: default_image_base_url(),
            search_base_url: default_search_base_url(),
        }
    }
}

/// Background job settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Maximum jobs executing at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Prior messages given to the model as short-term memory.
    #[serde(default = "default_context_window")]
    pub context_window: u32,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_concurrency() -> usize {
    4
}

fn default_context_window() -> u32 {
    5
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            concurrency: default_concurrency(),
            context_window: default_context_window(),
        }
    }
}

impl JobsConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            backoff_ms: self.backoff_ms,
        }
    }
}
