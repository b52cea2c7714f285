//! Provider API keys read from the environment.
//!
//! Keys are wrapped in [`SecretString`] as soon as they are read so they
//! never show up in `Debug` output or logs.

use secrecy::SecretString;

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";
pub const NEBIUS_API_KEY: &str = "NEBIUS_API_KEY";

/// API keys for the three external providers.
#[derive(Debug, Default)]
pub struct ProviderKeys {
    pub google: Option<SecretString>,
    pub tavily: Option<SecretString>,
    pub nebius: Option<SecretString>,
}

impl ProviderKeys {
    pub fn from_env() -> Self {
        Self {
            google: read_env(GOOGLE_API_KEY),
            tavily: read_env(TAVILY_API_KEY),
            nebius: read_env(NEBIUS_API_KEY),
        }
    }

    /// Names of the variables that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (GOOGLE_API_KEY, self.google.is_none()),
            (TAVILY_API_KEY, self.tavily.is_none()),
            (NEBIUS_API_KEY, self.nebius.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }
}

/// Empty or non-Unicode values count as unset.
fn read_env(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}
