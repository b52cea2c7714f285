//! Infrastructure layer for Ella.
//!
//! Contains implementations of the traits defined in `ella-core`: SQLite
//! storage, the OpenAI-compatible text model client, the Tavily search
//! client, the Nebius image client, token hashing, and configuration and
//! data-directory loading.

pub mod config;
pub mod crypto;
pub mod filesystem;
pub mod image;
pub mod llm;
pub mod search;
pub mod secret;
pub mod sqlite;
