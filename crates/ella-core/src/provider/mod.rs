//! Ports for the non-LLM external providers.

pub mod image;
pub mod search;
