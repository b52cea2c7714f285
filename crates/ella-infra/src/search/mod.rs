//! Web search provider implementations.

pub mod tavily;
