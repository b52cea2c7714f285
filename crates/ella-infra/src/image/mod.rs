//! Image generation provider implementations.

pub mod nebius;
