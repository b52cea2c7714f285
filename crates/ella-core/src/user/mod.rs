//! User records and bearer-token authentication.

pub mod service;
pub mod token;
