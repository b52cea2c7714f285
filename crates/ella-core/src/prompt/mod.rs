//! Prompt assembly: fixed instructions and placeholder substitution.

pub mod image;
pub mod persona;
pub mod template;
pub mod title;
pub mod web;
