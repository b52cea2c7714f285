//! Placeholder substitution for prompt templates.

/// Substitute each `(placeholder, value)` pair into `template`, in order.
///
/// Only the first occurrence of each placeholder is replaced. Later pairs
/// see the output of earlier ones, so a value that itself contains a later
/// placeholder absorbs that substitution.
pub fn fill_template(template: &str, pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .fold(template.to_string(), |acc, (placeholder, value)| {
            acc.replacen(placeholder, value, 1)
        })
}
