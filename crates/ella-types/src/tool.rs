//! Tool selection and the directive derived from raw user input.
//!
//! A user turn is classified exactly once, at submission time, by a literal
//! prefix convention (`/web `, `/image `). The resulting [`Tool`] travels in
//! the job payload; nothing downstream re-parses the raw text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix selecting the web-search tool.
pub const WEB_PREFIX: &str = "/web";

/// Prefix selecting the image-generation tool.
pub const IMAGE_PREFIX: &str = "/image";

/// The response strategy for an assistant turn.
///
/// Also used as the declared type of a message record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Text,
    Web,
    Image,
}

impl Tool {
    /// Whether this tool needs an elevated plan.
    pub fn requires_pro_plan(self) -> bool {
        !matches!(self, Tool::Text)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Text => write!(f, "text"),
            Tool::Web => write!(f, "web"),
            Tool::Image => write!(f, "image"),
        }
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Tool::Text),
            "web" => Ok(Tool::Web),
            "image" => Ok(Tool::Image),
            other => Err(format!("invalid tool: '{other}'")),
        }
    }
}

/// Classification of a raw user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDirective {
    pub tool: Tool,
    /// The user text with the tool prefix removed.
    pub message: String,
}

impl ToolDirective {
    /// Classify raw input by its leading tool prefix.
    ///
    /// `/web` and `/image` select their tools and are stripped together with
    /// the whitespace that follows them. Anything else is a plain text turn
    /// and is passed through untouched.
    pub fn classify(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix(WEB_PREFIX) {
            return Self {
                tool: Tool::Web,
                message: rest.trim().to_string(),
            };
        }
        if let Some(rest) = raw.strip_prefix(IMAGE_PREFIX) {
            return Self {
                tool: Tool::Image,
                message: rest.trim().to_string(),
            };
        }
        Self {
            tool: Tool::Text,
            message: raw.to_string(),
        }
    }
}
