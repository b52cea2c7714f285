//! User records and subscription plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription plan of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

impl Plan {
    pub fn is_pro(self) -> bool {
        matches!(self, Plan::Pro)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Free => write!(f, "free"),
            Plan::Pro => write!(f, "pro"),
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            other => Err(format!("invalid plan: '{other}'")),
        }
    }
}

/// A registered user.
///
/// The bearer token itself is never stored; only its SHA-256 hash lives in
/// the database and it is not part of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub clerk_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
}

/// Profile fields used when creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_default_is_free() {
        assert_eq!(Plan::default(), Plan::Free);
        assert!(!Plan::Free.is_pro());
        assert!(Plan::Pro.is_pro());
    }

    #[test]
    fn test_plan_parse() {
        assert_eq!("PRO".parse::<Plan>().unwrap(), Plan::Pro);
        assert!("enterprise".parse::<Plan>().is_err());
    }

    #[test]
    fn test_profile_deserializes_partial() {
        let p: UserProfile = serde_json::from_str(r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(p.name, "Ada");
        assert_eq!(p.email, "");
    }
}
