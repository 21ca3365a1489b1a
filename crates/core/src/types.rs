use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque session credential handed out by the backend.
///
/// Some deployments return a token string, others a cookie blob. Both are
/// carried as-is and sent back on the next request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    Token(String),
    Cookies(Value),
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token(token) => write!(f, "{}", token),
            Credential::Cookies(Value::Array(items)) => write!(f, "cookies({})", items.len()),
            Credential::Cookies(Value::Object(map)) => write!(f, "cookies({})", map.len()),
            Credential::Cookies(other) => write!(f, "cookies({})", other),
        }
    }
}

/// Court codes arrive as strings from most endpoints and as numbers from a few.
fn code_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number code, got {}", other))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    #[serde(deserialize_with = "code_string")]
    pub dist_code: String,
    #[serde(default)]
    pub dist_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    #[serde(deserialize_with = "code_string")]
    pub complex_code: String,
    #[serde(default)]
    pub complex_name: String,
}

/// A fetched captcha. Only the most recent one is valid for a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptchaImage {
    pub image_url: String,
    /// Increases with every successful fetch within a session.
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
}
