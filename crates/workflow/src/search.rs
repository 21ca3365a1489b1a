use ecourts_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Case-status filter for a party search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseStatus {
    #[default]
    Pending,
    Disposed,
    /// No filter. Sent as an empty string.
    Any,
}

impl CaseStatus {
    pub fn as_param(self) -> &'static str {
        match self {
            CaseStatus::Pending => "Pending",
            CaseStatus::Disposed => "Disposed",
            CaseStatus::Any => "",
        }
    }
}

impl FromStr for CaseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(CaseStatus::Pending),
            "disposed" => Ok(CaseStatus::Disposed),
            "any" | "" => Ok(CaseStatus::Any),
            other => Err(Error::Validation(format!(
                "Unknown case status '{}'. Options: Pending, Disposed, Any",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Any => f.write_str("Any"),
            other => f.write_str(other.as_param()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub party_name: String,
    pub year: String,
    pub captcha_text: String,
    /// `None` uses the workflow's default status.
    pub case_status: Option<CaseStatus>,
}

fn is_zero_status(status: Option<&Value>) -> bool {
    match status {
        Some(Value::Number(n)) => n.as_i64() == Some(0),
        Some(Value::String(s)) => s.trim() == "0",
        _ => false,
    }
}

/// Classifies the `results` object of a search response.
///
/// `status: 0` with a non-empty `errormsg` is an application failure even
/// though the HTTP exchange succeeded. Anything else is a result set.
pub fn classify_results(results: &Value) -> Result<()> {
    if !is_zero_status(results.get("status")) {
        return Ok(());
    }
    let message = results
        .get("errormsg")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if message.is_empty() {
        return Ok(());
    }
    if message.to_ascii_lowercase().contains("invalid captcha") {
        Err(Error::InvalidCaptcha(message.to_string()))
    } else {
        Err(Error::Domain(message.to_string()))
    }
}
