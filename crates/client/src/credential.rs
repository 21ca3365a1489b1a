//! The one place that knows how the backend spells its session credential.

use ecourts_core::Credential;
use serde_json::Value;

/// Response fields carrying a token, in lookup order.
pub const TOKEN_FIELDS: [&str; 3] = ["app_token", "next_app_token", "token"];
pub const COOKIES_FIELD: &str = "cookies";

/// Field a token is sent back under.
pub const OUTGOING_TOKEN_FIELD: &str = "app_token";

/// Pulls a credential out of a response body, whichever accepted field holds it.
pub fn extract(body: &Value) -> Option<Credential> {
    for field in TOKEN_FIELDS {
        if let Some(token) = body.get(field).and_then(Value::as_str) {
            if !token.trim().is_empty() {
                return Some(Credential::Token(token.to_string()));
            }
        }
    }
    match body.get(COOKIES_FIELD) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::Array(a)) if a.is_empty() => None,
        Some(cookies) => Some(Credential::Cookies(cookies.clone())),
    }
}

/// The credential to use after `body`: the refreshed one if present, else `prior`.
pub fn refresh(prior: Option<&Credential>, body: &Value) -> Option<Credential> {
    extract(body).or_else(|| prior.cloned())
}

/// Writes `credential` into an outgoing JSON object body.
pub fn attach(body: &mut Value, credential: &Credential) {
    if !body.is_object() {
        *body = Value::Object(serde_json::Map::new());
    }
    let (field, value) = match credential {
        Credential::Token(token) => (OUTGOING_TOKEN_FIELD, Value::String(token.clone())),
        Credential::Cookies(cookies) => (COOKIES_FIELD, cookies.clone()),
    };
    body[field] = value;
}
