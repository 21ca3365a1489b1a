use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required selection or input is missing. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The initial session call did not yield a usable credential.
    #[error("Setup error: {0}")]
    Setup(String),

    /// Non-2xx response. `message` is the backend's `error` field verbatim.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Application failure reported inside a 2xx body (`status: 0`).
    #[error("eCourts error: {0}")]
    Domain(String),

    /// Domain failure caused by a wrong or expired captcha. The captcha
    /// has to be fetched again before the search is retried.
    #[error("Invalid captcha: {0}")]
    InvalidCaptcha(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_invalid_captcha(&self) -> bool {
        matches!(self, Error::InvalidCaptcha(_))
    }

    /// True for failures raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Busy(_))
    }

    pub fn category(&self) -> &'static str {
        match self {
            Error::Validation(_) | Error::Busy(_) => "local",
            Error::Http { .. }
            | Error::Transport(_)
            | Error::Timeout(_)
            | Error::MalformedResponse(_) => "transport",
            Error::InvalidCaptcha(_) => "invalid_captcha",
            Error::Domain(_) => "domain",
            Error::Setup(_) => "setup",
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Other(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
