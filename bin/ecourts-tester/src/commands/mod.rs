pub mod completions_cmd;
pub mod config_cmd;
pub mod run_cmd;
pub mod shell;
pub mod status;

use ecourts_client::HttpApi;
use ecourts_core::{Config, Error, Paths, SessionState};
use ecourts_workflow::{Workflow, WorkflowOptions};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Global flags that take precedence over the config file.
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout: Option<u64>,
}

impl Overrides {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| Paths::new().config_file())
    }

    /// Config as stored on disk, without command-line overrides.
    pub fn load_file(&self) -> anyhow::Result<Config> {
        Ok(Config::load_or_default(&self.config_path())?)
    }

    /// Config with command-line overrides applied.
    pub fn load(&self) -> anyhow::Result<Config> {
        let mut config = self.load_file()?;
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.api.timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn build_workflow(config: &Config) -> anyhow::Result<Workflow<HttpApi>> {
    let api = HttpApi::from_config(config)?;
    let options = WorkflowOptions::from_config(config)?;
    Ok(Workflow::new(Arc::new(api), options))
}

pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!("{}", value),
    }
}

/// One-line explanation of a failed step, with the next action where there is one.
pub fn describe_error(err: &Error) -> String {
    match err {
        Error::InvalidCaptcha(_) => format!(
            "{} Fetch a new captcha (`captcha`) and search again.",
            err
        ),
        Error::Setup(_) => format!("{} Use `restart` to open a new session.", err),
        Error::Validation(_) | Error::Busy(_) => format!("{} (nothing was sent)", err),
        _ => format!("[{}] {}", err.category(), err),
    }
}

pub fn print_session(session: &SessionState) {
    let credential = session
        .credential
        .as_ref()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    println!("Token for next step: {}", credential);
    println!(
        "Selections: state={} district={} complex={} establishment={}",
        or_dash(&session.selections.state_code),
        or_dash(&session.selections.dist_code),
        or_dash(&session.selections.complex_code),
        or_dash(&session.selections.est_code),
    );
    println!(
        "Location set: {}   Captcha: {}",
        if session.location.is_some() { "yes" } else { "no" },
        match &session.captcha {
            Some(c) => format!("#{} ({})", c.generation, c.image_url),
            None => "none".to_string(),
        }
    );
    if let Some(err) = &session.last_error {
        println!("Last error: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let overrides = Overrides {
            config: Some(std::env::temp_dir().join("test_ecourts_missing_config.json")),
            base_url: Some("http://localhost:5000/api/ecourts".to_string()),
            timeout: Some(7),
        };
        let config = overrides.load().unwrap();
        assert_eq!(config.base_url(), "http://localhost:5000/api/ecourts");
        assert_eq!(config.api.timeout_secs, 7);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let overrides = Overrides {
            config: Some(std::env::temp_dir().join("test_ecourts_missing_config.json")),
            base_url: Some("localhost".to_string()),
            timeout: None,
        };
        assert!(overrides.load().is_err());
    }

    #[test]
    fn test_describe_invalid_captcha() {
        let msg = describe_error(&Error::InvalidCaptcha("Invalid Captcha".into()));
        assert!(msg.contains("Fetch a new captcha"));
    }

    #[test]
    fn test_describe_remote_error_names_category() {
        let msg = describe_error(&Error::Timeout("no reply".into()));
        assert_eq!(msg, "[transport] Timeout: no reply");
        let msg = describe_error(&Error::Domain("No records".into()));
        assert!(msg.starts_with("[domain] "));
    }
}
