//! Drives the five dependent backend calls of a party search.
//!
//! Every step takes the current [`SessionState`] and returns its successor in
//! a [`StepResult`], success or not. Preconditions are checked before any
//! request is built; a step that fails them never touches the network.

use chrono::Utc;
use ecourts_client::{credential, Api};
use ecourts_core::session::normalize_code;
use ecourts_core::{
    CaptchaImage, Complex, Config, Credential, District, Error, Field, Result, SessionState,
    SessionUpdate,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::search::{classify_results, CaseStatus, SearchQuery};

pub const INITIAL_DATA_PATH: &str = "/initial-data";
pub const DISTRICTS_PATH: &str = "/districts";
pub const COMPLEXES_PATH: &str = "/complexes";
pub const SET_LOCATION_PATH: &str = "/set-location";
pub const SEARCH_PARTY_PATH: &str = "/search-party";

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub captcha_path: String,
    pub default_case_status: CaseStatus,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            captcha_path: ecourts_core::config::CAPTCHA_PATHS[0].to_string(),
            default_case_status: CaseStatus::Pending,
        }
    }
}

impl WorkflowOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        let default_case_status: CaseStatus = config
            .search
            .default_case_status
            .parse()
            .map_err(|e: Error| Error::Config(format!("search.defaultCaseStatus: {}", e)))?;
        Ok(Self {
            captcha_path: config.api.captcha_path.clone(),
            default_case_status,
        })
    }
}

/// Outcome of one step plus the session to continue from.
///
/// `session` is meaningful on failure too: it carries `last_error`, any
/// selection change the step made, and a refreshed credential if the
/// failing response contained one.
#[derive(Debug)]
pub struct StepResult<T> {
    pub session: SessionState,
    pub outcome: Result<T>,
}

impl<T> StepResult<T> {
    fn ok(session: SessionState, value: T) -> Self {
        Self {
            session: session.clear_error(),
            outcome: Ok(value),
        }
    }

    fn failed(session: SessionState, err: Error) -> Self {
        Self {
            session: session.with_error(err.to_string()),
            outcome: Err(err),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn into_parts(self) -> (SessionState, Result<T>) {
        (self.session, self.outcome)
    }
}

/// Parses `response[field]` as a list, skipping entries that do not decode.
/// A missing or non-array field yields an empty list.
fn parse_list<T: DeserializeOwned>(response: &Value, field: &str) -> Vec<T> {
    let Some(items) = response.get(field).and_then(Value::as_array) else {
        warn!(field, "Response has no usable list, treating as empty");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(field, error = %e, item = %item, "Skipping malformed list entry");
                None
            }
        })
        .collect()
}

fn required_input(value: &str, message: &str) -> Result<String> {
    normalize_code(Some(value)).ok_or_else(|| Error::Validation(message.to_string()))
}

fn check_complexes(session: &SessionState, dist_code: &str) -> Result<(String, String)> {
    session.require_credential()?;
    let state_code = session.require(Field::State)?.to_string();
    if session.districts.is_none() {
        return Err(Error::Validation(
            "List districts for the selected state first.".to_string(),
        ));
    }
    let dist_code = required_input(dist_code, "Please select a State and District.")?;
    Ok((state_code, dist_code))
}

fn check_location(session: &SessionState, complex_code: &str) -> Result<(String, String, String)> {
    session.require_credential()?;
    let state_code = session.require(Field::State)?.to_string();
    let dist_code = session.require(Field::District)?.to_string();
    let complex_code = required_input(complex_code, "Please select State, District, and Complex.")?;
    Ok((state_code, dist_code, complex_code))
}

fn check_captcha(session: &SessionState) -> Result<()> {
    session.require_credential()?;
    for field in [Field::State, Field::District, Field::Complex] {
        session.require(field)?;
    }
    if session.location.is_none() {
        return Err(Error::Validation("Please set location first.".to_string()));
    }
    Ok(())
}

fn search_body(session: &SessionState, query: &SearchQuery, default_status: CaseStatus) -> Result<Value> {
    let missing = "Please fill all required search fields and ensure location is set.";
    let party_name = required_input(&query.party_name, missing)?;
    let year = required_input(&query.year, missing)?;
    let captcha_text = required_input(&query.captcha_text, missing)?;
    let state_code = session.require(Field::State)?;
    let dist_code = session.require(Field::District)?;
    let complex_code = session.require(Field::Complex)?;
    if session.captcha.is_none() || session.credential.is_none() {
        return Err(Error::Validation(
            "Captcha not fetched or token is missing. Fetch a new captcha first.".to_string(),
        ));
    }
    let case_status = query.case_status.unwrap_or(default_status);
    Ok(json!({
        "petres_name": party_name,
        "rgyearP": year,
        "case_status": case_status.as_param(),
        "fcaptcha_code": captcha_text,
        "state_code": state_code,
        "dist_code": dist_code,
        "court_complex_code": complex_code,
        "est_code": session.selections.est_code,
    }))
}

pub struct Workflow<A: Api> {
    api: Arc<A>,
    options: WorkflowOptions,
}

impl<A: Api> Workflow<A> {
    pub fn new(api: Arc<A>, options: WorkflowOptions) -> Self {
        Self { api, options }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// Sends `body` with the session credential attached. Returns the response
    /// and the refreshed credential, if the response carried one.
    async fn call(
        &self,
        session: &SessionState,
        path: &str,
        mut body: Value,
    ) -> Result<(Value, Option<Credential>)> {
        let current = session.require_credential()?;
        credential::attach(&mut body, current);
        let response = self.api.post(path, &body).await?;
        let refreshed = credential::refresh(Some(current), &response);
        match &refreshed {
            Some(next) if next != current => debug!(path, credential = %next, "Credential refreshed"),
            _ => info!(path, "Response carried no new credential, keeping the previous one"),
        }
        Ok((response, refreshed))
    }

    /// Opens a backend session. Any failure here is a setup error.
    pub async fn bootstrap(&self) -> Result<SessionState> {
        info!("Fetching initial session");
        let response = self
            .api
            .get(INITIAL_DATA_PATH)
            .await
            .map_err(|e| Error::Setup(format!("Initial data request failed: {}", e)))?;
        let credential = credential::extract(&response)
            .ok_or_else(|| Error::Setup("Initial data response missing app_token.".to_string()))?;
        info!(credential = %credential, "Session initialised");
        Ok(SessionState::with_credential(credential))
    }

    pub async fn list_districts(&self, session: &SessionState, state_code: &str) -> StepResult<Vec<District>> {
        let code = match required_input(state_code, "Please enter a State Code.") {
            Ok(code) => code,
            Err(e) => return StepResult::failed(session.clone(), e),
        };
        if let Err(e) = session.require_credential() {
            return StepResult::failed(session.clone(), e);
        }

        let next = session.clone().select(Field::State, Some(&code));
        match self.call(&next, DISTRICTS_PATH, json!({ "state_code": code })).await {
            Ok((response, credential)) => {
                let districts: Vec<District> = parse_list(&response, "districts");
                info!(state_code = %code, count = districts.len(), "Found districts");
                let next = next.update(SessionUpdate {
                    credential,
                    districts: Some(districts.clone()),
                    ..SessionUpdate::default()
                });
                StepResult::ok(next, districts)
            }
            Err(e) => StepResult::failed(next, e),
        }
    }

    pub async fn list_complexes(&self, session: &SessionState, dist_code: &str) -> StepResult<Vec<Complex>> {
        let (state_code, dist_code) = match check_complexes(session, dist_code) {
            Ok(codes) => codes,
            Err(e) => return StepResult::failed(session.clone(), e),
        };

        let next = session.clone().select(Field::District, Some(&dist_code));
        let body = json!({ "state_code": state_code, "dist_code": dist_code });
        match self.call(&next, COMPLEXES_PATH, body).await {
            Ok((response, credential)) => {
                let complexes: Vec<Complex> = parse_list(&response, "complexes");
                info!(dist_code = %dist_code, count = complexes.len(), "Found complexes");
                let next = next.update(SessionUpdate {
                    credential,
                    complexes: Some(complexes.clone()),
                    ..SessionUpdate::default()
                });
                StepResult::ok(next, complexes)
            }
            Err(e) => StepResult::failed(next, e),
        }
    }

    /// Fixes the court context server-side. Required before a captcha fetch.
    pub async fn set_location(
        &self,
        session: &SessionState,
        complex_code: &str,
        est_code: Option<&str>,
    ) -> StepResult<Value> {
        let (state_code, dist_code, complex_code) = match check_location(session, complex_code) {
            Ok(codes) => codes,
            Err(e) => return StepResult::failed(session.clone(), e),
        };
        let est_code = normalize_code(est_code);

        let next = session
            .clone()
            .select(Field::Complex, Some(&complex_code))
            .select(Field::Establishment, est_code.as_deref());
        let body = json!({
            "complex_code": complex_code,
            "selected_state_code": state_code,
            "selected_dist_code": dist_code,
            "selected_est_code": est_code,
        });
        match self.call(&next, SET_LOCATION_PATH, body).await {
            Ok((response, credential)) => {
                let result = response.get("result").cloned().unwrap_or(Value::Null);
                info!(complex_code = %complex_code, result = %result, "Location set");
                let next = next.update(SessionUpdate {
                    credential,
                    location: Some(result.clone()),
                    ..SessionUpdate::default()
                });
                StepResult::ok(next, result)
            }
            Err(e) => StepResult::failed(next, e),
        }
    }

    /// Fetches a fresh captcha. Any previously fetched captcha is discarded
    /// before the request goes out, whatever the outcome.
    pub async fn fetch_captcha(&self, session: &SessionState) -> StepResult<CaptchaImage> {
        if let Err(e) = check_captcha(session) {
            return StepResult::failed(session.clone(), e);
        }

        let next = session.clone().discard_captcha().reset_downstream_of(Field::Captcha);
        let captcha_path = self.options.captcha_path.clone();
        match self.call(&next, &captcha_path, json!({})).await {
            Ok((response, credential)) => {
                let next = next.update(SessionUpdate {
                    credential,
                    ..SessionUpdate::default()
                });
                let image_url = response
                    .get("imageUrl")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|u| !u.is_empty());
                let Some(image_url) = image_url else {
                    return StepResult::failed(
                        next,
                        Error::MalformedResponse("Captcha response missing imageUrl.".to_string()),
                    );
                };
                let captcha = CaptchaImage {
                    image_url: image_url.to_string(),
                    generation: next.next_captcha_generation(),
                    fetched_at: Utc::now(),
                };
                info!(generation = captcha.generation, image_url = %captcha.image_url, "Captcha fetched");
                let next = next.update(SessionUpdate {
                    captcha: Some(captcha.clone()),
                    ..SessionUpdate::default()
                });
                StepResult::ok(next, captcha)
            }
            Err(e) => StepResult::failed(next, e),
        }
    }

    /// Runs the party search against the current captcha.
    ///
    /// On `InvalidCaptcha` the captcha is dropped from the returned session;
    /// fetch a new one before retrying.
    pub async fn search_party(&self, session: &SessionState, query: &SearchQuery) -> StepResult<Value> {
        let body = match search_body(session, query, self.options.default_case_status) {
            Ok(body) => body,
            Err(e) => return StepResult::failed(session.clone(), e),
        };

        let next = session.clone().reset_downstream_of(Field::Captcha);
        let (response, credential) = match self.call(&next, SEARCH_PARTY_PATH, body).await {
            Ok(pair) => pair,
            Err(e) => return StepResult::failed(next, e),
        };
        let next = next.update(SessionUpdate {
            credential,
            ..SessionUpdate::default()
        });

        let Some(results) = response.get("results").filter(|v| !v.is_null()).cloned() else {
            return StepResult::failed(
                next,
                Error::MalformedResponse("Search response missing results data.".to_string()),
            );
        };
        match classify_results(&results) {
            Ok(()) => {
                info!("Search completed");
                let next = next.update(SessionUpdate {
                    results: Some(results.clone()),
                    ..SessionUpdate::default()
                });
                StepResult::ok(next, results)
            }
            Err(e) if e.is_invalid_captcha() => {
                warn!(error = %e, "Backend rejected the captcha, discarding it");
                StepResult::failed(next.discard_captcha(), e)
            }
            Err(e) => {
                warn!(error = %e, "Search failed");
                StepResult::failed(next, e)
            }
        }
    }
}
