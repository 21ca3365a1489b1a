use ecourts_client::resolve_image_url;
use ecourts_core::{Result, SessionState};
use serde_json::Value;
use ecourts_workflow::{CaseStatus, SearchQuery, StepResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{build_workflow, describe_error, print_json, Overrides};

pub struct RunArgs {
    pub state: String,
    pub district: String,
    pub complex: String,
    pub est: Option<String>,
    pub name: String,
    pub year: String,
    pub status: Option<String>,
    pub captcha_attempts: u32,
}

fn finish<T>(step: StepResult<T>, what: &str) -> anyhow::Result<(SessionState, T)> {
    let (session, outcome) = step.into_parts();
    match outcome {
        Ok(value) => Ok((session, value)),
        Err(e) => anyhow::bail!("{} failed: {}", what, describe_error(&e)),
    }
}

/// Runs every step in order. Progress goes to stderr, the search results to stdout.
pub async fn run(overrides: &Overrides, args: RunArgs) -> anyhow::Result<()> {
    let config = overrides.load()?;
    let workflow = build_workflow(&config)?;
    let case_status = args
        .status
        .as_deref()
        .map(str::parse::<CaseStatus>)
        .transpose()?;

    let session = workflow.bootstrap().await?;
    eprintln!("Initial data fetched.");

    let (session, districts) = finish(workflow.list_districts(&session, &args.state).await, "Districts")?;
    eprintln!("Found {} districts.", districts.len());

    let (session, complexes) = finish(workflow.list_complexes(&session, &args.district).await, "Complexes")?;
    eprintln!("Found {} complexes.", complexes.len());

    let (mut session, result) = finish(
        workflow
            .set_location(&session, &args.complex, args.est.as_deref())
            .await,
        "Set location",
    )?;
    eprintln!("Location set. Result: {}", result);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let attempts = args.captcha_attempts.max(1);
    let mut attempt = 1;
    loop {
        let (next, captcha) = finish(workflow.fetch_captcha(&session).await, "Captcha")?;
        eprintln!(
            "Captcha #{}: {}",
            captcha.generation,
            resolve_image_url(workflow.api().base_url(), &captcha.image_url)
        );
        eprint!("Captcha code: ");
        std::io::stderr().flush()?;
        let Some(captcha_text) = input.next_line().await? else {
            anyhow::bail!("No captcha code entered");
        };

        let query = SearchQuery {
            party_name: args.name.clone(),
            year: args.year.clone(),
            captcha_text,
            case_status,
        };
        let (after, outcome) = workflow.search_party(&next, &query).await.into_parts();
        if let Some(results) = search_outcome(outcome, attempt, attempts)? {
            eprintln!("Search successful!");
            print_json(&results);
            return Ok(());
        }
        session = after;
        attempt += 1;
    }
}

/// `Some(results)` on success, `None` when a rejected captcha leaves attempts to spare.
fn search_outcome(outcome: Result<Value>, attempt: u32, attempts: u32) -> anyhow::Result<Option<Value>> {
    match outcome {
        Ok(results) => Ok(Some(results)),
        Err(e) if e.is_invalid_captcha() && attempt < attempts => {
            eprintln!("{} (attempt {}/{})", describe_error(&e), attempt, attempts);
            Ok(None)
        }
        Err(e) if e.is_invalid_captcha() => {
            anyhow::bail!("Captcha rejected {} times: {}", attempts, describe_error(&e))
        }
        Err(e) => anyhow::bail!("Search failed: {}", describe_error(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecourts_core::Error;
    use serde_json::json;

    #[test]
    fn test_search_outcome_success() {
        let results = search_outcome(Ok(json!({"status": 1})), 1, 3).unwrap();
        assert_eq!(results, Some(json!({"status": 1})));
    }

    #[test]
    fn test_rejected_captcha_with_attempts_left_retries() {
        let outcome = Err(Error::InvalidCaptcha("Invalid Captcha".into()));
        assert!(search_outcome(outcome, 2, 3).unwrap().is_none());
    }

    #[test]
    fn test_rejected_captcha_on_last_attempt_reports_exhaustion() {
        let outcome = Err(Error::InvalidCaptcha("Invalid Captcha".into()));
        let err = search_outcome(outcome, 3, 3).unwrap_err();
        assert!(err.to_string().starts_with("Captcha rejected 3 times"));
    }

    #[test]
    fn test_domain_failure_stops_immediately() {
        let outcome = Err(Error::Domain("No records found".into()));
        let err = search_outcome(outcome, 1, 3).unwrap_err();
        assert!(err.to_string().starts_with("Search failed"));
    }
}
