use ecourts_client::{resolve_image_url, HttpApi};
use ecourts_core::{Field, Result, SessionState};
use ecourts_workflow::{CaseStatus, SearchQuery, SessionHolder, Workflow};
use serde_json::Value;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{build_workflow, describe_error, print_json, print_session, Overrides};

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "\
Steps (run in order):
  districts <state_code>           list districts for a state
  complexes <dist_code>            list court complexes for a district
  location <complex_code> [est]    set location (optional establishment code)
  captcha                          fetch a new captcha image
  search                           search by party name (prompts for fields)
Session:
  show [json]                      current token, selections, last error
  token                            token that the next step will send
  results                          last search results
  reset <state|district|complex|establishment|captcha>
                                   clear selections after the given field
  restart                          open a new backend session
  help | /quit";

/// Prints `label`, reads one line. `None` on end of input.
async fn prompt(input: &mut Input, label: &str, default: Option<&str>) -> anyhow::Result<Option<String>> {
    match default {
        Some(d) if !d.is_empty() => print!("{} [{}]: ", label, d),
        _ => print!("{}: ", label),
    }
    std::io::stdout().flush()?;
    let Some(line) = input.next_line().await? else {
        return Ok(None);
    };
    let line = line.trim().to_string();
    if line.is_empty() {
        Ok(Some(default.unwrap_or_default().to_string()))
    } else {
        Ok(Some(line))
    }
}

fn report<T>(outcome: Result<T>, on_ok: impl FnOnce(T)) {
    match outcome {
        Ok(value) => on_ok(value),
        Err(e) => eprintln!("Error: {}", describe_error(&e)),
    }
}

fn parse_field(raw: &str) -> Option<Field> {
    match raw.to_ascii_lowercase().as_str() {
        "state" => Some(Field::State),
        "district" | "dist" => Some(Field::District),
        "complex" => Some(Field::Complex),
        "establishment" | "est" => Some(Field::Establishment),
        "captcha" => Some(Field::Captcha),
        _ => None,
    }
}

async fn bootstrap(workflow: &Workflow<HttpApi>, holder: &mut SessionHolder) -> anyhow::Result<()> {
    holder.begin("initial-data")?;
    println!("Fetching initial data...");
    match workflow.bootstrap().await {
        Ok(session) => {
            holder.replace(session);
            println!("Initial data fetched. Ready for districts.");
        }
        Err(e) => {
            holder.replace(SessionState::default().with_error(e.to_string()));
            eprintln!("Error: {}", describe_error(&e));
        }
    }
    holder.finish();
    Ok(())
}

struct Shell {
    workflow: Workflow<HttpApi>,
    holder: SessionHolder,
    last_query: SearchQuery,
}

impl Shell {
    async fn districts(&mut self, state_code: &str) -> anyhow::Result<()> {
        self.holder.begin("districts")?;
        println!("Fetching districts...");
        let step = self.workflow.list_districts(self.holder.get(), state_code).await;
        report(self.holder.apply(step), |districts| {
            println!("Found {} districts. Select one with `complexes <code>`.", districts.len());
            for d in &districts {
                println!("  {:>6}  {}", d.dist_code, d.dist_name);
            }
        });
        Ok(())
    }

    async fn complexes(&mut self, dist_code: &str) -> anyhow::Result<()> {
        self.holder.begin("complexes")?;
        println!("Fetching complexes...");
        let step = self.workflow.list_complexes(self.holder.get(), dist_code).await;
        report(self.holder.apply(step), |complexes| {
            println!("Found {} complexes. Select one with `location <code>`.", complexes.len());
            for c in &complexes {
                println!("  {:>10}  {}", c.complex_code, c.complex_name);
            }
        });
        Ok(())
    }

    async fn location(&mut self, complex_code: &str, est_code: Option<&str>) -> anyhow::Result<()> {
        self.holder.begin("set-location")?;
        println!("Setting location...");
        let step = self.workflow.set_location(self.holder.get(), complex_code, est_code).await;
        report(self.holder.apply(step), |result: Value| {
            println!("Location set successfully. Result: {}", result);
        });
        Ok(())
    }

    async fn captcha(&mut self) -> anyhow::Result<()> {
        self.holder.begin("captcha")?;
        println!("Fetching captcha...");
        let step = self.workflow.fetch_captcha(self.holder.get()).await;
        let base_url = self.workflow.api().base_url().to_string();
        report(self.holder.apply(step), |captcha| {
            println!("Captcha #{}: {}", captcha.generation, resolve_image_url(&base_url, &captcha.image_url));
            println!("Open the image, then run `search`.");
        });
        Ok(())
    }

    async fn search(&mut self, input: &mut Input) -> anyhow::Result<()> {
        let default_status = self.workflow.options().default_case_status;
        let last_status = self.last_query.case_status.unwrap_or(default_status).to_string();

        let Some(party_name) = prompt(input, "Party name", Some(self.last_query.party_name.as_str())).await? else {
            return Ok(());
        };
        let Some(year) = prompt(input, "Registration year", Some(self.last_query.year.as_str())).await? else {
            return Ok(());
        };
        let Some(status) = prompt(input, "Case status (Pending/Disposed/Any)", Some(last_status.as_str())).await? else {
            return Ok(());
        };
        let case_status = match status.parse::<CaseStatus>() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {}", describe_error(&e));
                return Ok(());
            }
        };
        let Some(captcha_text) = prompt(input, "Captcha code", None).await? else {
            return Ok(());
        };

        self.last_query = SearchQuery {
            party_name,
            year,
            captcha_text,
            case_status: Some(case_status),
        };

        self.holder.begin("search-party")?;
        println!("Performing search...");
        let step = self.workflow.search_party(self.holder.get(), &self.last_query).await;
        report(self.holder.apply(step), |results| {
            println!("Search successful!");
            print_json(&results);
        });
        Ok(())
    }

    fn reset(&mut self, raw: Option<&str>) {
        match raw.and_then(parse_field) {
            Some(field) => {
                self.holder.reset_downstream_of(field);
                println!("Cleared everything after {}.", field);
            }
            None => eprintln!("Usage: reset <state|district|complex|establishment|captcha>"),
        }
    }
}

/// Interactive harness. Opens a session on start, then runs one step per command.
pub async fn run(overrides: &Overrides) -> anyhow::Result<()> {
    let config = overrides.load()?;
    let workflow = build_workflow(&config)?;

    println!("eCourts API tester: {}", workflow.api().base_url());
    println!("Type `help` for commands, `/quit` to exit.");
    println!();

    let mut holder = SessionHolder::default();
    bootstrap(&workflow, &mut holder).await?;

    let mut shell = Shell {
        workflow,
        holder,
        last_query: SearchQuery::default(),
    };
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("ecourts> ");
        std::io::stdout().flush()?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((command, rest)) = args.split_first() else {
            continue;
        };
        let first = rest.first().copied();

        match *command {
            "/quit" | "/exit" | "quit" | "exit" => break,
            "help" | "/help" | "?" => println!("{}", HELP),
            "restart" => bootstrap(&shell.workflow, &mut shell.holder).await?,
            "districts" => shell.districts(first.unwrap_or_default()).await?,
            "complexes" => shell.complexes(first.unwrap_or_default()).await?,
            "location" => shell.location(first.unwrap_or_default(), rest.get(1).copied()).await?,
            "captcha" => shell.captcha().await?,
            "search" => shell.search(&mut input).await?,
            "show" => {
                if first == Some("json") {
                    print_json(&serde_json::to_value(shell.holder.get())?);
                } else {
                    print_session(shell.holder.get());
                }
            }
            "token" => match &shell.holder.get().credential {
                Some(c) => println!("{}", c),
                None => println!("N/A"),
            },
            "results" => match &shell.holder.get().results {
                Some(results) => print_json(results),
                None => println!("No search results yet."),
            },
            "reset" => shell.reset(first),
            other => eprintln!("Unknown command '{}'. Type `help`.", other),
        }
    }

    println!("Bye.");
    Ok(())
}
