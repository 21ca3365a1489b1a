use ecourts_core::Credential;

use super::{build_workflow, describe_error, Overrides};

pub async fn run(overrides: &Overrides, probe: bool) -> anyhow::Result<()> {
    let path = overrides.config_path();
    let config = overrides.load()?;

    println!("ecourts-tester status");
    println!("=====================");
    println!();
    println!(
        "Config:         {} {}",
        path.display(),
        if path.exists() { "✓" } else { "(defaults, file not found)" }
    );
    println!("Base URL:       {}", config.base_url());
    println!("Timeout:        {}s", config.api.timeout_secs);
    println!("Captcha path:   {}", config.api.captcha_path);
    println!("Case status:    {}", config.search.default_case_status);
    println!(
        "Proxy:          {}",
        match config.api.proxy.as_deref() {
            None => "from environment".to_string(),
            Some("") => "disabled".to_string(),
            Some(p) => p.to_string(),
        }
    );

    if !probe {
        return Ok(());
    }

    println!();
    let workflow = build_workflow(&config)?;
    match workflow.bootstrap().await {
        Ok(session) => {
            let kind = match session.credential {
                Some(Credential::Token(_)) => "token",
                Some(Credential::Cookies(_)) => "cookies",
                None => "none",
            };
            println!("Backend:        ✓ session opened ({} credential)", kind);
        }
        Err(e) => {
            println!("Backend:        ✗ {}", describe_error(&e));
        }
    }
    Ok(())
}
