use ecourts_core::Config;
use serde_json::Value;
use std::io::Write;

use super::Overrides;

/// Show the effective configuration (file plus command-line overrides).
pub fn show(overrides: &Overrides) -> anyhow::Result<()> {
    let config = overrides.load()?;
    eprintln!("File: {}", overrides.config_path().display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn get(overrides: &Overrides, key: &str) -> anyhow::Result<()> {
    let config = overrides.load()?;
    let json = serde_json::to_value(&config)?;
    match resolve_json_path(&json, key) {
        Some(Value::String(s)) => println!("{}", s),
        Some(v) => println!("{}", serde_json::to_string_pretty(&v)?),
        None => anyhow::bail!("Key '{}' not found in config.", key),
    }
    Ok(())
}

/// Set a value by dot-separated key path and write the file back.
pub fn set(overrides: &Overrides, key: &str, value: &str) -> anyhow::Result<()> {
    let config = overrides.load_file()?;
    let mut json = serde_json::to_value(&config)?;

    let parsed: Value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    if !set_json_path(&mut json, key, parsed.clone()) {
        anyhow::bail!("Key '{}' does not name a config field.", key);
    }

    let new_config: Config = serde_json::from_value(json)?;
    let path = overrides.config_path();
    new_config.save(&path)?;

    match parsed {
        Value::String(s) => println!("✓ Set {} = {}", key, s),
        other => println!("✓ Set {} = {}", key, serde_json::to_string(&other)?),
    }
    Ok(())
}

pub fn reset(overrides: &Overrides, force: bool) -> anyhow::Result<()> {
    let path = overrides.config_path();

    if !force {
        print!("⚠ Reset config to defaults? Current config will be lost. [y/N] ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    Config::default().save(&path)?;
    println!("✓ Config reset to defaults: {}", path.display());
    Ok(())
}

/// "timeout_secs" -> "timeoutSecs"
fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn pick_key(obj: &serde_json::Map<String, Value>, part: &str) -> Option<String> {
    let camel = to_camel_case(part);
    if obj.contains_key(&camel) {
        Some(camel)
    } else if obj.contains_key(part) {
        Some(part.to_string())
    } else {
        None
    }
}

fn resolve_json_path(json: &Value, path: &str) -> Option<Value> {
    let mut current = json;
    for part in path.split('.') {
        let key = pick_key(current.as_object()?, part)?;
        current = current.get(&key)?;
    }
    Some(current.clone())
}

/// Only existing keys can be set; returns false when the path does not resolve.
fn set_json_path(json: &mut Value, path: &str, value: Value) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };
    let mut current = json;
    for part in parents {
        let Some(obj) = current.as_object_mut() else {
            return false;
        };
        let Some(key) = pick_key(obj, part) else {
            return false;
        };
        let Some(next) = obj.get_mut(&key) else {
            return false;
        };
        current = next;
    }
    let Some(obj) = current.as_object_mut() else {
        return false;
    };
    let Some(key) = pick_key(obj, last) else {
        return false;
    };
    obj.insert(key, value);
    true
}
