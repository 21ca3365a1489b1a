use ecourts_core::{Error, Result};
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, PartialEq)]
enum ProxyChoice {
    Use(String),
    Direct,
    /// Leave reqwest to read HTTPS_PROXY/HTTP_PROXY.
    Environment,
}

/// Exact host, `*.example.com` (subdomains only) or `.example.com` (domain and subdomains).
fn host_bypasses_proxy(host: &str, no_proxy: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    no_proxy.iter().any(|rule| {
        let rule = rule.trim().to_ascii_lowercase();
        if rule.is_empty() {
            false
        } else if let Some(domain) = rule.strip_prefix("*.") {
            host.ends_with(&format!(".{}", domain))
        } else if let Some(domain) = rule.strip_prefix('.') {
            host == domain || host.ends_with(&format!(".{}", domain))
        } else {
            host == rule
        }
    })
}

fn choose_proxy(proxy: Option<&str>, no_proxy: &[String], base_url: &str) -> ProxyChoice {
    let Some(proxy) = proxy.map(str::trim) else {
        return ProxyChoice::Environment;
    };
    if proxy.is_empty() {
        return ProxyChoice::Direct;
    }
    let host = url::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));
    match host {
        Some(host) if host_bypasses_proxy(&host, no_proxy) => ProxyChoice::Direct,
        _ => ProxyChoice::Use(proxy.to_string()),
    }
}

/// Builds the reqwest client used for every backend call.
///
/// `proxy`: `None` follows the environment, `Some("")` disables proxies,
/// anything else is used unless the base host is listed in `no_proxy`.
pub fn build_http_client(
    proxy: Option<&str>,
    no_proxy: &[String],
    base_url: &str,
    timeout: Duration,
) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("ecourts-tester/", env!("CARGO_PKG_VERSION")));

    match choose_proxy(proxy, no_proxy, base_url) {
        ProxyChoice::Use(proxy_url) => match Proxy::all(&proxy_url) {
            Ok(p) => {
                info!(proxy = %proxy_url, base_url = %base_url, "Using proxy for backend calls");
                builder = builder.proxy(p);
            }
            Err(e) => {
                warn!(error = %e, proxy = %proxy_url, "Invalid proxy URL, connecting directly");
                builder = builder.no_proxy();
            }
        },
        ProxyChoice::Direct => {
            info!(base_url = %base_url, "Proxy disabled for backend calls");
            builder = builder.no_proxy();
        }
        ProxyChoice::Environment => {}
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_bypasses_proxy_rules() {
        let rules = vec!["localhost".to_string(), "*.internal".to_string(), ".example.com".to_string()];
        assert!(host_bypasses_proxy("localhost", &rules));
        assert!(host_bypasses_proxy("api.internal", &rules));
        assert!(!host_bypasses_proxy("internal", &rules));
        assert!(host_bypasses_proxy("example.com", &rules));
        assert!(host_bypasses_proxy("x.example.com", &rules));
        assert!(!host_bypasses_proxy("notexample.com", &rules));
    }

    #[test]
    fn test_choose_proxy() {
        let base = "https://lawyerverifyandcases.onrender.com/api/ecourts";
        assert_eq!(choose_proxy(None, &[], base), ProxyChoice::Environment);
        assert_eq!(choose_proxy(Some(""), &[], base), ProxyChoice::Direct);
        assert_eq!(
            choose_proxy(Some("http://proxy:8080"), &[], base),
            ProxyChoice::Use("http://proxy:8080".to_string())
        );
        assert_eq!(
            choose_proxy(Some("http://proxy:8080"), &["*.onrender.com".to_string()], base),
            ProxyChoice::Direct
        );
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(None, &[], "http://localhost:5000", Duration::from_secs(30));
        assert!(client.is_ok());
    }
}
