use async_trait::async_trait;
use ecourts_core::{Config, Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::client::build_http_client;
use crate::Api;

/// `Api` over HTTPS with reqwest.
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::with_proxy(base_url, timeout, None, &[])
    }

    pub fn with_proxy(
        base_url: &str,
        timeout: Duration,
        proxy: Option<&str>,
        no_proxy: &[String],
    ) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let client = build_http_client(proxy, no_proxy, &base_url, timeout)?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_proxy(
            config.base_url(),
            config.timeout(),
            config.api.proxy.as_deref(),
            &config.network.no_proxy,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn finish(&self, url: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| send_error(url, e))?;
        debug!(url = %url, status = %status, body = %raw_body, "Backend response");
        decode_body(status.as_u16(), status.is_success(), &raw_body)
    }
}

fn send_error(url: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(format!("{} did not respond in time", url))
    } else {
        Error::Transport(format!("{} request failed: {}", url, e))
    }
}

/// Maps a raw response onto a JSON value or the matching error.
fn decode_body(status: u16, success: bool, raw_body: &str) -> Result<Value> {
    if !success {
        let message = serde_json::from_str::<Value>(raw_body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| format!("Backend error: {}", status));
        error!(status, message = %message, "Backend returned an error status");
        return Err(Error::Http { status, message });
    }
    serde_json::from_str(raw_body).map_err(|e| {
        Error::MalformedResponse(format!("expected JSON body from backend ({}): {}", e, truncate(raw_body, 200)))
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[async_trait]
impl Api for HttpApi {
    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        info!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| send_error(&url, e))?;
        self.finish(&url, response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        info!(url = %url, "POST");
        debug!(url = %url, body = %body, "Request body");
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| send_error(&url, e))?;
        self.finish(&url, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_decode_success_json() {
        let v = decode_body(200, true, r#"{"districts": []}"#).unwrap();
        assert_eq!(v, json!({"districts": []}));
    }

    #[test]
    fn test_decode_error_field_verbatim() {
        let err = decode_body(400, false, r#"{"error": "Missing state_code"}"#).unwrap_err();
        match err {
            Error::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Missing state_code");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_without_json() {
        let err = decode_body(502, false, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: Backend error: 502");
    }

    #[test]
    fn test_decode_malformed_success_body() {
        let err = decode_body(200, true, "not json").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_url_join() {
        let api = HttpApi::new("http://localhost:5000/api/ecourts/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000/api/ecourts");
        assert_eq!(api.url("/districts"), "http://localhost:5000/api/ecourts/districts");
        assert_eq!(api.url("complexes"), "http://localhost:5000/api/ecourts/complexes");
    }

    /// Direct connection so proxy variables in the environment are ignored.
    fn local_api(base: &str) -> HttpApi {
        HttpApi::with_proxy(base, Duration::from_secs(5), Some(""), &[]).unwrap()
    }

    /// Serves one canned HTTP response and returns the raw request it received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            if k.eq_ignore_ascii_case("content-length") {
                                v.trim().parse::<usize>().ok()
                            } else {
                                None
                            }
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}/api/ecourts", addr), handle)
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let (base, server) = serve_once("HTTP/1.1 200 OK", r#"{"districts":[],"app_token":"t2"}"#).await;
        let api = local_api(&base);

        let response = api
            .post("/districts", &json!({"state_code": "1", "app_token": "t1"}))
            .await
            .unwrap();
        assert_eq!(response["app_token"], "t2");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/ecourts/districts"));
        assert!(request.contains(r#""state_code":"1""#));
        assert!(request.contains(r#""app_token":"t1""#));
    }

    #[tokio::test]
    async fn test_get_surfaces_backend_error() {
        let (base, server) = serve_once("HTTP/1.1 500 Internal Server Error", r#"{"error":"session init failed"}"#).await;
        let api = local_api(&base);

        let err = api.get("/initial-data").await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 500, ref message } if message == "session init failed"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = local_api(&format!("http://{}", addr));
        let err = api.get("/initial-data").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_silent_backend_is_timeout_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection open without ever answering.
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let api = HttpApi::with_proxy(
            &format!("http://{}", addr),
            Duration::from_millis(500),
            Some(""),
            &[],
        )
        .unwrap();
        let err = api.get("/initial-data").await.unwrap_err();
        assert!(matches!(err, Error::Timeout(ref message) if message.contains("/initial-data")));
        server.abort();
    }
}
