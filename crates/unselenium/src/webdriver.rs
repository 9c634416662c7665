//! Session handshake and remote-session capability
//!
//! The control process (chromedriver) is told, via
//! `goog:chromeOptions.debuggerAddress`, to attach to the Chrome instance
//! we already launched instead of spawning its own. After the handshake
//! every operation is a plain HTTP call against the session.
//!
//! `RemoteSession` is the seam: the driver only ever talks to the trait,
//! so tests swap in a mock and the wire client stays replaceable.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{DriverError, Result};

/// The established remote-control handle.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Load `url` in the browser.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Execute a script in the current page, returning its value.
    async fn run_script(&self, src: &str, args: Vec<Value>) -> Result<Value>;

    /// Execute a raw protocol command (CDP passthrough).
    async fn run_protocol_command(&self, name: &str, params: Value) -> Result<Value>;

    /// End the session on the control process.
    async fn stop(&self) -> Result<()>;
}

/// Perform the session-creation handshake against `driver_addr`.
///
/// Callers must wait for the control process to accept connections first
/// (see [`crate::net::wait_until_ready`]); readiness is not probed here.
pub async fn connect(
    driver_addr: &str,
    chrome_addr: &str,
    chrome_path: &Path,
    args: &[String],
    connect_timeout: Option<Duration>,
    script_timeout: Option<Duration>,
) -> Result<WebDriverSession> {
    let http = reqwest::Client::new();
    let base = format!("http://{driver_addr}");
    let payload = build_capabilities(chrome_addr, chrome_path, args);

    tracing::debug!(addr = %base, "creating remote session");

    let mut request = http.post(format!("{base}/session")).json(&payload);
    if let Some(timeout) = connect_timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|err| {
        DriverError::Connect(format!("control process at {driver_addr}: {err}"))
    })?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|err| DriverError::Connect(format!("malformed handshake response: {err}")))?;

    if !status.is_success() {
        return Err(DriverError::Connect(format!(
            "session rejected ({status}): {body}"
        )));
    }

    let session_id = parse_session_id(&body)
        .ok_or_else(|| DriverError::Connect(format!("no session id in response: {body}")))?
        .to_string();

    Ok(WebDriverSession {
        http,
        base,
        session_id,
        script_timeout,
    })
}

/// Capability payload in both W3C and legacy shape, so either protocol
/// dialect of the control process accepts it.
fn build_capabilities(chrome_addr: &str, chrome_path: &Path, args: &[String]) -> Value {
    let chrome_options = json!({
        "debuggerAddress": chrome_addr,
        "binary": chrome_path.to_string_lossy(),
        "args": args,
    });

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "pageLoadStrategy": "normal",
                "goog:chromeOptions": chrome_options,
            }
        },
        "desiredCapabilities": {
            "browserName": "chrome",
            "pageLoadStrategy": "normal",
            "goog:chromeOptions": chrome_options,
        }
    })
}

fn parse_session_id(body: &Value) -> Option<&str> {
    body["value"]["sessionId"]
        .as_str()
        .or_else(|| body["sessionId"].as_str())
}

/// HTTP-backed implementation of [`RemoteSession`].
pub struct WebDriverSession {
    http: reqwest::Client,
    base: String,
    session_id: String,
    script_timeout: Option<Duration>,
}

impl WebDriverSession {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(&self, path: &str, payload: Value) -> Result<Value> {
        let url = format!("{}/session/{}/{path}", self.base, self.session_id);
        let mut request = self.http.post(url).json(&payload);
        if let Some(timeout) = self.script_timeout {
            request = request.timeout(timeout);
        }

        let body: Value = request.send().await?.json().await?;
        into_value(body)
    }
}

/// Unwrap a wire response, surfacing command-level errors.
fn into_value(mut body: Value) -> Result<Value> {
    if let Some(code) = body["value"]["error"].as_str() {
        let message = body["value"]["message"].as_str().unwrap_or(code);
        return Err(DriverError::Script(format!("{code}: {message}")));
    }
    // Legacy dialect signals failure through a non-zero status field.
    if body["status"].as_i64().unwrap_or(0) != 0 {
        return Err(DriverError::Script(format!("command failed: {body}")));
    }
    Ok(body["value"].take())
}

#[async_trait]
impl RemoteSession for WebDriverSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.command("url", json!({ "url": url }))
            .await
            .map(|_| ())
            .map_err(|err| DriverError::Connect(format!("navigate failed: {err}")))
    }

    async fn run_script(&self, src: &str, args: Vec<Value>) -> Result<Value> {
        self.command("execute/sync", json!({ "script": src, "args": args }))
            .await
    }

    async fn run_protocol_command(&self, name: &str, params: Value) -> Result<Value> {
        self.command("goog/cdp/execute", json!({ "cmd": name, "params": params }))
            .await
    }

    async fn stop(&self) -> Result<()> {
        let url = format!("{}/session/{}", self.base, self.session_id);
        let mut request = self.http.delete(url);
        if let Some(timeout) = self.script_timeout {
            request = request.timeout(timeout);
        }
        request
            .send()
            .await
            .map_err(|err| DriverError::Connect(format!("session stop failed: {err}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_w3c_session_id() {
        let body = json!({ "value": { "sessionId": "abc123", "capabilities": {} } });
        assert_eq!(parse_session_id(&body), Some("abc123"));
    }

    #[test]
    fn parses_legacy_session_id() {
        let body = json!({ "sessionId": "legacy42", "status": 0 });
        assert_eq!(parse_session_id(&body), Some("legacy42"));
    }

    #[test]
    fn missing_session_id_is_none() {
        let body = json!({ "value": { "error": "session not created" } });
        assert_eq!(parse_session_id(&body), None);
    }

    #[test]
    fn capabilities_carry_debugger_address_and_args() {
        let args = vec!["--no-sandbox".to_string(), "--lang=zh-CN".to_string()];
        let caps = build_capabilities("127.0.0.1:9222", Path::new("/usr/bin/chrome"), &args);

        let options = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"];
        assert_eq!(options["debuggerAddress"], "127.0.0.1:9222");
        assert_eq!(options["args"][0], "--no-sandbox");
        // Legacy mirror carries the same options.
        assert_eq!(
            caps["desiredCapabilities"]["goog:chromeOptions"]["debuggerAddress"],
            "127.0.0.1:9222"
        );
    }

    #[test]
    fn session_reports_its_negotiated_id() {
        let session = WebDriverSession {
            http: reqwest::Client::new(),
            base: "http://127.0.0.1:4444".to_string(),
            session_id: "abc123".to_string(),
            script_timeout: None,
        };
        assert_eq!(session.session_id(), "abc123");
    }

    #[test]
    fn wire_errors_surface_as_script_errors() {
        let body = json!({
            "value": { "error": "javascript error", "message": "boom" }
        });
        let err = into_value(body).unwrap_err();
        assert!(matches!(err, DriverError::Script(_)));

        let legacy = json!({ "status": 13, "value": null });
        assert!(into_value(legacy).is_err());
    }

    #[test]
    fn successful_responses_unwrap_to_value() {
        let body = json!({ "value": ["cdc_foo_Array"] });
        let value = into_value(body).unwrap();
        assert_eq!(value, json!(["cdc_foo_Array"]));
    }
}
