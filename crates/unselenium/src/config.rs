//! Launch configuration
//!
//! Plain struct with documented defaults. `validate` turns the flags into
//! the Chrome argument list exactly once, in a fixed order; it only ever
//! appends, never removes or reorders. Callers must validate a config
//! exactly once — `Driver::launch` owns that call.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DriverError, Result};

/// Settings for one driver instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the chromedriver binary. Required.
    pub driver_path: PathBuf,

    /// Path to the Chrome binary. Discovered via [`crate::locate`] when
    /// unset.
    pub chrome_path: Option<PathBuf>,

    /// Chrome launch arguments. Validation appends to this list; extra
    /// arguments placed here by the caller are preserved in front.
    pub args: Vec<String>,

    /// Browser profile directory. A fresh temp directory is created when
    /// unset. It is NOT deleted on teardown.
    pub user_data_dir: Option<PathBuf>,

    /// Browser UI language. Defaults to `zh-CN`.
    pub language: Option<String>,

    /// Run Chrome headless (`--headless=new`). Default: false.
    pub headless: bool,

    /// Keep the Chrome sandbox enabled. Default: false (sandbox disabled).
    pub sandbox: bool,

    /// Show the first-run welcome flow. Default: false (suppressed).
    pub welcome: bool,

    /// Skip the window-size/maximize arguments. Default: false.
    pub disable_max_window: bool,

    /// Mirror the child processes' stdout/stderr to our own.
    pub show_output: bool,

    /// Chrome `--log-level` value. Always appended last.
    pub log_level: i32,

    /// Host both negotiated endpoints bind to.
    pub host: String,

    /// Timeout for the session-creation handshake. `None` means no limit.
    pub connect_timeout: Option<Duration>,

    /// Timeout for per-call session HTTP requests. `None` means no limit.
    pub script_timeout: Option<Duration>,

    /// Total budget for the chromedriver readiness probe.
    pub ready_wait: Duration,

    /// Negotiated `host:port` of the Chrome debug endpoint. Filled in
    /// during launch.
    pub(crate) chrome_addr: String,

    /// Negotiated `host:port` of the chromedriver endpoint. Filled in
    /// during launch.
    pub(crate) driver_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            driver_path: PathBuf::new(),
            chrome_path: None,
            args: Vec::new(),
            user_data_dir: None,
            language: None,
            headless: false,
            sandbox: false,
            welcome: false,
            disable_max_window: false,
            show_output: false,
            log_level: 0,
            host: "127.0.0.1".to_string(),
            connect_timeout: None,
            script_timeout: None,
            ready_wait: Duration::from_secs(3),
            chrome_addr: String::new(),
            driver_addr: String::new(),
        }
    }
}

impl Config {
    /// Check required settings and expand the flags into launch arguments.
    ///
    /// Not idempotent: calling this twice duplicates arguments.
    pub fn validate(&mut self) -> Result<()> {
        if self.driver_path.as_os_str().is_empty() {
            return Err(DriverError::Config("driver_path is required".into()));
        }

        let language = self
            .language
            .get_or_insert_with(|| "zh-CN".to_string())
            .clone();
        self.push_args(&[&format!("--lang={language}")]);

        if !self.welcome {
            self.push_args(&["--no-default-browser-check", "--no-first-run"]);
        }
        if !self.sandbox {
            self.push_args(&["--no-sandbox", "--test-type"]);
        }
        if self.headless {
            // The `new` variant works on Chrome 108+.
            self.push_args(&["--headless=new"]);
        }
        if !self.disable_max_window {
            self.push_args(&["--window-size=1920,1080", "--start-maximized"]);
        }

        self.push_args(&[&format!("--log-level={}", self.log_level)]);

        Ok(())
    }

    /// Negotiated `host:port` of the Chrome debug endpoint. Empty until
    /// launch completes.
    pub fn chrome_addr(&self) -> &str {
        &self.chrome_addr
    }

    /// Negotiated `host:port` of the control-process endpoint. Empty until
    /// launch completes.
    pub fn driver_addr(&self) -> &str {
        &self.driver_addr
    }

    pub(crate) fn push_args(&mut self, args: &[&str]) {
        self.args.extend(args.iter().map(|a| a.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            driver_path: PathBuf::from("/usr/bin/chromedriver"),
            ..Default::default()
        }
    }

    #[test]
    fn missing_driver_path_is_rejected() {
        let mut config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }

    #[test]
    fn defaults_expand_to_expected_args() {
        let mut config = base();
        config.validate().unwrap();

        assert!(config.args.contains(&"--lang=zh-CN".to_string()));
        assert!(config.args.contains(&"--no-sandbox".to_string()));
        assert!(config.args.contains(&"--test-type".to_string()));
        assert!(config.args.contains(&"--no-first-run".to_string()));
        assert!(config.args.contains(&"--window-size=1920,1080".to_string()));
        assert!(!config.args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn log_level_argument_comes_last() {
        let mut config = base();
        config.log_level = 2;
        config.validate().unwrap();
        assert_eq!(config.args.last().unwrap(), "--log-level=2");
    }

    #[test]
    fn headless_and_sandbox_flags_flip_arguments() {
        let mut config = base();
        config.headless = true;
        config.sandbox = true;
        config.validate().unwrap();

        assert!(config.args.contains(&"--headless=new".to_string()));
        assert!(!config.args.contains(&"--no-sandbox".to_string()));
    }

    #[test]
    fn caller_arguments_are_preserved_in_front() {
        let mut config = base();
        config.args.push("--proxy-server=socks5://127.0.0.1:1080".into());
        config.validate().unwrap();
        assert_eq!(config.args[0], "--proxy-server=socks5://127.0.0.1:1080");
    }

    #[test]
    fn explicit_language_wins_over_default() {
        let mut config = base();
        config.language = Some("en-US".to_string());
        config.validate().unwrap();
        assert!(config.args.contains(&"--lang=en-US".to_string()));
        assert!(!config.args.contains(&"--lang=zh-CN".to_string()));
    }

    #[test]
    fn partial_json_config_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "driver_path": "/usr/bin/chromedriver", "headless": true }"#,
        )
        .unwrap();

        assert_eq!(config.driver_path, PathBuf::from("/usr/bin/chromedriver"));
        assert!(config.headless);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.ready_wait, Duration::from_secs(3));

        let mut config = config;
        config.validate().unwrap();
        assert!(config.args.contains(&"--headless=new".to_string()));
    }

    #[test]
    fn every_flag_maps_to_exactly_one_argument_set() {
        let mut config = base();
        config.validate().unwrap();
        let lang_count = config
            .args
            .iter()
            .filter(|a| a.starts_with("--lang="))
            .count();
        assert_eq!(lang_count, 1);
        let sandbox_count = config
            .args
            .iter()
            .filter(|a| *a == "--no-sandbox")
            .count();
        assert_eq!(sandbox_count, 1);
    }
}
