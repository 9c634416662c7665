//! Driver lifecycle
//!
//! Construction is strictly sequential: validate settings, negotiate the
//! Chrome debug endpoint, launch Chrome, negotiate and launch the control
//! process, probe it for readiness, perform the session handshake, then
//! register in the lifecycle registry. Any failure after a process was
//! spawned runs the same forcible teardown used by `quit` before the
//! error is returned, so a failed launch never leaks.
//!
//! `quit` is the only concurrency-critical operation: first caller wins,
//! every other caller (including the signal watcher) is a no-op.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{DriverError, Result};
use crate::locate;
use crate::net;
use crate::process::ProcessHandle;
use crate::registry::Registry;
use crate::stealth;
use crate::webdriver::{self, RemoteSession, WebDriverSession};

/// One launched Chrome + control-process pair with its remote session.
pub struct Driver {
    id: Uuid,
    pub config: Config,
    chrome: ProcessHandle,
    control: ProcessHandle,
    session: Box<dyn RemoteSession>,
    registry: Arc<Registry>,
    stopped: AtomicBool,
    quit_guard: AsyncMutex<()>,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("chrome", &self.chrome)
            .field("control", &self.control)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl Driver {
    /// Launch the full stack and register the result in `registry`.
    pub async fn launch(mut config: Config, registry: Arc<Registry>) -> Result<Arc<Self>> {
        config.validate()?;

        let chrome_path = match config.chrome_path.clone() {
            Some(path) => path,
            None => locate::find_chrome().ok_or_else(|| {
                DriverError::Config("no Chrome binary found; set chrome_path".into())
            })?,
        };
        config.chrome_path = Some(chrome_path.clone());

        let user_data_dir = match config.user_data_dir.clone() {
            Some(dir) => dir,
            None => tempfile::Builder::new()
                .prefix("undetected-chromedriver-userdata-")
                .tempdir()
                .map_err(|err| {
                    DriverError::Config(format!("failed to create user data dir: {err}"))
                })?
                // The profile directory outlives the driver; teardown does
                // not delete it.
                .keep(),
        };
        config.user_data_dir = Some(user_data_dir.clone());
        config
            .args
            .push(format!("--user-data-dir={}", user_data_dir.display()));

        let (host, chrome_port) = net::allocate_port(&config.host).await?;
        config.chrome_addr = format!("{host}:{chrome_port}");
        config
            .args
            .push(format!("--remote-debugging-host={host}"));
        config
            .args
            .push(format!("--remote-debugging-port={chrome_port}"));

        let chrome = ProcessHandle::spawn(&chrome_path, &config.args, config.show_output)?;

        let (control, session) = match Self::launch_control(&mut config, &chrome_path).await {
            Ok(pair) => pair,
            Err(err) => {
                chrome.terminate();
                return Err(err);
            }
        };

        let driver = Arc::new(Self {
            id: Uuid::now_v7(),
            config,
            chrome,
            control,
            session: Box::new(session),
            registry: registry.clone(),
            stopped: AtomicBool::new(false),
            quit_guard: AsyncMutex::new(()),
        });

        // Registered once here, not per navigation: covers client-side and
        // server-redirect navigations too. Best-effort.
        if let Err(err) =
            stealth::inject_on_new_document(driver.session.as_ref(), stealth::REMOVE_SCRIPT)
                .await
        {
            tracing::warn!(%err, "failed to register new-document stealth patch");
        }

        registry.add(driver.clone());
        tracing::debug!(id = %driver.id, addr = %driver.config.driver_addr, "driver started");

        Ok(driver)
    }

    /// Allocate the control-process endpoint, spawn it, wait until it
    /// accepts connections and perform the session handshake.
    async fn launch_control(
        config: &mut Config,
        chrome_path: &Path,
    ) -> Result<(ProcessHandle, WebDriverSession)> {
        let (host, port) = net::allocate_port(&config.host).await?;
        config.driver_addr = format!("{host}:{port}");

        let control = ProcessHandle::spawn(
            &config.driver_path,
            &[format!("--port={port}")],
            config.show_output,
        )?;

        let connected = async {
            net::wait_until_ready(&config.driver_addr, config.ready_wait).await?;
            webdriver::connect(
                &config.driver_addr,
                &config.chrome_addr,
                chrome_path,
                &config.args,
                config.connect_timeout,
                config.script_timeout,
            )
            .await
        }
        .await;

        match connected {
            Ok(session) => Ok((control, session)),
            Err(err) => {
                control.terminate();
                Err(err)
            }
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub fn has_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Navigate after the stealth cycle: when fingerprint artifacts are
    /// present, schedule their removal before the page loads.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        if stealth::has_fingerprint_artifacts(self.session.as_ref()).await {
            stealth::remove_fingerprint_artifacts(self.session.as_ref()).await;
        }

        self.session.navigate(url).await
    }

    /// Execute a script in the current page.
    pub async fn run_script(&self, src: &str, args: Vec<Value>) -> Result<Value> {
        self.session.run_script(src, args).await
    }

    /// Execute a raw protocol command on the browser.
    pub async fn run_protocol_command(&self, name: &str, params: Value) -> Result<Value> {
        self.session.run_protocol_command(name, params).await
    }

    /// Register a script to run on every new document.
    pub async fn run_script_on_new_document(&self, script: &str) -> Result<Value> {
        stealth::inject_on_new_document(self.session.as_ref(), script).await
    }

    /// Tear everything down. First caller wins; concurrent and repeated
    /// calls are no-ops. Never fails: internal errors are logged only.
    pub async fn quit(&self) {
        if self.has_stopped() {
            return;
        }
        let Ok(_guard) = self.quit_guard.try_lock() else {
            return;
        };
        if self.has_stopped() {
            return;
        }

        tracing::debug!(id = %self.id, "shutting down driver");

        self.chrome.terminate();
        self.control.terminate();

        if let Err(err) = self.session.stop().await {
            tracing::warn!(id = %self.id, %err, "session stop failed");
        }

        self.registry.remove(self.id);
        self.stopped.store(true, Ordering::SeqCst);

        tracing::debug!(id = %self.id, "driver stopped");
    }

    #[cfg(test)]
    pub(crate) fn stub(session: Box<dyn RemoteSession>, registry: &Arc<Registry>) -> Arc<Self> {
        let driver = Arc::new(Self {
            id: Uuid::now_v7(),
            config: Config::default(),
            chrome: ProcessHandle::inert(Path::new("chrome")),
            control: ProcessHandle::inert(Path::new("chromedriver")),
            session,
            registry: registry.clone(),
            stopped: AtomicBool::new(false),
            quit_guard: AsyncMutex::new(()),
        });
        registry.add(driver.clone());
        driver
    }
}
