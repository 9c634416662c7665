//! Undetected Chrome automation launcher
//!
//! Launches a Chrome process and a chromedriver control process on
//! negotiated ephemeral ports, wires chromedriver to the already-running
//! browser through its debug endpoint, and strips automation fingerprint
//! artifacts from the page's global object before navigations.
//!
//! Lifecycle guarantees:
//! - construction is all-or-nothing: any failure tears down whatever was
//!   already spawned before the error is returned
//! - [`Driver::quit`] is idempotent under arbitrary concurrent callers
//! - [`signal::install`] covers every driver in a [`Registry`] with a
//!   process-wide SIGINT/SIGTERM watcher, installed at most once
//!
//! ```no_run
//! use unselenium::{Config, Driver, Registry};
//!
//! # async fn run() -> unselenium::Result<()> {
//! let registry = Registry::new();
//! unselenium::signal::install(registry.clone(), true);
//!
//! let mut config = Config::default();
//! config.driver_path = "/usr/bin/chromedriver".into();
//! config.headless = true;
//!
//! let driver = Driver::launch(config, registry.clone()).await?;
//!
//! driver.navigate("https://example.com").await?;
//! driver.quit().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod locate;
pub mod net;
pub mod process;
pub mod registry;
pub mod signal;
pub mod stealth;
pub mod webdriver;

pub use config::Config;
pub use driver::Driver;
pub use error::{DriverError, Result};
pub use registry::Registry;
pub use webdriver::{RemoteSession, WebDriverSession};
