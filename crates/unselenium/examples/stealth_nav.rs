//! Launch an undetected Chrome, visit a bot-detection test page, quit.
//!
//! ```bash
//! cargo run --example stealth_nav -- /usr/bin/chromedriver
//! ```

use std::path::PathBuf;
use std::time::Duration;

use unselenium::{Config, Driver, Registry};

#[tokio::main]
async fn main() -> unselenium::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .compact()
        .init();

    let driver_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("chromedriver"));

    let registry = Registry::new();
    unselenium::signal::install(registry.clone(), true);

    let mut config = Config::default();
    config.driver_path = driver_path;

    let driver = Driver::launch(config, registry.clone()).await?;

    // Marker visible on every document, to verify the injection channel.
    driver.run_script_on_new_document("window.GK = 123;").await?;

    driver.navigate("https://nowsecure.nl/").await?;

    tokio::time::sleep(Duration::from_secs(10)).await;

    driver.quit().await;
    Ok(())
}
