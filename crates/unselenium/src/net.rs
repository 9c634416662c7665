//! Endpoint negotiation
//!
//! Port allocation binds `host:0`, reads back the OS-assigned port and
//! releases the socket immediately. The port is free at the instant of the
//! check but not reserved: another process can grab it before our child
//! binds it. Accepted race, same as every ask-the-OS-for-a-port scheme.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, Instant};

use crate::error::{DriverError, Result};

const PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Obtain a free ephemeral port on `host`.
pub async fn allocate_port(host: &str) -> Result<(String, u16)> {
    let addr = format!("{host}:0");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| DriverError::Network {
            addr: addr.clone(),
            source,
        })?;
    let port = listener
        .local_addr()
        .map_err(|source| DriverError::Network { addr, source })?
        .port();
    drop(listener);

    Ok((host.to_string(), port))
}

/// Poll `addr` until it accepts a TCP connection or `budget` runs out.
///
/// Replaces a fixed post-launch sleep: slow machines get the full budget,
/// fast ones proceed as soon as the process starts listening.
pub async fn wait_until_ready(addr: &str, budget: Duration) -> Result<()> {
    let deadline = Instant::now() + budget;

    loop {
        match TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(err) if Instant::now() >= deadline => {
                return Err(DriverError::Connect(format!(
                    "{addr} not accepting connections within {budget:?}: {err}"
                )));
            }
            Err(_) => sleep(PROBE_INTERVAL).await,
        }
    }
}
