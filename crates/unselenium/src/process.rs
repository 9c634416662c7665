//! External process ownership
//!
//! One handle per spawned process. `terminate` is the only cancellation
//! primitive: unconditional kill, callable any number of times, harmless
//! on a process that already exited.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use tokio::process::{Child, Command};

use crate::error::{DriverError, Result};

#[derive(Debug)]
pub struct ProcessHandle {
    binary: PathBuf,
    child: Mutex<Option<Child>>,
}

impl ProcessHandle {
    /// Spawn `binary` with `args`. When `mirror_output` is set the child's
    /// stdout/stderr go to ours, otherwise they are discarded.
    pub fn spawn(binary: &Path, args: &[String], mirror_output: bool) -> Result<Self> {
        let mut cmd = Command::new(binary);
        cmd.args(args).kill_on_drop(true);

        if mirror_output {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        tracing::debug!(binary = %binary.display(), ?args, "spawning process");

        let child = cmd.spawn().map_err(|source| DriverError::Launch {
            binary: binary.to_path_buf(),
            source,
        })?;

        Ok(Self {
            binary: binary.to_path_buf(),
            child: Mutex::new(Some(child)),
        })
    }

    /// Forcibly end the process. The first call takes the child and kills
    /// it; every later call finds nothing to do.
    pub fn terminate(&self) {
        let Ok(mut slot) = self.child.lock() else {
            return;
        };
        if let Some(mut child) = slot.take() {
            // Fails when the process already exited; nothing left to do.
            if let Err(err) = child.start_kill() {
                tracing::debug!(
                    binary = %self.binary.display(),
                    %err,
                    "kill on exited process"
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn inert(binary: &Path) -> Self {
        Self {
            binary: binary.to_path_buf(),
            child: Mutex::new(None),
        }
    }
}
