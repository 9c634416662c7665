//! Live-instance registry
//!
//! Explicit shared object, passed by `Arc` to whoever needs it. The lock
//! protects only add/remove/snapshot and is never held across await
//! points; `stop_all` relies on each driver's own idempotent `quit` rather
//! than registry-level locking.

use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::driver::Driver;

#[derive(Default)]
pub struct Registry {
    drivers: Mutex<Vec<Arc<Driver>>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn add(&self, driver: Arc<Driver>) {
        self.lock().push(driver);
    }

    pub(crate) fn remove(&self, id: Uuid) {
        self.lock().retain(|d| d.id() != id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Quit every registered driver. Works off a snapshot so driver
    /// teardown can re-enter the registry to remove itself.
    pub async fn stop_all(&self) {
        let snapshot: Vec<Arc<Driver>> = self.lock().clone();
        for driver in snapshot {
            driver.quit().await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Driver>>> {
        // A poisoned lock means a panic mid add/remove; the Vec itself is
        // still consistent for teardown purposes.
        self.drivers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
