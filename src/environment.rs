//! Execution environment probing and route selection.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::Operation;

/// Where a single call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Local,
    Worker,
}

/// What the host offers for running operations off the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// A worker thread can run operations concurrently with the caller
    pub worker_capable: bool,
    /// Key generation has hardware-accelerated primitives in-process
    pub native_keygen: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect()
    }
}

impl Environment {
    pub fn new(worker_capable: bool, native_keygen: bool) -> Self {
        Self {
            worker_capable,
            native_keygen,
        }
    }

    /// Never delegates.
    pub fn local_only() -> Self {
        Self::new(false, false)
    }

    /// Probe the current process.
    pub fn detect() -> Self {
        let worker_capable = std::thread::available_parallelism()
            .map(|n| n.get() > 1)
            .unwrap_or(false);
        Self::new(worker_capable, detect_native_keygen())
    }

    /// Delegate only when the host is worker-capable and a worker exists.
    ///
    /// A worker-capable host without a worker logs a warning and runs locally.
    pub fn should_delegate(&self, worker_initialized: bool) -> bool {
        if !self.worker_capable {
            return false;
        }
        if !worker_initialized {
            warn!("worker-capable environment but no worker initialized; running locally");
            return false;
        }
        true
    }

    /// Pick the route for one call.
    ///
    /// Key generation with native primitives stays local without consulting
    /// the worker, so it never triggers the missing-worker warning.
    pub fn route(&self, operation: Operation, worker_initialized: bool) -> Route {
        if operation == Operation::GenerateKeyPair && self.native_keygen {
            debug!(operation = %operation.name(), "native key generation available, staying local");
            return Route::Local;
        }
        if !self.should_delegate(worker_initialized) {
            return Route::Local;
        }
        Route::Worker
    }
}

#[cfg(target_arch = "x86_64")]
fn detect_native_keygen() -> bool {
    std::arch::is_x86_feature_detected!("adx") && std::arch::is_x86_feature_detected!("bmi2")
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_native_keygen() -> bool {
    false
}
