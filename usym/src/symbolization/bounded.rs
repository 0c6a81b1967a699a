//! Deadline-bounded filesystem work
//!
//! A container root that is being torn down can block `open`/`read` for a
//! long time. Cache builds run on a helper thread and the caller waits at
//! most the configured deadline; a late helper finishes on its own and its
//! result is dropped.
//!
//! A helper that missed its deadline keeps its key marked as in flight until
//! it returns. Calls for the same key fail fast in the meantime, so a stuck
//! mount costs one blocked thread per key, not one per captured frame.

use crate::domain::SymbolizeError;
use crate::symbolization::cache::lock;
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type InFlightSet = Arc<Mutex<HashSet<String>>>;

/// Unmarks a key when the helper owning it finishes or unwinds
struct InFlight {
    keys: InFlightSet,
    key: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock(&self.keys).remove(&self.key);
    }
}

/// Runs builds on helper threads, at most one per key at a time
#[derive(Debug, Default)]
pub struct BoundedRunner {
    in_flight: InFlightSet,
}

impl BoundedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` under the key `what`, waiting at most `timeout` for it.
    /// `None` runs it inline.
    ///
    /// # Errors
    /// Returns the operation's own error, [`SymbolizeError::Timeout`] when the
    /// deadline passes, [`SymbolizeError::StillRunning`] while an earlier helper
    /// for `what` has not returned, or [`SymbolizeError::Spawn`]/
    /// [`SymbolizeError::WorkerLost`] when the helper cannot deliver a result
    pub fn run<T, F>(
        &self,
        timeout: Option<Duration>,
        what: &str,
        op: F,
    ) -> Result<T, SymbolizeError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, SymbolizeError> + Send + 'static,
    {
        let Some(timeout) = timeout else {
            return op();
        };

        if !lock(&self.in_flight).insert(what.to_string()) {
            return Err(SymbolizeError::StillRunning(what.to_string()));
        }
        let marker = InFlight { keys: Arc::clone(&self.in_flight), key: what.to_string() };

        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name("usym-fs".to_string())
            .spawn(move || {
                let result = op();
                // Unmark before the caller can see the result
                drop(marker);
                // Receiver is gone if the caller already timed out
                let _ = tx.send(result);
            })
            .map_err(SymbolizeError::Spawn)?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                Err(SymbolizeError::Timeout { what: what.to_string(), after: timeout })
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(SymbolizeError::WorkerLost(what.to_string()))
            }
        }
    }

    /// Number of helpers still running, including ones past their deadline
    #[must_use]
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }
}
