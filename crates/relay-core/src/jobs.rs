//! Job group — any-of supervision for a node's long-lived tasks.
//!
//! A node runs a handful of vital loops (the worker's connection, the
//! RPC server, a signal watcher). If any one of them returns, the node
//! is no longer healthy, so the group hands back the first result and
//! lets the caller decide how to go down.
//!
//! ```text
//! JobGroup
//!   ├── add("worker", ..)   ─┐
//!   ├── add("rpc", ..)       ├─ start() spawns each on tokio
//!   └── add("signal", ..)   ─┘
//!                             └─ wait() → first Result to complete
//! ```

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::error::CoreError;

type Job = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Runs registered jobs concurrently and reports whichever finishes first.
///
/// A job that returns `Ok(())` counts as finished just like one that
/// fails; the group does not tell "good" early exits apart. Jobs still
/// running after `wait` returns keep running until `abort_all` is called
/// or the runtime shuts down.
pub struct JobGroup {
    pending: Vec<(String, Job)>,
    running: Vec<AbortHandle>,
    done_tx: mpsc::UnboundedSender<anyhow::Result<()>>,
    done_rx: mpsc::UnboundedReceiver<anyhow::Result<()>>,
    started: bool,
}

impl JobGroup {
    pub fn new() -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            pending: Vec::new(),
            running: Vec::new(),
            done_tx,
            done_rx,
            started: false,
        }
    }

    /// Register a job. Jobs added after `start` are never run.
    pub fn add<F>(&mut self, name: impl Into<String>, job: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        if self.started {
            warn!(job = %name, "job added after start, ignoring");
            return;
        }
        self.pending.push((name, Box::pin(job)));
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.pending.len() + self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn every registered job. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> Result<(), CoreError> {
        if self.started {
            return Err(CoreError::AlreadyStarted);
        }
        self.started = true;

        for (name, job) in self.pending.drain(..) {
            let inner = tokio::spawn(job);
            self.running.push(inner.abort_handle());

            let done_tx = self.done_tx.clone();
            tokio::spawn(async move {
                let result = match inner.await {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => Err(anyhow::anyhow!("job {name} panicked")),
                    Err(_) => Err(anyhow::anyhow!("job {name} was aborted")),
                };
                match &result {
                    Ok(()) => debug!(job = %name, "job finished"),
                    Err(e) => debug!(job = %name, error = %e, "job failed"),
                }
                // The receiver only goes away with the group itself.
                let _ = done_tx.send(result);
            });
        }

        debug!(jobs = self.running.len(), "job group started");
        Ok(())
    }

    /// Wait for the next job to finish and return its result.
    ///
    /// The first call yields whichever job completed first, regardless of
    /// registration order.
    pub async fn wait(&mut self) -> anyhow::Result<()> {
        if self.running.is_empty() {
            return Err(CoreError::EmptyJobGroup.into());
        }
        match self.done_rx.recv().await {
            Some(result) => result,
            None => Err(CoreError::EmptyJobGroup.into()),
        }
    }

    /// Abort every job that is still running.
    pub fn abort_all(&self) {
        for handle in &self.running {
            handle.abort();
        }
    }
}

impl Default for JobGroup {
    fn default() -> Self {
        Self::new()
    }
}
