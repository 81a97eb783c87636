//! Node mode — one worker, its RPC service, and a Ctrl-C watcher.
//!
//! All three run in a `JobGroup`. Whichever finishes first brings the
//! node down:
//! 1. ask the worker to shut down (it sends `QUIT` and drains its queue)
//! 2. give it a moment to finish, unless it already has
//! 3. stop the RPC server
//!
//! The process exits cleanly only when Ctrl-C started the shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use relay_core::{JobGroup, RelayConfig, WorkerRole};
use relay_rpc::RpcServer;
use relay_worker::{AppWorker, ReaderWorker, Worker, WorkerServer, WriterWorker};
use tokio::sync::watch;
use tracing::{info, warn};

/// How long a worker gets to flush after being told to stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn run_node(role: WorkerRole, config: RelayConfig) -> anyhow::Result<()> {
    info!(%role, "relay node starting");

    let worker: Arc<dyn Worker> = match role {
        WorkerRole::Reader => Arc::new(
            ReaderWorker::connect(&config)
                .await
                .context("failed to reach the application node")?,
        ),
        WorkerRole::Writer => Arc::new(
            WriterWorker::connect(&config)
                .await
                .context("failed to reach the application node")?,
        ),
        WorkerRole::App => Arc::new(AppWorker::new()),
    };

    let listen = listen_addr(role, &config);
    let server = RpcServer::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    info!(addr = %server.local_addr(), "node rpc listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interrupted = Arc::new(AtomicBool::new(false));
    let worker_done = Arc::new(AtomicBool::new(false));

    let mut jobs = JobGroup::new();
    jobs.add("worker", {
        let worker = worker.clone();
        let worker_done = worker_done.clone();
        async move {
            let result = worker.work().await;
            worker_done.store(true, Ordering::SeqCst);
            result.context("worker stopped")
        }
    });
    jobs.add("rpc", {
        let service = WorkerServer::new(worker.clone());
        async move {
            server.serve(service, shutdown_rx).await?;
            Ok(())
        }
    });
    jobs.add("signal", {
        let interrupted = interrupted.clone();
        async move {
            tokio::signal::ctrl_c()
                .await
                .context("failed to install CTRL+C handler")?;
            info!("shutdown signal received");
            interrupted.store(true, Ordering::SeqCst);
            Ok(())
        }
    });
    jobs.start()?;

    let first = jobs.wait().await;
    if let Err(e) = &first {
        warn!(error = %e, "node job ended");
    }

    worker.shutdown().await;
    if !worker_done.load(Ordering::SeqCst)
        && tokio::time::timeout(SHUTDOWN_GRACE, jobs.wait()).await.is_err()
    {
        warn!("worker did not stop in time");
    }
    let _ = shutdown_tx.send(true);
    jobs.abort_all();

    if interrupted.load(Ordering::SeqCst) {
        info!(%role, "relay node stopped");
        return Ok(());
    }
    first?;
    anyhow::bail!("a node job exited unexpectedly")
}

/// The RPC address this role serves on.
fn listen_addr(role: WorkerRole, config: &RelayConfig) -> String {
    let conn = match role {
        WorkerRole::Reader => &config.address.reader,
        WorkerRole::Writer => &config.address.writer,
        WorkerRole::App => &config.address.app,
    };
    conn.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_role_listens_on_its_own_address() {
        let config = RelayConfig::scaffold("irc.example.net:6667", "bot");
        assert_eq!(listen_addr(WorkerRole::App, &config), "127.0.0.1:7300");
        assert_eq!(listen_addr(WorkerRole::Reader, &config), "127.0.0.1:7301");
        assert_eq!(listen_addr(WorkerRole::Writer, &config), "127.0.0.1:7302");
    }
}
