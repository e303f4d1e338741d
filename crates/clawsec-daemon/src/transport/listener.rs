//! Unix socket listener and bounded accept loop.
//!
//! Lifecycle:
//! - bind: remove a stale socket file from a prior run, then bind
//! - serve: accept while a worker permit is free, one task per connection
//! - drain: on shutdown stop accepting, await every in-flight task
//! - drop: the socket file is removed

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use clawsec_core::error::{ClawSecError, Result};

use crate::daemon::PolicyDaemon;

/// Bound IPC endpoint. Removes its socket file when dropped.
#[derive(Debug)]
pub struct IpcListener {
    inner: UnixListener,
    path: PathBuf,
}

impl IpcListener {
    /// Bind at `path`. Failure here is the daemon's only fatal runtime error.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        match std::fs::remove_file(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "removed stale socket"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ClawSecError::Internal(format!(
                    "cannot remove stale socket {}: {e}",
                    path.display()
                )))
            }
        }

        let inner = UnixListener::bind(&path).map_err(|e| {
            ClawSecError::Internal(format!("bind {} failed: {e}", path.display()))
        })?;

        tracing::info!(path = %path.display(), "listening");
        Ok(Self { inner, path })
    }

    pub async fn accept(&self) -> io::Result<UnixStream> {
        let (stream, _addr) = self.inner.accept().await?;
        Ok(stream)
    }
}

impl Drop for IpcListener {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!(path = %self.path.display(), "socket removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "socket cleanup failed"),
        }
    }
}

/// Accept connections until `shutdown` resolves, then drain.
///
/// At most `max_inflight` connections are handled at once; further peers
/// wait in the listen backlog until a permit frees up.
pub async fn serve<F>(
    listener: IpcListener,
    daemon: Arc<PolicyDaemon>,
    max_inflight: usize,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let permits = Arc::new(Semaphore::new(max_inflight.max(1)));
    let mut tasks: JoinSet<()> = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        while let Some(res) = tasks.try_join_next() {
            log_join(&daemon, res);
        }

        let permit = tokio::select! {
            _ = &mut shutdown => break,
            p = Arc::clone(&permits).acquire_owned() => match p {
                Ok(p) => p,
                Err(_) => break,
            },
        };

        let stream = tokio::select! {
            _ = &mut shutdown => break,
            res = listener.accept() => match res {
                Ok(s) => s,
                Err(e) => {
                    daemon.metrics().handler_errors.inc(&[("kind", "accept")]);
                    tracing::warn!(error = %e, "accept failed");
                    // e.g. EMFILE: back off instead of spinning
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            },
        };

        tracing::debug!(inflight = tasks.len() + 1, "connection accepted");
        let daemon = Arc::clone(&daemon);
        tasks.spawn(async move {
            let _permit = permit;
            daemon.handle_connection(stream).await;
        });
    }

    daemon.metrics().set_draining();
    tracing::info!(inflight = tasks.len(), "shutting down, draining connections");
    while let Some(res) = tasks.join_next().await {
        log_join(&daemon, res);
    }

    let isolated = daemon.ledger().isolated_agents().await;
    tracing::info!(agents = daemon.ledger().len(), ?isolated, "drained");
    tracing::info!(
        "{}",
        daemon
            .metrics()
            .render(&[("clawsec_agents_tracked", daemon.ledger().len() as u64)])
    );

    drop(listener);
    Ok(())
}

fn log_join(daemon: &PolicyDaemon, res: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = res {
        if e.is_panic() {
            daemon.metrics().handler_errors.inc(&[("kind", "panic")]);
            tracing::error!(error = %e, "connection handler panicked");
        } else {
            tracing::warn!(error = %e, "connection handler cancelled");
        }
    }
}
