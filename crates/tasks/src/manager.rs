use std::{
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use futures_util::FutureExt;
use thiserror::Error;
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    time::{timeout, Instant},
};
use tracing::*;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("critical task {0} failed: {1}")]
    Failed(String, String),

    #[error("critical task {0} panicked")]
    Panicked(String),
}

struct TaskCompletion {
    name: String,
    err: Option<TaskError>,
}

/// Tracks critical tasks and owns the shutdown channel. A single instance is
/// created at startup; [`TaskManager::monitor`] then blocks the main thread
/// until a signal arrives or a critical task fails.
pub struct TaskManager {
    handle: Handle,
    shutdown_tx: watch::Sender<bool>,
    completion_tx: mpsc::UnboundedSender<TaskCompletion>,
    completion_rx: mpsc::UnboundedReceiver<TaskCompletion>,
    pending: Arc<AtomicUsize>,
}

impl TaskManager {
    pub fn new(handle: Handle) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            handle,
            shutdown_tx,
            completion_tx,
            completion_rx,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor {
            handle: self.handle.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
            completion_tx: self.completion_tx.clone(),
            pending: self.pending.clone(),
        }
    }

    pub fn shutdown_signal(&self) -> crate::ShutdownSignal {
        crate::ShutdownSignal::new(self.shutdown_tx.clone())
    }

    /// Installs OS signal listeners that translate SIGINT/SIGTERM into a
    /// shutdown request.
    pub fn start_signal_listeners(&self) {
        let shutdown_tx = self.shutdown_tx.clone();
        self.handle.spawn(async move {
            wait_for_os_signal().await;
            info!("received OS signal, requesting shutdown");
            let _ = shutdown_tx.send(true);
        });
    }

    /// Blocks until shutdown is requested or a critical task exits with an
    /// error, then waits up to `grace` for the remaining tasks to wind down.
    pub fn monitor(self, grace: Option<Duration>) -> anyhow::Result<()> {
        let TaskManager {
            handle,
            shutdown_tx,
            completion_rx: mut rx,
            pending,
            completion_tx,
        } = self;
        // Keeping our sender alive would make recv() never observe closure;
        // tasks hold their own clones.
        drop(completion_tx);

        let mut shutdown_rx = shutdown_tx.subscribe();
        handle.clone().block_on(async move {
            let result = loop {
                tokio::select! {
                    _ = shutdown_rx.wait_for(|sig| *sig) => {
                        info!("shutdown requested");
                        break Ok(());
                    }
                    completion = rx.recv() => {
                        let Some(completion) = completion else {
                            break Ok(());
                        };
                        pending.fetch_sub(1, Ordering::AcqRel);
                        if let Some(err) = completion.err {
                            error!(task = %completion.name, %err, "critical task failed");
                            break Err(anyhow::Error::new(err));
                        }
                        debug!(task = %completion.name, "critical task exited");
                        if pending.load(Ordering::Acquire) == 0 {
                            break Ok(());
                        }
                    }
                }
            };

            let _ = shutdown_tx.send(true);
            drain_remaining(&mut rx, &pending, grace).await;
            result
        })
    }
}

async fn drain_remaining(
    rx: &mut mpsc::UnboundedReceiver<TaskCompletion>,
    pending: &AtomicUsize,
    grace: Option<Duration>,
) {
    let Some(grace) = grace else { return };
    let deadline = Instant::now() + grace;
    while pending.load(Ordering::Acquire) > 0 {
        let left = deadline.saturating_duration_since(Instant::now());
        match timeout(left, rx.recv()).await {
            Ok(Some(completion)) => {
                pending.fetch_sub(1, Ordering::AcqRel);
                if let Some(err) = completion.err {
                    warn!(task = %completion.name, %err, "task failed during shutdown");
                } else {
                    debug!(task = %completion.name, "task exited during shutdown");
                }
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    remaining = pending.load(Ordering::Acquire),
                    "graceful shutdown timed out"
                );
                break;
            }
        }
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("tasks: install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Cloneable spawner handed to subsystems.
#[derive(Clone)]
pub struct TaskExecutor {
    handle: Handle,
    shutdown_tx: watch::Sender<bool>,
    completion_tx: mpsc::UnboundedSender<TaskCompletion>,
    pending: Arc<AtomicUsize>,
}

impl TaskExecutor {
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    fn guard(&self) -> crate::ShutdownGuard {
        crate::ShutdownGuard::new(self.shutdown_tx.subscribe())
    }

    fn complete(&self, name: &str, err: Option<TaskError>) {
        let _ = self.completion_tx.send(TaskCompletion {
            name: name.to_owned(),
            err,
        });
    }

    /// Spawns a blocking critical task on a dedicated thread.
    pub fn spawn_critical<E, F>(&self, name: &'static str, task: F)
    where
        E: Into<anyhow::Error>,
        F: FnOnce(crate::ShutdownGuard) -> Result<(), E> + Send + 'static,
    {
        self.pending.fetch_add(1, Ordering::AcqRel);
        let guard = self.guard();
        let this = self.clone();
        std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| task(guard)));
                let err = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(TaskError::Failed(name.to_owned(), e.into().to_string())),
                    Err(_) => Some(TaskError::Panicked(name.to_owned())),
                };
                this.complete(name, err);
            })
            .expect("tasks: spawn thread");
    }

    /// Spawns an async critical task.
    pub fn spawn_critical_async(
        &self,
        name: &'static str,
        fut: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    ) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        let this = self.clone();
        self.handle.spawn(async move {
            let outcome = AssertUnwindSafe(fut).catch_unwind().await;
            let err = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(TaskError::Failed(name.to_owned(), e.to_string())),
                Err(_) => Some(TaskError::Panicked(name.to_owned())),
            };
            this.complete(name, err);
        });
    }

    /// Spawns an async critical task that wants to observe shutdown itself.
    pub fn spawn_critical_async_with_shutdown<F, Fut>(&self, name: &'static str, task: F)
    where
        F: FnOnce(crate::ShutdownGuard) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let fut = task(self.guard());
        self.spawn_critical_async(name, fut);
    }
}
