//! Worker cluster supervisor: sizes the worker pool by CPU ratio, starts
//! and restarts workers as opaque `workerStart`/`workerStop` closures, and
//! tears the pool down in parallel with a grace window on shutdown.
//!
//! Workers here are `tokio` tasks, not OS processes — see `DESIGN.md` for
//! why a fork-and-supervise model was replaced with a task pool instead of
//! reached for via `unsafe` libc calls.

pub mod sizing;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub use sizing::{worker_count, DEFAULT_GATEWAY_CPU_RATIO, DEFAULT_STREAMING_CPU_RATIO};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque per-worker resource bundle (producer, consumer, listener, ...)
/// returned by `workerStart` and handed back to `workerStop` on teardown.
/// `join` is the running worker task; the supervisor restarts it when it
/// finishes and the pool isn't shutting down.
pub struct WorkerHandle<H> {
    pub join: JoinHandle<()>,
    pub resource: H,
}

pub type WorkerStart<H> = Arc<dyn Fn() -> BoxFuture<'static, WorkerHandle<H>> + Send + Sync>;
pub type WorkerStop<H> = Arc<dyn Fn(H) -> BoxFuture<'static, ()> + Send + Sync>;

/// Grace window `workerStop` closures get, in parallel, before the
/// supervisor gives up waiting and returns from `shutdown` anyway.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(10);

/// Supervises a pool of `N` workers of resource type `H`.
///
/// Failed workers (their `join` task finished, successfully or not) are
/// restarted unless the pool is shutting down — there is no circuit
/// breaker and no backoff: repeated rapid failures are logged but never
/// suppressed, trusting the worker's own reconnect logic (or an external
/// orchestrator) to stabilize things eventually.
pub struct Supervisor<H: Send + 'static> {
    start: WorkerStart<H>,
    stop: WorkerStop<H>,
    grace_window: Duration,
    shutting_down: Arc<AtomicBool>,
    /// Keyed by the worker's own index, so restart/removal never
    /// depends on the order other workers push or drain in.
    resources: Arc<Mutex<HashMap<usize, H>>>,
    monitors: Vec<JoinHandle<()>>,
}

impl<H: Send + 'static> Supervisor<H> {
    pub fn new(start: WorkerStart<H>, stop: WorkerStop<H>) -> Self {
        Self {
            start,
            stop,
            grace_window: DEFAULT_GRACE_WINDOW,
            shutting_down: Arc::new(AtomicBool::new(false)),
            resources: Arc::new(Mutex::new(HashMap::new())),
            monitors: Vec::new(),
        }
    }

    pub fn with_grace_window(mut self, grace_window: Duration) -> Self {
        self.grace_window = grace_window;
        self
    }

    /// Start `count` workers, each running its own start/monitor/restart
    /// loop as a background task.
    pub fn spawn(&mut self, count: usize) {
        for index in 0..count {
            let start = self.start.clone();
            let shutting_down = self.shutting_down.clone();
            let resources = self.resources.clone();
            let monitor = tokio::spawn(async move {
                loop {
                    let handle = start().await;
                    resources.lock().await.insert(index, handle.resource);

                    match handle.join.await {
                        Ok(()) => info!(worker = index, "worker exited"),
                        Err(err) => error!(worker = index, error = %err, "worker task panicked"),
                    }

                    // The resource was already handed to `stop` if a
                    // shutdown drained it out from under us first; only
                    // remove it ourselves if it's still here.
                    resources.lock().await.remove(&index);

                    if shutting_down.load(Ordering::SeqCst) {
                        break;
                    }
                    warn!(worker = index, "restarting failed worker");
                }
            });
            self.monitors.push(monitor);
        }
    }

    /// Stop accepting restarts, invoke `workerStop` on every live worker in
    /// parallel, and wait up to `grace_window` for them to finish. Workers
    /// that don't finish in time are abandoned, not force-killed — this is
    /// a library, not a process supervisor, so "force exit" is the
    /// caller's job (see `moose-cli`).
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);

        let drained: Vec<H> = {
            let mut guard = self.resources.lock().await;
            std::mem::take(&mut *guard).into_values().collect()
        };

        let stops = drained.into_iter().map(|resource| (self.stop)(resource));
        let all = futures_util::future::join_all(stops);

        if tokio::time::timeout(self.grace_window, all).await.is_err() {
            warn!("grace window elapsed before all workers finished stopping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn start_counting(starts: Arc<AtomicUsize>, run_forever: bool) -> WorkerStart<()> {
        Arc::new(move || {
            starts.fetch_add(1, Ordering::SeqCst);
            let run_forever = run_forever;
            Box::pin(async move {
                let join = tokio::spawn(async move {
                    if run_forever {
                        std::future::pending::<()>().await;
                    }
                });
                WorkerHandle { join, resource: () }
            })
        })
    }

    fn noop_stop() -> WorkerStop<()> {
        Arc::new(|_resource| Box::pin(async {}))
    }

    #[tokio::test]
    async fn spawn_starts_exactly_count_workers() {
        let starts = Arc::new(AtomicUsize::new(0));
        let mut sup = Supervisor::new(start_counting(starts.clone(), true), noop_stop());
        sup.spawn(3);
        tokio::task::yield_now().await;
        assert_eq!(starts.load(Ordering::SeqCst), 3);
        sup.shutdown().await;
    }

    #[tokio::test]
    async fn a_worker_that_exits_is_restarted_until_shutdown() {
        let starts = Arc::new(AtomicUsize::new(0));
        let mut sup = Supervisor::new(start_counting(starts.clone(), false), noop_stop());
        sup.spawn(1);
        // Give the restart loop a few iterations to run.
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(starts.load(Ordering::SeqCst) > 1, "expected at least one restart");
        sup.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_invokes_stop_on_every_live_worker() {
        let stopped = Arc::new(AtomicUsize::new(0));
        let stopped_clone = stopped.clone();
        let stop: WorkerStop<()> = Arc::new(move |_resource| {
            let stopped = stopped_clone.clone();
            Box::pin(async move {
                stopped.fetch_add(1, Ordering::SeqCst);
            })
        });
        let starts = Arc::new(AtomicUsize::new(0));
        let mut sup = Supervisor::new(start_counting(starts, true), stop);
        sup.spawn(3);
        tokio::task::yield_now().await;
        sup.shutdown().await;
        assert_eq!(stopped.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn shutdown_that_exceeds_the_grace_window_still_returns() {
        let stop: WorkerStop<()> = Arc::new(|_resource| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            })
        });
        let starts = Arc::new(AtomicUsize::new(0));
        let mut sup = Supervisor::new(start_counting(starts, true), stop)
            .with_grace_window(Duration::from_millis(10));
        sup.spawn(1);
        tokio::task::yield_now().await;
        sup.shutdown().await;
    }
}
