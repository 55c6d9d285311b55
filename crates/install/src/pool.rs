//! Bounded worker pool applying `Vcs::update` to many dependencies

use crate::api::result::{UpdateEntry, UpdateOutcome, UpdateReport};
use dashmap::DashMap;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio_util::sync::CancellationToken;
use vendr_errors::{Error, InstallError};
use vendr_events::{
    AppEvent, EventEmitter, EventSender, FailureContext, FetchEvent, FetchOperation, InstallEvent,
};
use vendr_types::{normalize_name, Dependency};
use vendr_vcs::{CacheOptions, Vcs};

enum Job {
    Update(usize, Dependency),
    Stop,
}

/// Shared state handed to every worker task
#[derive(Clone)]
struct WorkerContext {
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
    outcomes: Arc<DashMap<usize, UpdateOutcome>>,
    vcs: Arc<dyn Vcs>,
    cache: CacheOptions,
    base_dir: PathBuf,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    tx: Option<EventSender>,
}

impl EventEmitter for WorkerContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

/// Decrements the live worker count when a worker exits, panics included
struct LiveWorker(Arc<AtomicUsize>);

impl LiveWorker {
    fn enter(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(live))
    }
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fixed set of workers pulling dependencies from a bounded queue
///
/// Every dependency handed to [`FetchPool::run`] is attempted exactly once.
/// A failure is recorded against that dependency and the worker moves on;
/// nothing a single repository does can stop the batch.
pub struct FetchPool {
    workers: usize,
    vcs: Arc<dyn Vcs>,
    cache: CacheOptions,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    live: Arc<AtomicUsize>,
    tx: Option<EventSender>,
}

impl EventEmitter for FetchPool {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl FetchPool {
    /// Create a pool of `workers` tasks (at least one)
    pub fn new(workers: usize, vcs: Arc<dyn Vcs>) -> Self {
        Self {
            workers: workers.max(1),
            vcs,
            cache: CacheOptions::disabled(),
            timeout: None,
            cancel: CancellationToken::new(),
            live: Arc::new(AtomicUsize::new(0)),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }

    /// Bound each update; `None` waits indefinitely
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Worker tasks currently running
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Update every dependency under `base_dir` and wait for all of them
    ///
    /// Workers are started for the duration of the call and are all joined
    /// before it returns.
    pub async fn run(&self, deps: &[Dependency], base_dir: &Path) -> UpdateReport {
        let start = Instant::now();
        self.emit(AppEvent::Install(InstallEvent::PoolStarted {
            dependencies: deps.len(),
            workers: self.workers,
        }));

        let (job_tx, job_rx) = mpsc::channel::<Job>(self.workers);
        let ctx = WorkerContext {
            jobs: Arc::new(Mutex::new(job_rx)),
            pending: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
            outcomes: Arc::new(DashMap::with_capacity(deps.len())),
            vcs: Arc::clone(&self.vcs),
            cache: self.cache.clone(),
            base_dir: base_dir.to_path_buf(),
            timeout: self.timeout,
            cancel: self.cancel.clone(),
            tx: self.tx.clone(),
        };

        let handles: Vec<_> = (0..self.workers)
            .map(|_| {
                let guard = LiveWorker::enter(&self.live);
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let _guard = guard;
                    worker_loop(ctx).await;
                })
            })
            .collect();

        for (index, dep) in deps.iter().enumerate() {
            ctx.pending.fetch_add(1, Ordering::SeqCst);
            if job_tx.send(Job::Update(index, dep.clone())).await.is_err() {
                ctx.pending.fetch_sub(1, Ordering::SeqCst);
                ctx.outcomes.insert(
                    index,
                    UpdateOutcome::Failed(
                        InstallError::ConcurrencyError {
                            message: "worker queue closed".to_string(),
                        }
                        .into(),
                    ),
                );
            }
        }

        while ctx.pending.load(Ordering::SeqCst) > 0 {
            ctx.idle.notified().await;
        }

        for _ in 0..self.workers {
            if job_tx.send(Job::Stop).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                self.emit_error(format!("fetch worker terminated abnormally: {e}"));
            }
        }

        let entries: Vec<UpdateEntry> = deps
            .iter()
            .enumerate()
            .map(|(index, dep)| UpdateEntry {
                dependency: dep.name.clone(),
                outcome: ctx.outcomes.remove(&index).map_or_else(
                    || {
                        UpdateOutcome::Failed(
                            InstallError::ConcurrencyError {
                                message: format!("no result recorded for {}", dep.name),
                            }
                            .into(),
                        )
                    },
                    |(_, outcome)| outcome,
                ),
            })
            .collect();
        let report = UpdateReport::new(entries, start.elapsed());

        self.emit(AppEvent::Install(InstallEvent::PoolFinished {
            updated: report.updated_count(),
            failed: report.failures().count(),
            cancelled: report.cancelled_count(),
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
        }));
        report
    }
}

async fn worker_loop(ctx: WorkerContext) {
    loop {
        let job = {
            let mut jobs = ctx.jobs.lock().await;
            jobs.recv().await
        };

        match job {
            Some(Job::Update(index, dep)) => {
                // A panicking driver fails its own dependency, not the batch
                let outcome = AssertUnwindSafe(update_one(&ctx, &dep))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        let e: Error = InstallError::UpdateFailed {
                            package: dep.name.clone(),
                            message: format!("update panicked: {}", panic_message(&*panic)),
                        }
                        .into();
                        report_failure(&ctx, &dep, &e);
                        UpdateOutcome::Failed(e)
                    });
                ctx.outcomes.insert(index, outcome);
                if ctx.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                    ctx.idle.notify_one();
                }
            }
            Some(Job::Stop) | None => break,
        }
    }
}

async fn update_one(ctx: &WorkerContext, dep: &Dependency) -> UpdateOutcome {
    if ctx.cancel.is_cancelled() {
        return UpdateOutcome::Cancelled;
    }

    // The name becomes a path under the vendor directory
    if let Err(e) = normalize_name(&dep.name) {
        let e = Error::from(e);
        report_failure(ctx, dep, &e);
        return UpdateOutcome::Failed(e);
    }

    let operation = ctx.vcs.update(dep, &ctx.base_dir, &ctx.cache);
    let result = tokio::select! {
        biased;
        () = ctx.cancel.cancelled() => return UpdateOutcome::Cancelled,
        result = with_timeout(ctx.timeout, operation) => result,
    };

    match result {
        Some(Ok(())) => UpdateOutcome::Updated,
        Some(Err(e)) => {
            report_failure(ctx, dep, &e);
            UpdateOutcome::Failed(e)
        }
        None => {
            let e: Error = InstallError::OperationTimeout {
                package: dep.name.clone(),
                timeout_seconds: ctx.timeout.map_or(0, |t| t.as_secs()),
            }
            .into();
            report_failure(ctx, dep, &e);
            UpdateOutcome::TimedOut
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// `None` when the timeout elapsed first
async fn with_timeout<F>(timeout: Option<Duration>, operation: F) -> Option<Result<(), Error>>
where
    F: std::future::Future<Output = Result<(), Error>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, operation).await.ok(),
        None => Some(operation.await),
    }
}

fn report_failure(ctx: &WorkerContext, dep: &Dependency, error: &Error) {
    ctx.emit(AppEvent::Fetch(FetchEvent::Failed {
        package: dep.name.clone(),
        operation: FetchOperation::Update,
        failure: FailureContext::from_error(error),
    }));
}
