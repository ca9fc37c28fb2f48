use super::engine::ComputeEngine;
use crate::domain::request::CalculationRequest;
use crate::domain::result::CalculationResult;
use crate::error::{CalculationError, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker tasks pulling from the job queue.
    pub workers: usize,
    /// Jobs that may wait for a free worker before submissions are refused.
    pub queue_capacity: usize,
    /// Upper bound on how long a caller waits for one computation.
    pub timeout: Duration,
    /// Latency added before each computation, standing in for an external lookup.
    pub simulated_latency: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            timeout: Duration::from_secs(5),
            simulated_latency: Duration::ZERO,
        }
    }
}

struct Job {
    request: CalculationRequest,
    reply: oneshot::Sender<Result<CalculationResult>>,
}

/// Runs computations on a fixed pool of worker tasks.
///
/// Submitting never waits on a computation: the job is queued and a
/// [`PendingCalculation`] is returned immediately. Each submission gets exactly
/// one computation attempt.
pub struct Dispatcher {
    jobs: mpsc::Sender<Job>,
    timeout: Duration,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Starts the worker pool on the current tokio runtime.
    pub fn start(engine: ComputeEngine, config: DispatcherConfig) -> Self {
        Self::start_on(&Handle::current(), engine, config)
    }

    /// Starts the worker pool on `runtime`, which may be distinct from the one
    /// accepting requests.
    pub fn start_on(runtime: &Handle, engine: ComputeEngine, config: DispatcherConfig) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let engine = Arc::new(engine);

        let workers = (0..config.workers.max(1))
            .map(|id| {
                let rx = rx.clone();
                let engine = engine.clone();
                let latency = config.simulated_latency;
                runtime.spawn(async move {
                    loop {
                        let job = rx.lock().await.recv().await;
                        match job {
                            Some(job) => run_job(id, &engine, latency, job).await,
                            None => break,
                        }
                    }
                    debug!(worker = id, "compute worker stopped");
                })
            })
            .collect();

        Self {
            jobs: tx,
            timeout: config.timeout,
            workers,
        }
    }

    /// Queues `request` for computation.
    ///
    /// A full queue or a stopped pool resolves the returned handle with a
    /// `ComputeFailure` instead of blocking the caller.
    pub fn submit(&self, request: CalculationRequest) -> PendingCalculation {
        let (reply, receiver) = oneshot::channel();
        let pending = PendingCalculation {
            receiver,
            timeout: self.timeout,
        };

        if let Err(err) = self.jobs.try_send(Job { request, reply }) {
            let (job, reason) = match err {
                mpsc::error::TrySendError::Full(job) => (job, "compute queue is full"),
                mpsc::error::TrySendError::Closed(job) => (job, "dispatcher is shut down"),
            };
            warn!(reason, "refusing calculation");
            let _ = job
                .reply
                .send(Err(CalculationError::ComputeFailure(reason.to_string())));
        }
        pending
    }

    /// Queues `request`, waiting for room in the queue instead of refusing it.
    ///
    /// Only a stopped pool resolves the handle with a `ComputeFailure`.
    pub async fn submit_wait(&self, request: CalculationRequest) -> PendingCalculation {
        let (reply, receiver) = oneshot::channel();
        let pending = PendingCalculation {
            receiver,
            timeout: self.timeout,
        };

        if let Err(mpsc::error::SendError(job)) = self.jobs.send(Job { request, reply }).await {
            warn!("refusing calculation, dispatcher is shut down");
            let _ = job.reply.send(Err(CalculationError::ComputeFailure(
                "dispatcher is shut down".to_string(),
            )));
        }
        pending
    }

    /// Stops accepting work and waits for the workers to drain the queue.
    pub async fn shutdown(self) {
        drop(self.jobs);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "compute worker terminated abnormally");
            }
        }
    }
}

async fn run_job(worker: usize, engine: &ComputeEngine, latency: Duration, job: Job) {
    let Job { request, mut reply } = job;
    if reply.is_closed() {
        debug!(worker, "calculation abandoned before it started");
        return;
    }

    if !latency.is_zero() {
        tokio::select! {
            _ = tokio::time::sleep(latency) => {}
            _ = reply.closed() => {
                debug!(worker, "calculation abandoned while waiting");
                return;
            }
        }
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| engine.compute(&request)))
        .unwrap_or_else(|_| Err(CalculationError::ComputeFailure("calculation panicked".to_string())));

    if reply.send(outcome).is_err() {
        debug!(worker, "calculation finished after its caller gave up");
    }
}

/// Handle to a submitted calculation.
///
/// Dropping the handle, or calling [`cancel`](Self::cancel), abandons the
/// calculation; a worker that has not started it yet skips it.
pub struct PendingCalculation {
    receiver: oneshot::Receiver<Result<CalculationResult>>,
    timeout: Duration,
}

impl PendingCalculation {
    /// Waits for the calculation, bounded by the dispatcher timeout.
    pub async fn outcome(self) -> Result<CalculationResult> {
        match tokio::time::timeout(self.timeout, self.receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(CalculationError::ComputeFailure(
                "compute worker dropped the calculation".to_string(),
            )),
            Err(_) => Err(CalculationError::Timeout(self.timeout)),
        }
    }

    /// Attaches continuations: exactly one of them runs, once, on a spawned task.
    /// The returned handle yields whatever that continuation produced.
    pub fn on_completion<T, S, SF, F, FF>(self, on_success: S, on_failure: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        S: FnOnce(CalculationResult) -> SF + Send + 'static,
        SF: Future<Output = T> + Send + 'static,
        F: FnOnce(CalculationError) -> FF + Send + 'static,
        FF: Future<Output = T> + Send + 'static,
    {
        tokio::spawn(async move {
            match self.outcome().await {
                Ok(result) => on_success(result).await,
                Err(err) => on_failure(err).await,
            }
        })
    }

    pub fn cancel(mut self) {
        self.receiver.close();
    }
}
