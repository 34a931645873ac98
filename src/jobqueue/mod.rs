//! In-process job queue (spec §4.3, §6 JobQueue, §9 "retry discipline"):
//! at-least-once delivery, per-job retry with exponential backoff (base
//! 1s, three attempts), dead-letter semantics after exhaustion.
//!
//! The spec requires only an abstract at-least-once interface with no
//! external broker in scope (SPEC_FULL.md §6); this is a bounded
//! `tokio::sync::mpsc` queue with its own retry bookkeeping, backed by the
//! `job_dead_letters` WARM table.

use crate::config::Tunables;
use crate::error::AppError;
use crate::warm::WarmClient;
use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, warn};

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send>>;
pub type JobHandler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_secs(1);

struct Job {
    topic: String,
    payload: Value,
}

pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
    handlers: DashMap<String, JobHandler>,
}

impl JobQueue {
    pub fn start(warm: WarmClient, _tunables: Tunables) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Arc::new(Self { tx, handlers: DashMap::new() });
        tokio::spawn(run_dispatch(rx, queue.clone(), warm));
        queue
    }

    /// Register the handler invoked for jobs on `topic`. Engines register
    /// their own handler once, at construction, over a clone of their own
    /// `Arc` (mirrors the teacher's `Matrix::register_sender` self-capture).
    pub fn register(&self, topic: &str, handler: JobHandler) {
        self.handlers.insert(topic.to_string(), handler);
    }

    /// Enqueue a job. Failure to enqueue (e.g. during shutdown) is logged
    /// but never blocks the caller's hot-path write (spec §4.2 step 5:
    /// "failure to enqueue ... does NOT fail the ping").
    pub fn enqueue(&self, topic: &str, payload: Value) {
        if self.tx.send(Job { topic: topic.to_string(), payload }).is_err() {
            warn!(%topic, "JobQueue: dispatch task gone, job dropped");
        }
    }
}

async fn run_dispatch(mut rx: mpsc::UnboundedReceiver<Job>, queue: Arc<JobQueue>, warm: WarmClient) {
    while let Some(job) = rx.recv().await {
        let queue = queue.clone();
        let warm = warm.clone();
        tokio::spawn(async move { run_job(job, &queue, &warm).await });
    }
}

async fn run_job(job: Job, queue: &JobQueue, warm: &WarmClient) {
    let Some(handler) = queue.handlers.get(&job.topic).map(|h| h.clone()) else {
        warn!(topic = %job.topic, "JobQueue: no handler registered, dropping job");
        return;
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        match handler(job.payload.clone()).await {
            Ok(()) => return,
            Err(e) if attempt >= MAX_ATTEMPTS => {
                error!(topic = %job.topic, error = %e, attempt, "JobQueue: job exhausted retries, dead-lettering");
                let payload_json = job.payload.to_string();
                if let Err(write_err) =
                    warm.dead_letters().insert(&job.topic, &payload_json, &e.to_string(), now_seconds()).await
                {
                    error!(error = %write_err, "JobQueue: failed to persist dead letter");
                }
                return;
            }
            Err(e) => {
                warn!(topic = %job.topic, error = %e, attempt, "JobQueue: job failed, retrying");
                tokio::time::sleep(BASE_BACKOFF * 2u32.pow(attempt - 1)).await;
            }
        }
    }
}

fn now_seconds() -> i64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}
