//! Fulfillment polling.
//!
//! A submitted request stays open until an external provider fulfills it. The
//! engine polls a status accessor on a tick cadence, evaluating the status
//! only every Nth tick to keep RPC load down. Exhausting the tick budget is an
//! explicit `TimedOut` outcome, not a silent loop exit, and a shared stop flag
//! can end the wait early.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use oraq_types::{RequestId, RequestStatus, Result};

/// Client-side terminal outcome of waiting on a request.
///
/// `TimedOut` and `Cancelled` describe only what this client observed; the
/// on-chain request is left in whatever state the contract reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Fulfilled,
    Cancelled,
    TimedOut,
}

/// Polling cadence and budget.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Base sleep between ticks.
    pub tick_ms: u64,
    /// Evaluate the status only every Nth tick.
    pub status_stride: u64,
    /// Total tick budget before giving up.
    pub max_ticks: u64,
    /// Added to the tick interval after every evaluated check.
    pub backoff_step_ms: u64,
    /// Upper bound on the stretched tick interval.
    pub max_tick_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            status_stride: 10,
            max_ticks: 200,
            backoff_step_ms: 250,
            max_tick_ms: 5_000,
        }
    }
}

/// Reads the current on-chain status of a request.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn status(&self, request_id: &RequestId) -> Result<RequestStatus>;
}

/// Poll progress events.
#[derive(Debug, Clone)]
pub enum PollEvent {
    Started { request_id: RequestId },
    Checked { tick: u64, status: RequestStatus },
    Completed { request_id: RequestId, outcome: RequestOutcome },
}

/// Callback type for poll events.
pub type PollEventHandler = Box<dyn Fn(PollEvent) + Send + Sync>;

/// Shared flag that ends a poll loop early.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives the poll loop for one request at a time.
pub struct PollEngine {
    config: PollConfig,
    stop: StopHandle,
    on_event: Option<PollEventHandler>,
}

impl PollEngine {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            stop: StopHandle::new(),
            on_event: None,
        }
    }

    pub fn with_event_handler(mut self, handler: PollEventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    /// Handle for ending the wait early from another task.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn emit(&self, event: PollEvent) {
        if let Some(ref handler) = self.on_event {
            handler(event);
        }
    }

    /// Wait until the request leaves `Requested`, the stop flag is raised, or
    /// the tick budget runs out.
    ///
    /// The status is evaluated at every `status_stride`-th tick (never at tick
    /// zero), so a transition at tick k is reported at the first evaluated
    /// tick at or after k. Each evaluated check stretches the tick interval by
    /// `backoff_step_ms`, capped at `max_tick_ms`.
    pub async fn wait(
        &self,
        probe: &dyn StatusProbe,
        request_id: &RequestId,
    ) -> Result<RequestOutcome> {
        let stride = self.config.status_stride.max(1);
        let mut interval = self.config.tick_ms;

        self.emit(PollEvent::Started { request_id: *request_id });

        for tick in 1..=self.config.max_ticks {
            if self.stop.is_stopped() {
                return self.complete(request_id, RequestOutcome::Cancelled);
            }

            if tick % stride == 0 {
                let status = probe.status(request_id).await?;
                self.emit(PollEvent::Checked { tick, status });
                if !status.is_open() {
                    return self.complete(request_id, RequestOutcome::Fulfilled);
                }
                interval = (interval + self.config.backoff_step_ms).min(self.config.max_tick_ms);
            }

            tokio::time::sleep(Duration::from_millis(interval)).await;
        }

        self.complete(request_id, RequestOutcome::TimedOut)
    }

    fn complete(&self, request_id: &RequestId, outcome: RequestOutcome) -> Result<RequestOutcome> {
        self.emit(PollEvent::Completed {
            request_id: *request_id,
            outcome,
        });
        Ok(outcome)
    }
}
