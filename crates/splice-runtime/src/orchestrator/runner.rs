//! The orchestrator actor.

use super::handle::{OrchestratorHandle, Request};
use super::view::View;
use crate::config::OrchestratorConfig;
use crate::evaluation::{EvaluationResult, FailureKind};
use crate::executor::Executor;
use splice_types::Sequence;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The evaluation currently occupying the slot.
struct Running {
    sequence: Sequence,
    cancel: CancellationToken,
    task: JoinHandle<EvaluationResult>,
}

/// Single-task scheduler that owns the view.
///
/// Build with [`Orchestrator::new`] and drive with [`Orchestrator::run`], or
/// use [`Orchestrator::spawn`] to do both on the current runtime.
pub struct Orchestrator {
    executor: Arc<dyn Executor>,
    config: OrchestratorConfig,
    request_rx: mpsc::UnboundedReceiver<Request>,
    view_tx: watch::Sender<View>,
    shutdown: CancellationToken,
    /// Highest sequence received so far ("latest wanted").
    latest: Sequence,
    pending: Option<Request>,
    running: Option<Running>,
}

impl Orchestrator {
    /// Creates an orchestrator and its first handle.
    #[must_use]
    pub fn new(
        executor: Arc<dyn Executor>,
        config: OrchestratorConfig,
    ) -> (Self, OrchestratorHandle) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(View::default());
        let shutdown = CancellationToken::new();

        let orchestrator = Self {
            executor,
            config,
            request_rx,
            view_tx,
            shutdown: shutdown.clone(),
            latest: Sequence::ZERO,
            pending: None,
            running: None,
        };
        let handle = OrchestratorHandle::new(request_tx, view_rx, shutdown);
        (orchestrator, handle)
    }

    /// Creates an orchestrator, spawns its loop, and returns the handle.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(executor: Arc<dyn Executor>, config: OrchestratorConfig) -> OrchestratorHandle {
        let (orchestrator, handle) = Self::new(executor, config);
        tokio::spawn(orchestrator.run());
        handle
    }

    /// Runs the scheduling loop.
    ///
    /// Returns after [`OrchestratorHandle::shutdown`], or once every handle
    /// is dropped and the in-flight and pending work is finished.
    pub async fn run(mut self) {
        info!(
            cancel_superseded = self.config.cancel_superseded,
            "Orchestrator started"
        );
        let mut requests_open = true;

        loop {
            let has_running = self.running.is_some();
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Orchestrator: shutdown requested");
                    if let Some(running) = self.running.take() {
                        running.cancel.cancel();
                    }
                    break;
                }

                result = wait_running(&mut self.running), if has_running => {
                    self.finish(result);
                    self.start_pending();
                }

                request = self.request_rx.recv(), if requests_open => {
                    match request {
                        Some(request) => self.accept(request),
                        None => {
                            debug!("Orchestrator: all handles dropped");
                            requests_open = false;
                        }
                    }
                }
            }

            if !requests_open && self.running.is_none() && self.pending.is_none() {
                break;
            }
        }

        info!(latest = %self.latest, "Orchestrator stopped");
    }

    fn accept(&mut self, request: Request) {
        if request.sequence <= self.latest {
            // a racing clone submitted a lower sequence after a higher one
            debug!(sequence = %request.sequence, latest = %self.latest, "dropping out-of-order request");
            return;
        }
        self.latest = request.sequence;

        let Some(running) = &self.running else {
            self.start(request);
            return;
        };

        if self.config.cancel_superseded && !running.cancel.is_cancelled() {
            debug!(sequence = %running.sequence, "cancelling superseded evaluation");
            running.cancel.cancel();
        }
        if let Some(superseded) = self.pending.replace(request) {
            debug!(sequence = %superseded.sequence, "pending request superseded");
        }
    }

    fn start(&mut self, request: Request) {
        let Request {
            sequence,
            script,
            input,
        } = request;
        debug!(%sequence, "evaluation started");

        let cancel = CancellationToken::new();
        let executor = Arc::clone(&self.executor);
        let token = cancel.clone();
        let task =
            tokio::spawn(async move { executor.execute(&script, &input, token).await });

        self.running = Some(Running {
            sequence,
            cancel,
            task,
        });
    }

    fn start_pending(&mut self) {
        if let Some(request) = self.pending.take() {
            self.start(request);
        }
    }

    fn finish(&mut self, result: Result<EvaluationResult, JoinError>) {
        let Some(running) = self.running.take() else {
            return;
        };
        let sequence = running.sequence;

        let result = result.unwrap_or_else(|e| {
            warn!(%sequence, error = %e, "evaluation task failed");
            EvaluationResult::failure(FailureKind::Runtime, format!("evaluation task failed: {e}"))
        });

        if sequence != self.latest {
            debug!(%sequence, latest = %self.latest, "discarding stale result");
            return;
        }

        match &result {
            EvaluationResult::Success(_) => debug!(%sequence, "evaluation succeeded"),
            EvaluationResult::Failure(f) => {
                warn!(%sequence, kind = %f.kind, message = %f.message, "evaluation failed");
            }
        }
        self.view_tx.send_modify(|view| view.apply(sequence, result));
    }
}

/// Resolves when the running evaluation completes. Never resolves when the
/// slot is empty; callers guard the branch.
async fn wait_running(running: &mut Option<Running>) -> Result<EvaluationResult, JoinError> {
    match running {
        Some(running) => (&mut running.task).await,
        None => std::future::pending().await,
    }
}
