//! Client side of the orchestrator.

use super::view::View;
use splice_types::Sequence;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One `(script, input)` pair awaiting evaluation.
#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub(crate) sequence: Sequence,
    pub(crate) script: Arc<str>,
    pub(crate) input: Arc<str>,
}

/// Handle for submitting requests to an [`Orchestrator`](super::Orchestrator)
/// and observing its [`View`].
///
/// Clones share the sequence counter, so sequences stay unique and
/// increasing across all clones. The orchestrator stops once every handle is
/// dropped.
#[derive(Clone, Debug)]
pub struct OrchestratorHandle {
    request_tx: mpsc::UnboundedSender<Request>,
    counter: Arc<AtomicU64>,
    view_rx: watch::Receiver<View>,
    shutdown: CancellationToken,
}

impl OrchestratorHandle {
    pub(crate) fn new(
        request_tx: mpsc::UnboundedSender<Request>,
        view_rx: watch::Receiver<View>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            request_tx,
            counter: Arc::new(AtomicU64::new(0)),
            view_rx,
            shutdown,
        }
    }

    /// Submits a request and returns its sequence.
    ///
    /// Fire-and-forget: the result, if it is still the latest when it
    /// completes, shows up in the [`View`]. Submitting after shutdown is
    /// not an error; the request is simply never evaluated.
    pub fn submit(&self, script: impl Into<Arc<str>>, input: impl Into<Arc<str>>) -> Sequence {
        let sequence = Sequence::new(self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        let request = Request {
            sequence,
            script: script.into(),
            input: input.into(),
        };

        if self.request_tx.send(request).is_err() {
            warn!(%sequence, "orchestrator stopped, request dropped");
        } else {
            debug!(%sequence, "request submitted");
        }
        sequence
    }

    /// Returns a receiver that observes every applied view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.view_rx.clone()
    }

    /// Returns a snapshot of the current view.
    #[must_use]
    pub fn view(&self) -> View {
        self.view_rx.borrow().clone()
    }

    /// Waits until the view reflects `sequence` or a later request.
    ///
    /// Returns `None` if the orchestrator stops first.
    pub async fn wait_for(&self, sequence: Sequence) -> Option<View> {
        let mut rx = self.view_rx.clone();
        rx.wait_for(|view| view.sequence >= sequence)
            .await
            .ok()
            .map(|view| view.clone())
    }

    /// Stops the orchestrator. The in-flight evaluation is cancelled and its
    /// result discarded.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Returns `true` once the orchestrator has stopped accepting requests.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.request_tx.is_closed()
    }
}
