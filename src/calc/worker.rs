use crate::calc::client::Recognizer;
use crate::calc::wire::{CalculateRequest, RecognitionResult};
use crate::session::Ticket;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

pub struct Completion {
    pub ticket: Ticket,
    pub outcome: anyhow::Result<Vec<RecognitionResult>>,
}

type WakeHook = Arc<dyn Fn() + Send + Sync>;

/// Runs each request on its own thread and hands completions back over a
/// channel. There is no queueing or de-duplication: every submit is a new
/// request, and completions arrive in whatever order the service answers.
pub struct RecognitionWorker {
    recognizer: Arc<dyn Recognizer>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    wake: Option<WakeHook>,
}

impl RecognitionWorker {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        let (tx, rx) = channel();
        Self {
            recognizer,
            tx,
            rx,
            wake: None,
        }
    }

    /// Called from the worker thread after a completion is sent, so the UI
    /// can repaint without polling.
    pub fn with_wake_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.wake = Some(Arc::new(hook));
        self
    }

    pub fn submit(&self, ticket: Ticket, request: CalculateRequest) {
        let recognizer = Arc::clone(&self.recognizer);
        let tx = self.tx.clone();
        let wake = self.wake.clone();
        std::thread::spawn(move || {
            let outcome = recognizer.recognize(&request);
            if let Err(e) = &outcome {
                tracing::warn!(ticket = ticket.id, "recognition failed: {e:#}");
            }
            if tx.send(Completion { ticket, outcome }).is_err() {
                tracing::debug!(ticket = ticket.id, "completion dropped; receiver gone");
                return;
            }
            if let Some(wake) = wake {
                wake();
            }
        });
    }

    pub fn try_recv(&self) -> Option<Completion> {
        self.rx.try_recv().ok()
    }

    pub fn drain(&self) -> Vec<Completion> {
        self.rx.try_iter().collect()
    }

    /// Block until the next completion. Meant for tests and headless use.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Completion> {
        self.rx.recv_timeout(timeout).ok()
    }
}
