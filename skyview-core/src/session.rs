//! Async driver that runs the shell's fetch tickets on the tokio runtime.

use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use crate::{
    error::FetchError,
    model::{FormattedWeather, Query},
    orchestrator::Orchestrator,
    shell::{Action, FetchTicket, Outcome, Shell},
};

struct Completion {
    ticket: FetchTicket,
    result: Result<FormattedWeather, FetchError>,
}

/// Owns a [`Shell`] and at most one in-flight fetch.
///
/// Issuing a new ticket aborts the previous task; anything that still
/// completes late is rejected by the shell's generation check.
pub struct Session {
    orchestrator: Arc<Orchestrator>,
    shell: Shell,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("shell", &self.shell)
            .field("in_flight", &self.in_flight.is_some())
            .finish()
    }
}

impl Session {
    pub fn new(orchestrator: Orchestrator, query: Query) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            orchestrator: Arc::new(orchestrator),
            shell: Shell::new(query),
            tx,
            rx,
            in_flight: None,
        }
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Kick off the initial fetch. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        let ticket = self.shell.start();
        self.spawn(ticket);
    }

    /// Apply a user action; returns whether a new fetch was issued.
    pub fn dispatch(&mut self, action: Action) -> bool {
        match self.shell.apply(action) {
            Some(ticket) => {
                self.spawn(ticket);
                true
            }
            None => false,
        }
    }

    /// Wait for the next fetch to finish and fold it into the shell.
    ///
    /// Cancel safe: nothing is consumed unless a completion is received.
    pub async fn next_outcome(&mut self) -> Outcome {
        // `self.tx` keeps the channel open for the session's lifetime.
        let Some(done) = self.rx.recv().await else {
            return std::future::pending().await;
        };

        if self.shell.is_current(&done.ticket) {
            self.in_flight = None;
        }
        self.shell.complete(&done.ticket, done.result)
    }

    fn spawn(&mut self, ticket: FetchTicket) {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
            debug!(superseded_by = ticket.generation, "aborted in-flight fetch");
        }

        let orchestrator = Arc::clone(&self.orchestrator);
        let tx = self.tx.clone();

        self.in_flight = Some(tokio::spawn(async move {
            let result = orchestrator.fetch(&ticket.query).await;
            // Receiver only goes away with the session itself.
            let _ = tx.send(Completion { ticket, result });
        }));
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
