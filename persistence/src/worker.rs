//! Background execution of remote writes.

use std::{
    io,
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use tracing::{debug, warn};

use crate::{RemoteOp, RemoteStore};

/// Remote operation tagged with a caller-chosen identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteRequest {
    /// Identifier echoed in the matching [`RemoteOutcome`].
    pub id: u64,
    /// Operation to execute.
    pub op: RemoteOp,
}

/// Result of executing a [`RemoteRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteOutcome {
    /// Identifier of the request.
    pub id: u64,
    /// Name of the executed operation.
    pub operation: &'static str,
    /// Failure description, `None` on success.
    pub error: Option<String>,
}

impl RemoteOutcome {
    /// Reports whether the store accepted the operation.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Executes a request synchronously, logging failures.
pub fn dispatch(store: &mut dyn RemoteStore, request: &RemoteRequest) -> RemoteOutcome {
    let operation = request.op.name();
    let error = match request.op.apply(store) {
        Ok(()) => {
            debug!(id = request.id, operation, "remote write applied");
            None
        }
        Err(error) => {
            warn!(id = request.id, operation, error = %error, "remote write failed");
            Some(error.to_string())
        }
    };
    RemoteOutcome {
        id: request.id,
        operation,
        error,
    }
}

/// Dedicated thread that owns the remote store and executes requests in order.
#[derive(Debug)]
pub struct RemoteWorker {
    requests: Option<Sender<RemoteRequest>>,
    outcomes: Receiver<RemoteOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl RemoteWorker {
    /// Moves the store onto a new worker thread.
    pub fn spawn<S>(mut store: S) -> io::Result<Self>
    where
        S: RemoteStore + 'static,
    {
        let (request_sender, request_receiver) = mpsc::channel::<RemoteRequest>();
        let (outcome_sender, outcome_receiver) = mpsc::channel::<RemoteOutcome>();
        let handle = thread::Builder::new()
            .name("garden-remote".to_owned())
            .spawn(move || {
                for request in request_receiver {
                    let outcome = dispatch(&mut store, &request);
                    if outcome_sender.send(outcome).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            requests: Some(request_sender),
            outcomes: outcome_receiver,
            handle: Some(handle),
        })
    }

    /// Queues a request; returns `false` when the worker has stopped.
    pub fn submit(&self, request: RemoteRequest) -> bool {
        self.requests
            .as_ref()
            .map(|sender| sender.send(request).is_ok())
            .unwrap_or(false)
    }

    /// Outcomes that completed since the last poll, in completion order.
    #[must_use]
    pub fn poll(&self) -> Vec<RemoteOutcome> {
        self.outcomes.try_iter().collect()
    }

    /// Waits for every queued request to finish and returns the outstanding outcomes.
    pub fn shutdown(mut self) -> Vec<RemoteOutcome> {
        self.stop();
        self.outcomes.try_iter().collect()
    }

    fn stop(&mut self) {
        drop(self.requests.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("remote worker panicked");
            }
        }
    }
}

impl Drop for RemoteWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
