//! Asynchronous map operations with progress, success, and failure channels
//!
//! A storage backend hands out an [`Operation`] and keeps the matching
//! [`Deferred`]. It may report progress any number of times before settling
//! the operation exactly once. Settling consumes the [`Deferred`], so no
//! progress can follow the outcome and an operation never settles twice.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Progress payload reported by a backend
pub type Progress = Value;

type Outcome<T, E> = Pin<Box<dyn Future<Output = Option<Result<T, E>>> + Send>>;

/// An event observed on an operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationEvent<T, E> {
    Progress(Progress),
    Succeeded(T),
    Failed(E),
}

impl<T, E> From<Result<T, E>> for OperationEvent<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => OperationEvent::Succeeded(value),
            Err(err) => OperationEvent::Failed(err),
        }
    }
}

/// Producer side of an operation
#[derive(Debug)]
pub struct Deferred<T, E> {
    progress: mpsc::UnboundedSender<Progress>,
    outcome: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Deferred<T, E> {
    /// Report progress to the operation's observers
    pub fn notify(&self, update: impl Into<Progress>) {
        // A dropped operation has nobody left to tell
        let _ = self.progress.send(update.into());
    }

    /// Settle the operation successfully
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Settle the operation with a failure
    pub fn reject(self, err: E) {
        self.settle(Err(err));
    }

    /// Settle the operation with either outcome
    pub fn settle(self, result: Result<T, E>) {
        let _ = self.outcome.send(result);
    }
}

/// Consumer side of an asynchronous map operation
pub struct Operation<T, E> {
    progress: mpsc::UnboundedReceiver<Progress>,
    outcome: Option<Outcome<T, E>>,
    settled: Option<Result<T, E>>,
}

impl<T, E> std::fmt::Debug for Operation<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("pending", &self.outcome.is_some())
            .finish()
    }
}

impl<T: Send + 'static, E: Send + 'static> Operation<T, E> {
    /// Create a pending operation and the handle that settles it
    pub fn pending() -> (Deferred<T, E>, Self) {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let outcome: Outcome<T, E> = Box::pin(async move { outcome_rx.await.ok() });
        let deferred = Deferred {
            progress: progress_tx,
            outcome: outcome_tx,
        };
        let operation = Self {
            progress: progress_rx,
            outcome: Some(outcome),
            settled: None,
        };
        (deferred, operation)
    }

    /// Create an operation that has already succeeded
    pub fn resolved(value: T) -> Self {
        let (deferred, operation) = Self::pending();
        deferred.resolve(value);
        operation
    }

    /// Create an operation that has already failed
    pub fn rejected(err: E) -> Self {
        let (deferred, operation) = Self::pending();
        deferred.reject(err);
        operation
    }

    /// Transform the outcome of this operation
    ///
    /// Progress passes through unchanged and in order. `f` runs once, when
    /// the original operation settles.
    pub fn map_outcome<U, F, G>(self, f: G) -> Operation<U, F>
    where
        U: Send + 'static,
        F: Send + 'static,
        G: FnOnce(Result<T, E>) -> Result<U, F> + Send + 'static,
    {
        let (outcome, settled) = match self.outcome {
            Some(outcome) => {
                let mapped: Outcome<U, F> = Box::pin(async move { outcome.await.map(f) });
                (Some(mapped), None)
            }
            None => (None, self.settled.map(f)),
        };
        Operation {
            progress: self.progress,
            outcome,
            settled,
        }
    }

    /// Transform the success value, leaving failures alone
    pub fn map<U, G>(self, f: G) -> Operation<U, E>
    where
        U: Send + 'static,
        G: FnOnce(T) -> U + Send + 'static,
    {
        self.map_outcome(|result| result.map(f))
    }

    /// Transform the failure payload, leaving successes alone
    pub fn map_err<F, G>(self, f: G) -> Operation<T, F>
    where
        F: Send + 'static,
        G: FnOnce(E) -> F + Send + 'static,
    {
        self.map_outcome(|result| result.map_err(f))
    }
}

impl<T, E> Operation<T, E> {
    /// Wait for the next event
    ///
    /// Yields queued progress first, then the outcome, then `None`. Also
    /// yields `None` if the producer went away without settling.
    pub async fn next_event(&mut self) -> Option<OperationEvent<T, E>> {
        if let Some(outcome) = self.outcome.as_mut() {
            let settled = tokio::select! {
                biased;
                Some(update) = self.progress.recv() => {
                    return Some(OperationEvent::Progress(update));
                }
                settled = outcome => settled,
            };
            self.outcome = None;
            self.settled = settled;
        }

        // Progress sent just before settling can still be queued
        if self.settled.is_some() {
            if let Ok(update) = self.progress.try_recv() {
                return Some(OperationEvent::Progress(update));
            }
        }
        self.settled.take().map(OperationEvent::from)
    }

    /// Drive the operation to completion, reporting progress along the way
    ///
    /// Returns `None` if the operation was abandoned by its producer.
    pub async fn settle(mut self, mut on_progress: impl FnMut(Progress)) -> Option<Result<T, E>> {
        while let Some(event) = self.next_event().await {
            match event {
                OperationEvent::Progress(update) => on_progress(update),
                OperationEvent::Succeeded(value) => return Some(Ok(value)),
                OperationEvent::Failed(err) => return Some(Err(err)),
            }
        }
        None
    }

    /// Collect every event until the operation ends
    pub async fn events(mut self) -> Vec<OperationEvent<T, E>> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }
}
