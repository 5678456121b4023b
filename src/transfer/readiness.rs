//! Module `readiness`
//!
//! One-shot gate between the background accept task of a passive channel
//! and the callers reading or writing on it. The gate leaves `Pending`
//! exactly once, either with the accepted connection or with the error
//! that ended the accept, and never changes again.

use std::io;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{DataChannelError, shared_io_error};
use crate::transfer::stream::Connection;
use crate::utils::logging::Logger;

#[derive(Clone)]
enum AcceptState {
    Pending,
    Ready(Arc<Connection>),
    Failed(Arc<DataChannelError>),
}

impl AcceptState {
    fn is_pending(&self) -> bool {
        matches!(self, AcceptState::Pending)
    }
}

pub struct AcceptGate {
    state: watch::Sender<AcceptState>,
}

impl AcceptGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AcceptState::Pending);
        Self { state }
    }

    /// Records the accept outcome. Returns `false` if the gate was already resolved,
    /// in which case `outcome` is dropped.
    pub fn resolve(&self, outcome: Result<Connection, DataChannelError>) -> bool {
        self.state.send_if_modified(move |state| {
            if !state.is_pending() {
                return false;
            }
            *state = match outcome {
                Ok(connection) => AcceptState::Ready(Arc::new(connection)),
                Err(error) => AcceptState::Failed(Arc::new(error)),
            };
            true
        })
    }

    /// Suspends until the gate resolves, then hands out the connection or the
    /// recorded error. Once resolved this returns without waiting.
    pub async fn wait(&self) -> io::Result<Arc<Connection>> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(|state| !state.is_pending())
            .await
            .map_err(|_| io::Error::from(DataChannelError::AcceptAbandoned))?;

        match &*state {
            AcceptState::Ready(connection) => Ok(Arc::clone(connection)),
            AcceptState::Failed(error) => Err(shared_io_error(error)),
            AcceptState::Pending => Err(DataChannelError::AcceptAbandoned.into()),
        }
    }

    /// The accepted connection, if the gate resolved successfully.
    pub fn connection(&self) -> Option<Arc<Connection>> {
        match &*self.state.borrow() {
            AcceptState::Ready(connection) => Some(Arc::clone(connection)),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }
}

/// Owned by the accept task. Records the accept outcome and reports a
/// failure to the diagnostics sink once, at the moment it is recorded.
/// Fails the gate if the task is dropped before it resolves, e.g. when the
/// task is aborted or its runtime shuts down.
pub struct AbandonGuard {
    gate: Arc<AcceptGate>,
    logger: Arc<dyn Logger>,
    session_id: String,
}

impl AbandonGuard {
    pub fn new(gate: Arc<AcceptGate>, logger: Arc<dyn Logger>, session_id: &str) -> Self {
        Self {
            gate,
            logger,
            session_id: session_id.to_string(),
        }
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn resolve(&self, outcome: Result<Connection, DataChannelError>) -> bool {
        let failure = outcome.as_ref().err().map(ToString::to_string);
        let recorded = self.gate.resolve(outcome);
        if let (true, Some(failure)) = (recorded, failure) {
            self.logger.print(&self.session_id, &failure);
        }
        recorded
    }
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        self.resolve(Err(DataChannelError::AcceptAbandoned));
    }
}
