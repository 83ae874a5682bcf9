//! Shared utilities for use cases.
//!
//! Contains the requeue policy every reconcile result maps to, and the
//! cancellation helpers used around external calls.

use super::workflow_lifecycle::LifecycleError;
use crate::ports::cluster::ClusterError;
use conductor_domain::{ConsensusError, ErrorKind};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// When a key should be reconciled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeuePolicy {
    /// Wait for the next change or resync.
    Never,
    /// Straight back onto the queue, no backoff.
    Immediate,
    /// After a fixed delay.
    After(Duration),
    /// After the key's exponential backoff delay.
    Backoff,
}

impl RequeuePolicy {
    /// Requeue behaviour for a failed reconcile.
    pub fn for_error(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::ConflictRetry => RequeuePolicy::Immediate,
            ErrorKind::Transient | ErrorKind::NotFound | ErrorKind::SeatLimit => {
                RequeuePolicy::Backoff
            }
            ErrorKind::ValidationFailed
            | ErrorKind::MalformedToken
            | ErrorKind::BadSignature
            | ErrorKind::Expired
            | ErrorKind::AlreadyExists
            | ErrorKind::Fatal => RequeuePolicy::Never,
        }
    }
}

/// Failure of a single reconcile pass. The controller turns its
/// [`kind`](ReconcileError::kind) into a [`RequeuePolicy`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Cluster(e) => e.kind(),
            ReconcileError::Lifecycle(e) => e.kind(),
            ReconcileError::Consensus(e) => e.kind(),
            ReconcileError::Cancelled(_) => ErrorKind::Transient,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ReconcileError::Cluster(e) => e.is_not_found(),
            ReconcileError::Lifecycle(e) => e.is_not_found(),
            ReconcileError::Consensus(_) | ReconcileError::Cancelled(_) => false,
        }
    }
}

/// The operation was abandoned because its cancellation token fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation cancelled")]
pub struct Cancelled;

/// Return `Err(Cancelled)` if cancellation has been requested.
pub(crate) fn check_cancelled<E: From<Cancelled>>(token: &CancellationToken) -> Result<(), E> {
    if token.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(())
}

/// Run `fut`, abandoning it as soon as `token` is cancelled.
///
/// A write already sent to the cluster may still land; the next reconcile
/// observes it.
pub(crate) async fn cancellable<T, E, F>(token: &CancellationToken, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<Cancelled>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled.into()),
        result = fut => result,
    }
}
