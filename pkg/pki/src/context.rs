use pkg_types::secret::SecretLocation;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{BootstrapError, Result, StoreOp};

/// Cancellation token plus optional deadline, forwarded to every store call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run one store call under this context. The call future is dropped, and
    /// so aborted, as soon as the token trips or the deadline passes.
    pub(crate) async fn run<T, F>(&self, op: StoreOp, location: &SecretLocation, call: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let cancelled = |reason| BootstrapError::Cancelled {
            op,
            location: location.clone(),
            reason,
        };

        if self.cancel.is_cancelled() {
            return Err(cancelled("cancelled"));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(cancelled("deadline exceeded"));
        }

        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(cancelled("cancelled")),
            _ = deadline => Err(cancelled("deadline exceeded")),
            res = call => res.map_err(|source| BootstrapError::StoreOperation {
                op,
                location: location.clone(),
                source,
            }),
        }
    }
}
