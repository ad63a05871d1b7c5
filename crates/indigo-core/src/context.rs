//! Per-call cancellation and deadlines.
//!
//! A [`RequestContext`] travels with every API call. The call future is raced
//! against the context's deadline and cancellation signal; whichever finishes
//! first decides the outcome, and the losing HTTP future is dropped, which
//! aborts the in-flight request.

use std::future::{pending, Future};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::error::{Error, Result};

/// Cancellation and deadline carrier for a single API call.
///
/// Contexts are cheap to clone; clones share the same cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancelled: Option<watch::Receiver<bool>>,
}

/// Handle that cancels every [`RequestContext`] derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel all calls running under the associated context.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl RequestContext {
    /// A context that never expires and cannot be cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A cancellable context and the handle controlling it.
    #[must_use]
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancelled: Some(receiver),
        };
        (ctx, CancelHandle { sender })
    }

    /// Derive a context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that expires at `deadline`.
    ///
    /// An earlier existing deadline is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true if the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Check the context before starting work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] or [`Error::DeadlineExceeded`] if the
    /// context is already done.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled("context cancelled".to_string()));
        }
        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(Error::DeadlineExceeded(
                "context deadline already passed".to_string(),
            ));
        }
        Ok(())
    }

    /// Drive `future` to completion unless the context finishes first.
    ///
    /// # Errors
    ///
    /// Returns the future's own error, or [`Error::Cancelled`] /
    /// [`Error::DeadlineExceeded`] when the context wins the race.
    pub async fn run<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = wait_cancelled(self.cancelled.clone()) => {
                Err(Error::Cancelled("context cancelled during request".to_string()))
            }
            () = expired => {
                Err(Error::DeadlineExceeded("context deadline reached during request".to_string()))
            }
            result = future => result,
        }
    }
}

async fn wait_cancelled(receiver: Option<watch::Receiver<bool>>) {
    let Some(mut receiver) = receiver else {
        return pending().await;
    };

    // A dropped handle can no longer cancel.
    if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
        pending::<()>().await;
    }
}
