//! Line queue shared by the background reader and the command path
//!
//! The queue and the connection's lifecycle flag live under one mutex so a
//! waiting command can never miss the transition to closed: it either sees a
//! line, sees the connection closing, or is woken by whichever happens next.

use crate::error::{Result, SlicerError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::debug;

/// Lifecycle of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Accepting commands
    Open,
    /// Shutdown in progress: process being killed and reaped
    Closing,
    /// Process reaped, reader finished
    Closed,
}

#[derive(Debug)]
struct Inner {
    lines: VecDeque<String>,
    state: LifecycleState,
    /// Replies owed to commands that were dropped mid-flight
    stale: usize,
}

/// Arrival-ordered reply lines plus the lifecycle flag
#[derive(Debug)]
pub(crate) struct LineQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl LineQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                lines: VecDeque::new(),
                state: LifecycleState::Open,
                stale: 0,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line and wake the waiting command, if any
    pub(crate) fn push(&self, line: String) {
        self.lock().lines.push_back(line);
        self.notify.notify_one();
    }

    /// Take the oldest line, waiting until one arrives
    ///
    /// Lines already queued are still handed out after shutdown has begun;
    /// once the queue is empty and the connection is not open this fails with
    /// [`SlicerError::Closed`].
    pub(crate) async fn pop(&self) -> Result<String> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push or close in between is not lost
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                while inner.stale > 0 {
                    let Some(line) = inner.lines.pop_front() else {
                        break;
                    };
                    inner.stale -= 1;
                    debug!(line_len = line.len(), "Discarded reply to a dropped command");
                }
                if inner.stale == 0
                    && let Some(line) = inner.lines.pop_front()
                {
                    return Ok(line);
                }
                if inner.state != LifecycleState::Open {
                    return Err(SlicerError::Closed);
                }
            }

            notified.await;
        }
    }

    /// Record that the next reply belongs to a command nobody waits for
    pub(crate) fn mark_stale(&self) {
        self.lock().stale += 1;
    }

    /// Win the `Open -> Closing` transition
    ///
    /// Returns `false` if someone else already did. The winner's call wakes
    /// every waiter so blocked commands observe the shutdown.
    pub(crate) fn begin_close(&self) -> bool {
        {
            let mut inner = self.lock();
            if inner.state != LifecycleState::Open {
                return false;
            }
            inner.state = LifecycleState::Closing;
        }
        self.notify.notify_waiters();
        true
    }

    /// Mark shutdown complete
    pub(crate) fn finish_close(&self) {
        self.lock().state = LifecycleState::Closed;
        self.notify.notify_waiters();
    }

    /// Wait until shutdown is complete
    pub(crate) async fn closed(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.state() == LifecycleState::Closed {
                return;
            }

            notified.await;
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        self.lock().state
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().lines.len()
    }
}
