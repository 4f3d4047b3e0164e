//! Process control trait
//!
//! The part of a channel that owns the peer's lifetime. Implemented by
//! [`ProcessHandle`](crate::ProcessHandle) for real subprocesses and by test
//! doubles that simulate one in memory.

use crate::error::Result;
use async_trait::async_trait;

/// Forceful termination and reaping of the peer process
///
/// Callers must always `wait` after `terminate`; skipping the wait leaves a
/// zombie behind.
#[async_trait]
pub trait ProcessControl: Send {
    /// Kill the peer. Calling this on an already dead peer is a no-op.
    async fn terminate(&mut self) -> Result<()>;

    /// Block until the peer has exited and reap it
    ///
    /// Returns the exit code, or `None` when the peer was killed by a signal
    /// or has no notion of an exit code.
    async fn wait(&mut self) -> Result<Option<i32>>;

    /// OS process id, if there is one
    fn id(&self) -> Option<u32> {
        None
    }
}
