//! Connection lifecycle: startup and the shutdown race
//!
//! Either side may end a connection. The reader ends it when slicebot's
//! output closes; a caller ends it with [`Slicer::close`](crate::Slicer::close)
//! or by dropping the client. Whoever wins the `Open -> Closing` transition
//! kills and reaps the process; everyone else backs off.
//!
//! ```text
//!   Open ──begin_close()──▶ Closing ──terminate, [join reader], wait──▶ Closed
//! ```
//!
//! The reader never joins itself. A caller that wins joins the reader before
//! reaping so nothing touches the channel afterwards; a caller that loses
//! waits for `Closed`.

use crate::queue::{LifecycleState, LineQueue};
use crate::reader::read_loop;
use slicer_transport::{Channel, ChannelWriter, ProcessControl};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Who started a shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Initiator {
    /// The background reader, on end of stream or read error
    Reader,
    /// A caller, through `close()` or a failed write
    Caller,
}

/// Shared state of one slicebot connection
pub(crate) struct Connection {
    pub(crate) queue: LineQueue,
    control: tokio::sync::Mutex<Box<dyn ProcessControl>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    pid: Option<u32>,
}

impl Connection {
    /// Split the channel and start the background reader
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn start(channel: Channel, read_chunk_size: usize) -> (Arc<Self>, ChannelWriter) {
        let pid = channel.id();
        let (reader, writer, control) = channel.into_parts();

        let connection = Arc::new(Self {
            queue: LineQueue::new(),
            control: tokio::sync::Mutex::new(control),
            reader: Mutex::new(None),
            pid,
        });

        let handle = tokio::spawn(read_loop(
            reader,
            Arc::clone(&connection),
            read_chunk_size,
        ));
        *connection
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        debug!(pid = ?pid, "Started slicebot reader");
        (connection, writer)
    }

    pub(crate) fn state(&self) -> LifecycleState {
        self.queue.state()
    }

    pub(crate) fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn take_reader(&self) -> Option<JoinHandle<()>> {
        self.reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Shut the connection down; idempotent
    pub(crate) async fn shutdown(&self, initiator: Initiator) {
        if !self.begin_shutdown() {
            match initiator {
                Initiator::Reader => debug!("Connection already closing, reader exiting"),
                Initiator::Caller => self.queue.closed().await,
            }
            return;
        }
        self.finish_shutdown(initiator).await;
    }

    /// Stop accepting commands without waiting for the process
    ///
    /// The caller that gets `true` back owns the rest of the shutdown and
    /// must follow up with [`finish_shutdown`](Self::finish_shutdown).
    pub(crate) fn begin_shutdown(&self) -> bool {
        self.queue.begin_close()
    }

    /// Kill, reap and mark `Closed`; only for whoever won `begin_shutdown`
    pub(crate) async fn finish_shutdown(&self, initiator: Initiator) {
        info!(initiator = ?initiator, pid = ?self.pid, "Closing slicebot connection");

        let mut control = self.control.lock().await;
        if let Err(e) = control.terminate().await {
            warn!(error = %e, "Failed to terminate slicebot");
        }

        if initiator == Initiator::Caller
            && let Some(handle) = self.take_reader()
            && let Err(e) = handle.await
            && e.is_panic()
        {
            warn!("slicebot reader task panicked");
        }

        match control.wait().await {
            Ok(code) => info!(initiator = ?initiator, exit_code = ?code, "slicebot exited"),
            Err(e) => warn!(error = %e, "Failed to reap slicebot"),
        }
        drop(control);

        self.queue.finish_close();
    }

    /// Synchronous teardown for `Drop`
    ///
    /// Aborts the reader so it releases the connection; the process itself is
    /// killed when its control handle is dropped with the connection.
    pub(crate) fn abandon(&self) {
        if self.queue.begin_close() {
            debug!(pid = ?self.pid, "Client dropped without close, abandoning slicebot");
        }
        if let Some(handle) = self.take_reader() {
            handle.abort();
        }
        // Nobody will reap the process now; release anyone waiting on close
        self.queue.finish_close();
    }
}
