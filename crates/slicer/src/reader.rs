//! Background reader loop
//!
//! Owns the read half of the channel for the lifetime of the connection and
//! keeps slicebot's stdout drained, whether or not a command is waiting.

use crate::lifecycle::{Connection, Initiator};
use slicer_protocol::LineFramer;
use slicer_transport::ChannelReader;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Read chunks, frame them into lines and queue the lines
///
/// End of stream and read errors are treated alike: the loop stops and
/// shuts the connection down. A broken pipe does not heal, so there is no
/// retry.
pub(crate) async fn read_loop(
    mut reader: ChannelReader,
    connection: Arc<Connection>,
    chunk_size: usize,
) {
    let mut framer = LineFramer::new();

    loop {
        let chunk = match reader.read_chunk(chunk_size).await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                debug!("slicebot closed its output");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read from slicebot");
                break;
            }
        };

        let mut queued = 0usize;
        for line in framer.feed(chunk) {
            connection
                .queue
                .push(String::from_utf8_lossy(&line).into_owned());
            queued += 1;
        }
        if queued > 0 {
            trace!(lines = queued, pending = framer.pending(), "Queued reply lines");
        }
    }

    // TODO: decide whether a dangling partial line at EOF should surface to
    // the waiting command instead of being dropped.
    if let Some(rest) = framer.finish() {
        warn!(
            bytes = rest.len(),
            "Discarding unterminated line at end of slicebot output"
        );
    }

    connection.shutdown(Initiator::Reader).await;
}
