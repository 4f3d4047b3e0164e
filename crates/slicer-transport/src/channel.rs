//! Split duplex channel
//!
//! A [`Channel`] bundles a read half, a write half and the control handle of
//! its peer. [`Channel::into_parts`] separates them so each can be owned by a
//! different task.

use crate::error::{Result, TransportError};
use crate::traits::ProcessControl;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A connection to a peer process, not yet split
pub struct Channel {
    reader: ChannelReader,
    writer: ChannelWriter,
    control: Box<dyn ProcessControl>,
}

impl Channel {
    /// Assemble a channel from raw halves and a control handle
    ///
    /// `reader` is the peer's output, `writer` the peer's input.
    pub fn new<R, W, C>(reader: R, writer: W, control: C) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
        C: ProcessControl + 'static,
    {
        Self {
            reader: ChannelReader::new(reader),
            writer: ChannelWriter::new(writer),
            control: Box::new(control),
        }
    }

    /// Peer process id, if the peer is an OS process
    pub fn id(&self) -> Option<u32> {
        self.control.id()
    }

    /// Split into independently owned parts
    pub fn into_parts(self) -> (ChannelReader, ChannelWriter, Box<dyn ProcessControl>) {
        (self.reader, self.writer, self.control)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").field("id", &self.id()).finish()
    }
}

/// Read half: chunked reads of the peer's output
pub struct ChannelReader {
    inner: Box<dyn AsyncRead + Send + Unpin>,
    buffer: Vec<u8>,
}

impl ChannelReader {
    /// Wrap a byte stream
    pub fn new<R>(inner: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            inner: Box::new(inner),
            buffer: Vec::new(),
        }
    }

    /// Read whatever is available, at most `max_bytes`
    ///
    /// Blocks until at least one byte arrives. Returns `Ok(None)` once the
    /// peer has closed its end.
    pub async fn read_chunk(&mut self, max_bytes: usize) -> Result<Option<&[u8]>> {
        self.buffer.resize(max_bytes.max(1), 0);
        let n = self.inner.read(&mut self.buffer).await?;
        if n == 0 {
            Ok(None)
        } else {
            Ok(Some(&self.buffer[..n]))
        }
    }
}

/// Write half: flushed writes to the peer's input
pub struct ChannelWriter {
    inner: Box<dyn AsyncWrite + Send + Unpin>,
    closed: bool,
}

impl ChannelWriter {
    /// Wrap a byte sink
    pub fn new<W>(inner: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            inner: Box::new(inner),
            closed: false,
        }
    }

    /// Write all of `bytes` and flush
    ///
    /// May block while the peer is not draining its input.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Close the peer's input. Further writes fail with [`TransportError::Closed`].
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.shutdown().await?;
        Ok(())
    }
}
