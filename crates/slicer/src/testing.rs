//! Testing utilities for integration tests
//!
//! Provides an in-memory slicebot for exercising [`Slicer`] without a real
//! slicebot process.

use crate::client::Slicer;
use crate::config::ClientConfig;
use async_trait::async_trait;
use slicer_protocol::{LineFramer, RawReply, ReplyVerb, Request};
use slicer_transport::{Channel, ProcessControl};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

/// Size of each in-memory pipe
const PIPE_CAPACITY: usize = 64 * 1024;

/// What the mock does in response to one request
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Write a well-formed reply line
    Reply(RawReply),
    /// Write these bytes verbatim
    Raw(Vec<u8>),
    /// Write nothing; the command waits until the connection closes
    Silent,
    /// Close the mock's output, like slicebot exiting
    HangUp,
}

impl MockReply {
    /// `OK` with an empty payload
    pub fn ok() -> Self {
        Self::reply(ReplyVerb::Ok, "")
    }

    /// `ERROR` with a message
    pub fn error(message: impl Into<String>) -> Self {
        Self::reply(ReplyVerb::Error, message)
    }

    /// Any reply verb with a payload
    pub fn reply(verb: ReplyVerb, payload: impl Into<String>) -> Self {
        Self::Reply(RawReply::new(verb, payload))
    }
}

/// Something the mock observed or did, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// A complete request line arrived
    Received(Request),
    /// A reply to the given verb is about to be written
    Replied(String),
    /// A line that does not parse as a request
    Malformed(String),
}

/// Configuration for mock slicebot behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Pause before each reply, to widen race windows
    pub reply_delay: Option<Duration>,
}

/// Shared, ordered record of [`MockEvent`]s
#[derive(Debug, Clone, Default)]
pub struct MockLog {
    events: Arc<Mutex<Vec<MockEvent>>>,
    notify: Arc<Notify>,
}

impl MockLog {
    fn record(&self, event: MockEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        self.notify.notify_waiters();
    }

    /// Snapshot of every event so far
    pub fn events(&self) -> Vec<MockEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<Request> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MockEvent::Received(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `n` requests have arrived
    pub async fn wait_for_requests(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.requests().len() >= n {
                return;
            }

            notified.await;
        }
    }
}

type Handler = dyn Fn(&Request) -> MockReply + Send + Sync;

/// In-memory slicebot driven by a reply closure
///
/// Requests are read and logged as soon as they arrive, independently of
/// replying, so the log shows whether a client ever sent a request before the
/// previous reply went out.
///
/// # Example
///
/// ```
/// # #[tokio::main]
/// # async fn main() -> slicer::Result<()> {
/// use slicer::testing::{MockReply, MockSlicebot};
///
/// let (slicer, log) = MockSlicebot::new(|_| MockReply::ok()).connect();
/// assert!(slicer.load("graph.pdg").await?);
/// assert_eq!(log.requests()[0].args(), "graph.pdg");
/// slicer.close().await;
/// # Ok(())
/// # }
/// ```
pub struct MockSlicebot {
    handler: Arc<Handler>,
    config: MockConfig,
}

impl MockSlicebot {
    /// Create a mock answering each request with `handler`
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> MockReply + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            config: MockConfig::default(),
        }
    }

    /// Create a mock with custom configuration
    pub fn with_config<F>(config: MockConfig, handler: F) -> Self
    where
        F: Fn(&Request) -> MockReply + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            config,
        }
    }

    /// Start the mock and return the client's end of it
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> (Channel, MockLog) {
        // One pipe per direction, so the mock can close its output alone
        let (client_in, mock_in) = tokio::io::duplex(PIPE_CAPACITY);
        let (mock_out, client_out) = tokio::io::duplex(PIPE_CAPACITY);
        let log = MockLog::default();

        let (tx, rx) = mpsc::unbounded_channel();
        let listener = tokio::spawn(listen(mock_in, tx, log.clone()));
        let responder = tokio::spawn(respond(
            mock_out,
            rx,
            self.handler,
            self.config,
            log.clone(),
        ));

        let process = MockProcess {
            tasks: Some([listener, responder]),
        };
        (Channel::new(client_out, client_in, process), log)
    }

    /// Start the mock and connect a [`Slicer`] to it with default settings
    pub fn connect(self) -> (Slicer, MockLog) {
        let (channel, log) = self.start();
        (Slicer::with_channel(channel, &ClientConfig::default()), log)
    }
}

async fn listen(
    mut input: DuplexStream,
    tx: mpsc::UnboundedSender<Request>,
    log: MockLog,
) {
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; 4096];

    loop {
        let n = match input.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        for line in framer.feed(&buf[..n]) {
            let line = String::from_utf8_lossy(&line).into_owned();
            match Request::parse(&line) {
                Ok(request) => {
                    log.record(MockEvent::Received(request.clone()));
                    if tx.send(request).is_err() {
                        return;
                    }
                }
                Err(_) => log.record(MockEvent::Malformed(line)),
            }
        }
    }
}

async fn respond(
    mut output: DuplexStream,
    mut rx: mpsc::UnboundedReceiver<Request>,
    handler: Arc<Handler>,
    config: MockConfig,
    log: MockLog,
) {
    while let Some(request) = rx.recv().await {
        let bytes = match handler(&request) {
            MockReply::Reply(reply) => reply.to_line().into_bytes(),
            MockReply::Raw(bytes) => bytes,
            MockReply::Silent => continue,
            MockReply::HangUp => return,
        };

        if let Some(delay) = config.reply_delay {
            tokio::time::sleep(delay).await;
        }

        log.record(MockEvent::Replied(request.verb().to_string()));
        if output.write_all(&bytes).await.is_err() || output.flush().await.is_err() {
            return;
        }
    }
}

/// Process control for the mock: killing it stops both tasks
struct MockProcess {
    tasks: Option<[JoinHandle<()>; 2]>,
}

#[async_trait]
impl ProcessControl for MockProcess {
    async fn terminate(&mut self) -> slicer_transport::Result<()> {
        if let Some(tasks) = &self.tasks {
            for task in tasks {
                task.abort();
            }
        }
        Ok(())
    }

    async fn wait(&mut self) -> slicer_transport::Result<Option<i32>> {
        if let Some(tasks) = self.tasks.take() {
            for task in tasks {
                let _ = task.await;
            }
        }
        Ok(None)
    }
}

impl Drop for MockProcess {
    fn drop(&mut self) {
        if let Some(tasks) = &self.tasks {
            for task in tasks {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_protocol::Verb;

    #[tokio::test]
    async fn test_mock_logs_request_and_reply() {
        let (slicer, log) = MockSlicebot::new(|_| MockReply::ok()).connect();

        assert!(slicer.load("a b\nc").await.unwrap());
        assert_eq!(
            log.events(),
            vec![
                MockEvent::Received(Request::new(Verb::Load, "a b\nc").unwrap()),
                MockEvent::Replied("LOAD".to_string()),
            ]
        );

        slicer.close().await;
    }

    #[tokio::test]
    async fn test_mock_wait_for_requests() {
        let (slicer, log) = MockSlicebot::new(|_| MockReply::Silent).connect();
        let slicer = Arc::new(slicer);

        let pending = {
            let slicer = Arc::clone(&slicer);
            tokio::spawn(async move { slicer.load("x").await })
        };
        tokio::time::timeout(Duration::from_secs(5), log.wait_for_requests(1))
            .await
            .expect("request never arrived");

        slicer.close().await;
        assert!(pending.await.unwrap().is_err());
    }
}
