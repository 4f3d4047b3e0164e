//! The slicebot client

use crate::args::{self, EdgeFilter, SliceOptions};
use crate::config::ClientConfig;
use crate::error::{Result, SlicerError};
use crate::lifecycle::{Connection, Initiator};
use crate::queue::LifecycleState;
use slicer_protocol::{Candidate, Payload, RawReply, Record, ReplyVerb, Request, Verb};
use slicer_transport::{Channel, ChannelWriter, ProcessHandle};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// Client for one slicebot process
///
/// Commands run one at a time: each holds the command lock from writing its
/// request until its reply has been decoded, so replies can be matched to
/// commands purely by order. Concurrent callers are serialized, not broken.
///
/// A background task drains slicebot's output for the lifetime of the
/// client. If slicebot exits, the command waiting for a reply and every
/// command after it fail with [`SlicerError::Closed`].
///
/// # Example
///
/// ```no_run
/// # async fn run() -> slicer::Result<()> {
/// use slicer::{ClientConfig, Slicer};
///
/// let slicer = Slicer::spawn(ClientConfig::from_env()?).await?;
/// slicer.load("graphs/jdk.pdg").await?;
/// for candidate in slicer.candidates("java.util.Hash").await? {
///     println!("{} {}", candidate.count, candidate.label);
/// }
/// slicer.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Slicer {
    connection: Arc<Connection>,
    writer: Mutex<ChannelWriter>,
}

impl Slicer {
    /// Spawn slicebot and connect to it
    pub async fn spawn(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let channel = ProcessHandle::spawn(&config.process).await?;
        Ok(Self::with_channel(channel, &config))
    }

    /// Connect over an already established channel
    ///
    /// Starts the background reader, so this must run inside a tokio runtime.
    pub fn with_channel(channel: Channel, config: &ClientConfig) -> Self {
        let (connection, writer) = Connection::start(channel, config.read_chunk_size);
        Self {
            connection,
            writer: Mutex::new(writer),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.connection.state()
    }

    /// Whether the connection has stopped accepting commands
    pub fn is_closed(&self) -> bool {
        self.state() != LifecycleState::Open
    }

    /// OS process id of slicebot, if known
    pub fn pid(&self) -> Option<u32> {
        self.connection.pid()
    }

    /// Kill and reap slicebot
    ///
    /// Returns once the process has been reaped, even if slicebot's exit was
    /// noticed first by the background reader. Closing again is a no-op.
    pub async fn close(&self) {
        shut_down(&self.connection).await;
    }

    /// Send a request and decode its reply
    ///
    /// Lower-level than the typed methods: the reply shape follows from the
    /// request's verb.
    pub async fn execute(&self, request: Request) -> Result<Payload> {
        let mut writer = self.writer.lock().await;
        if self.connection.state() != LifecycleState::Open {
            return Err(SlicerError::Closed);
        }

        let verb = request.verb();
        let line = request.to_line();
        debug!(verb = %verb, bytes = line.len(), "Sending command");

        let mut in_flight = InFlight::new(&self.connection);
        if let Err(e) = writer.write(line.as_bytes()).await {
            if e.is_disconnect() {
                debug!(verb = %verb, error = %e, "slicebot stopped reading its input");
            } else {
                warn!(verb = %verb, error = %e, "Failed to write command to slicebot");
            }
            in_flight.finish();
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "Failed to close slicebot input");
            }
            shut_down(&self.connection).await;
            return Err(SlicerError::Closed);
        }
        in_flight.sent();

        let reply = self.connection.queue.pop().await;
        in_flight.finish();
        let reply = reply?;
        trace!(verb = %verb, bytes = reply.len(), "Received reply line");

        dispatch(verb, &reply)
    }

    /// `LOAD` a graph file
    pub async fn load(&self, path: &str) -> Result<bool> {
        self.ack(Verb::Load, path.to_string()).await
    }

    /// Labels starting with `prefix`, with their node counts
    pub async fn candidates(&self, prefix: &str) -> Result<Vec<Candidate>> {
        match self.run(Verb::Candidates, prefix.to_string()).await? {
            Payload::Candidates(rows) => Ok(rows),
            other => Err(shape_mismatch(&Verb::Candidates, &other)),
        }
    }

    /// Slice the graph around nodes whose label starts with `prefix`
    ///
    /// Returns slicebot's serialized forest without parsing it.
    pub async fn slice(&self, prefix: &str, options: &SliceOptions) -> Result<String> {
        self.text(Verb::Slice, args::slice(prefix, options)).await
    }

    /// Fetch one node's attributes
    pub async fn node(&self, id: u64) -> Result<Record> {
        self.record(Verb::Node, args::node(id)).await
    }

    /// Fetch the attributes of the edge from `u` to `v`
    pub async fn edge(&self, u: u64, v: u64) -> Result<Record> {
        self.record(Verb::Edge, args::edge(u, v)).await
    }

    /// Subgraph induced by `nodes`
    pub async fn sub_graph(&self, nodes: &[u64], filter: &EdgeFilter) -> Result<String> {
        self.text(Verb::Subgraph, args::sub_graph(nodes, filter))
            .await
    }

    /// Partition the graph by the attribute `attr`
    pub async fn partition(&self, attr: &str, filter: &EdgeFilter) -> Result<String> {
        self.text(Verb::Partition, args::partition(attr, filter))
            .await
    }

    /// Partition nodes matching `prefix` by the attribute `attr`
    pub async fn projected_partition(
        &self,
        prefix: &str,
        attr: &str,
        filter: &EdgeFilter,
    ) -> Result<String> {
        self.text(
            Verb::ProjectedPartition,
            args::projected_partition(prefix, attr, filter),
        )
        .await
    }

    /// Send an arbitrary verb with a raw argument string
    ///
    /// Succeeds when slicebot answers with the reply the verb expects (`OK`
    /// for verbs this client does not know).
    pub async fn command(&self, verb: &str, args: &str) -> Result<bool> {
        let request = Request::new(Verb::custom(verb)?, args)?;
        self.execute(request).await.map(|_| true)
    }

    async fn run(&self, verb: Verb, args: String) -> Result<Payload> {
        self.execute(Request::new(verb, args)?).await
    }

    async fn ack(&self, verb: Verb, args: String) -> Result<bool> {
        match self.run(verb.clone(), args).await? {
            Payload::Ack => Ok(true),
            other => Err(shape_mismatch(&verb, &other)),
        }
    }

    async fn text(&self, verb: Verb, args: String) -> Result<String> {
        match self.run(verb.clone(), args).await? {
            Payload::Text(text) => Ok(text),
            other => Err(shape_mismatch(&verb, &other)),
        }
    }

    async fn record(&self, verb: Verb, args: String) -> Result<Record> {
        match self.run(verb.clone(), args).await? {
            Payload::Record(record) => Ok(record),
            other => Err(shape_mismatch(&verb, &other)),
        }
    }
}

impl Drop for Slicer {
    fn drop(&mut self) {
        self.connection.abandon();
    }
}

impl std::fmt::Debug for Slicer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slicer")
            .field("pid", &self.pid())
            .field("state", &self.state())
            .finish()
    }
}

/// Match a reply line against the command that produced it
fn dispatch(verb: &Verb, line: &str) -> Result<Payload> {
    let reply = RawReply::parse(line)?;
    if reply.verb == ReplyVerb::Error {
        debug!(verb = %verb, message = %reply.payload, "slicebot reported an error");
        return Err(SlicerError::Remote(reply.payload));
    }

    let expected = verb.expected_reply();
    match expected.shape() {
        Some(shape) if reply.verb == expected => Ok(shape.decode(reply.payload)?),
        _ => Err(SlicerError::UnexpectedReply {
            command: verb.to_string(),
            reply: reply.verb.to_string(),
        }),
    }
}

fn shape_mismatch(verb: &Verb, payload: &Payload) -> SlicerError {
    SlicerError::UnexpectedReply {
        command: verb.to_string(),
        reply: format!("{:?}", payload),
    }
}

/// Run a caller-initiated shutdown to completion
///
/// The shutdown runs on its own task so that dropping the awaiting future
/// cannot leave the connection stuck in `Closing`.
async fn shut_down(connection: &Arc<Connection>) {
    let connection = Arc::clone(connection);
    if let Err(e) = tokio::spawn(async move { connection.shutdown(Initiator::Caller).await }).await
        && e.is_panic()
    {
        warn!("slicebot shutdown task panicked");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Writing,
    AwaitingReply,
    Done,
}

/// Keeps the request/reply pairing intact if a command future is dropped
///
/// Dropped mid-write, the stream may hold half a request, so the connection
/// is shut down. Dropped while awaiting the reply, the reply is marked stale
/// and the next command skips it.
struct InFlight<'a> {
    connection: &'a Arc<Connection>,
    phase: Phase,
}

impl<'a> InFlight<'a> {
    fn new(connection: &'a Arc<Connection>) -> Self {
        Self {
            connection,
            phase: Phase::Writing,
        }
    }

    fn sent(&mut self) {
        self.phase = Phase::AwaitingReply;
    }

    fn finish(&mut self) {
        self.phase = Phase::Done;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        match self.phase {
            Phase::Writing => {
                warn!("Command dropped while writing, closing slicebot connection");
                // Leave `Open` now: the next command must not append to a torn line
                if !self.connection.begin_shutdown() {
                    return;
                }
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        let connection = Arc::clone(self.connection);
                        handle.spawn(async move {
                            connection.finish_shutdown(Initiator::Caller).await
                        });
                    }
                    Err(_) => self.connection.abandon(),
                }
            }
            Phase::AwaitingReply => {
                debug!("Command dropped before its reply, marking reply stale");
                self.connection.queue.mark_stale();
            }
            Phase::Done => {}
        }
    }
}
