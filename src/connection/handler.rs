//! Connection Handler Module
//!
//! Drives one client connection: reads and decodes requests, hands them to
//! the [`Dispatcher`], and writes replies back as they arrive.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned, socket split
//!        │
//!        ├──────────────────────────────────┐
//!        ▼                                  ▼
//! 3. ┌──────────────────────────────┐   ┌──────────────────────────┐
//!    │      Reader Loop             │   │      Writer Task         │
//!    │                              │   │                          │
//!    │  read bytes ─> decode        │   │  recv reply              │
//!    │       │                      │   │      │                   │
//!    │       ▼                      │   │      ▼                   │
//!    │  dispatcher.on_message() ────┼──>│  serialize + write       │
//!    │       │                      │   │      │                   │
//!    │  (await it when ordered)     │   │  flush when queue empty  │
//!    │       │                      │   │                          │
//!    │  [Loop back]                 │   │  [Loop back]             │
//!    └──────────────────────────────┘   └──────────────────────────┘
//!        │
//!        ▼
//! 4. QUIT / client disconnects / error
//!        │
//!        ▼
//! 5. Pending replies drained, socket shut down
//! ```
//!
//! ## Buffer Management
//!
//! We use a BytesMut buffer to accumulate incoming data. TCP is a stream
//! protocol, so a read may hold a partial request or several pipelined ones.

use crate::commands::{RedisCommand, RedisMessage};
use crate::config::ServerConfig;
use crate::connection::session::{ChannelSession, ConnectionObserver, Outgoing, Session};
use crate::dispatch::{Dispatcher, OPERATION_ERROR};
use crate::protocol::{ParseError, RequestParser, RespValue};
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Reply text when one request outgrows the read buffer limit.
pub const REQUEST_TOO_LARGE: &str = "Protocol error: request exceeds max buffer";

/// Source of session (and client) identifiers.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands dispatched
    pub commands_processed: AtomicU64,
    /// Requests refused before dispatch (unknown command, bad arity)
    pub commands_rejected: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_rejected(&self) {
        self.commands_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Per-connection settings taken from [`ServerConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Wait for each reply before decoding the next request.
    pub ordered_replies: bool,
    /// Maximum bytes buffered for one incomplete request.
    pub max_buffer: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ConnectionOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            ordered_replies: config.ordered_replies,
            max_buffer: config.max_buffer,
        }
    }
}

/// Handles a single client connection.
///
/// Owns the read half; the write half belongs to a writer task fed through
/// the connection's [`ChannelSession`].
pub struct ConnectionHandler {
    reader: OwnedReadHalf,
    writer: Option<BufWriter<OwnedWriteHalf>>,

    /// Client's address (for logging)
    addr: SocketAddr,

    session: Arc<ChannelSession>,
    outgoing: Option<mpsc::UnboundedReceiver<Outgoing>>,

    /// Buffer for incoming data
    buffer: BytesMut,

    parser: RequestParser,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<ConnectionStats>,
    options: ConnectionOptions,
    observer: Option<Arc<dyn ConnectionObserver>>,

    /// Dispatches not yet answered when replies may be reordered.
    in_flight: Vec<JoinHandle<()>>,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The TCP stream for this connection
    /// * `addr` - The client's socket address
    /// * `dispatcher` - The shared dispatcher
    /// * `stats` - Shared connection statistics
    /// * `options` - Ordering and buffer settings
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        dispatcher: Arc<Dispatcher>,
        stats: Arc<ConnectionStats>,
        options: ConnectionOptions,
    ) -> Self {
        stats.connection_opened();

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let (session, outgoing) = ChannelSession::new(id);
        let (reader, writer) = stream.into_split();

        Self {
            reader,
            writer: Some(BufWriter::new(writer)),
            addr,
            session: Arc::new(session),
            outgoing: Some(outgoing),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            parser: RequestParser::new(),
            dispatcher,
            stats,
            options,
            observer: None,
            in_flight: Vec::new(),
        }
    }

    /// Installs a listener for connect/disconnect notifications.
    pub fn with_observer(mut self, observer: Option<Arc<dyn ConnectionObserver>>) -> Self {
        self.observer = observer;
        self
    }

    /// Runs the connection until QUIT, disconnect, or an error.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        let id = self.session.id();
        info!(client = %self.addr, session = id, "Client connected");
        if let Some(observer) = &self.observer {
            observer.on_connected(id, self.addr);
        }

        let writer = self.spawn_writer();
        let mut result = self.read_loop().await;

        // Drop our sender so the writer stops once in-flight replies land.
        drop(self.session);
        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if result.is_ok() {
                    result = Err(e);
                }
            }
            Err(e) => error!(client = %self.addr, error = %e, "Writer task failed"),
        }

        match &result {
            Ok(()) => info!(client = %self.addr, session = id, "Client disconnected gracefully"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, session = id, "Client disconnected")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        if let Some(observer) = &self.observer {
            let error = match &result {
                Ok(()) | Err(ConnectionError::ClientDisconnected) => None,
                Err(e) => Some(e),
            };
            observer.on_disconnected(id, error);
        }
        self.stats.connection_closed();
        result
    }

    fn spawn_writer(&mut self) -> JoinHandle<Result<(), ConnectionError>> {
        let writer = self.writer.take();
        let outgoing = self.outgoing.take();
        let stats = Arc::clone(&self.stats);
        let addr = self.addr;

        tokio::spawn(async move {
            match (writer, outgoing) {
                (Some(writer), Some(outgoing)) => write_loop(writer, outgoing, stats, addr).await,
                _ => Ok(()),
            }
        })
    }

    /// The read-decode-dispatch loop. Returns `Ok` after QUIT.
    async fn read_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(frame) = self.try_parse_request()? {
                if self.handle_request(frame).await {
                    return Ok(());
                }
            }

            self.read_more_data().await?;
        }
    }

    /// Decodes and dispatches one request. Returns true once QUIT is answered.
    async fn handle_request(&mut self, frame: Vec<Bytes>) -> bool {
        let message = match RedisMessage::decode(frame, self.session.id()) {
            Ok(message) => message,
            Err(e) => {
                debug!(client = %self.addr, error = %e, "Rejected request");
                self.stats.command_rejected();
                self.reject(e.to_reply());
                return false;
            }
        };

        let command = message.command();
        let quit = command == RedisCommand::Quit;
        if quit {
            // The writer stops after the QUIT reply; earlier replies go first.
            self.drain_in_flight().await;
        }

        let session: Arc<dyn Session> = Arc::clone(&self.session) as Arc<dyn Session>;
        let pending = self.dispatcher.on_message(session, message);
        self.stats.command_processed();

        if self.options.ordered_replies || quit {
            if let Err(e) = pending.await {
                error!(client = %self.addr, %command, error = %e, "Dispatch task failed");
            }
        } else {
            self.in_flight.retain(|task| !task.is_finished());
            self.in_flight.push(pending);
        }

        quit
    }

    /// Waits for every unordered dispatch still running.
    async fn drain_in_flight(&mut self) {
        for task in std::mem::take(&mut self.in_flight) {
            if let Err(e) = task.await {
                error!(client = %self.addr, error = %e, "Dispatch task failed");
            }
        }
    }

    /// Queues an error reply for a request that is never dispatched.
    fn reject(&self, reply: RespValue) {
        if let Err(e) = self.session.reject(reply) {
            debug!(client = %self.addr, error = %e, "Dropping rejection");
        }
    }

    /// Attempts to decode a request from the buffer.
    fn try_parse_request(&mut self) -> Result<Option<Vec<Bytes>>, ConnectionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer) {
            Ok(Some((frame, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed request"
                );
                Ok(Some(frame))
            }
            Ok(None) => {
                trace!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "Incomplete request, need more data"
                );
                Ok(None)
            }
            Err(e) => {
                warn!(client = %self.addr, error = %e, "Parse error");
                self.reject(RespValue::generic_error(format!("Protocol error: {}", e)));
                Err(ConnectionError::ParseError(e))
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= self.options.max_buffer {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            self.reject(RespValue::generic_error(REQUEST_TOO_LARGE));
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.reader.read_buf(&mut self.buffer).await?;

        if n == 0 {
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }
}

/// Writes replies until every sender is gone or QUIT has been answered.
async fn write_loop(
    mut stream: BufWriter<OwnedWriteHalf>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    stats: Arc<ConnectionStats>,
    addr: SocketAddr,
) -> Result<(), ConnectionError> {
    let mut buf = Vec::with_capacity(INITIAL_BUFFER_SIZE);

    while let Some(item) = outgoing.recv().await {
        let quit = matches!(&item, Outgoing::Reply(m) if m.command() == RedisCommand::Quit);

        buf.clear();
        encode_reply(item, addr).serialize_into(&mut buf);
        stream.write_all(&buf).await?;
        stats.bytes_written(buf.len());
        trace!(client = %addr, bytes = buf.len(), "Queued response");

        // Coalesce pipelined replies into one flush.
        if quit || outgoing.is_empty() {
            stream.flush().await?;
        }
        if quit {
            break;
        }
    }

    stream.flush().await?;
    stream.shutdown().await?;
    Ok(())
}

fn encode_reply(item: Outgoing, addr: SocketAddr) -> RespValue {
    match item {
        Outgoing::Rejected(reply) => reply,
        Outgoing::Reply(message) => {
            let command = message.command();
            message.into_response().unwrap_or_else(|| {
                warn!(client = %addr, %command, "Reply sent without a response");
                RespValue::generic_error(OPERATION_ERROR)
            })
        }
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed request
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial request)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Handles a client connection.
///
/// Creates a [`ConnectionHandler`] and runs it to completion, logging
/// anything other than an ordinary disconnect.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<ConnectionStats>,
    options: ConnectionOptions,
    observer: Option<Arc<dyn ConnectionObserver>>,
) {
    let handler =
        ConnectionHandler::new(stream, addr, dispatcher, stats, options).with_observer(observer);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
