//! Sessions and connection lifecycle.
//!
//! The dispatcher only ever sees a [`Session`]: something already open that
//! can take a finished [`RedisMessage`]. Opening and closing connections is
//! the transport's business; anything that wants to hear about it installs
//! a [`ConnectionObserver`] on the transport.

use crate::commands::RedisMessage;
use crate::connection::handler::ConnectionError;
use crate::protocol::RespValue;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors handing a reply to a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The writer side is gone, the client has disconnected.
    #[error("session {0} is closed")]
    Closed(u64),
}

/// An open, bidirectional client channel.
pub trait Session: Send + Sync {
    /// Identifier of the underlying connection.
    fn id(&self) -> u64;

    /// Queues `message` for writing. Never waits for the write itself.
    fn send(&self, message: RedisMessage) -> Result<(), SessionError>;
}

/// Optional listener for connection establishment and teardown.
pub trait ConnectionObserver: Send + Sync {
    fn on_connected(&self, session_id: u64, addr: SocketAddr);

    fn on_disconnected(&self, session_id: u64, error: Option<&ConnectionError>);
}

/// What a connection's writer task receives.
#[derive(Debug)]
pub enum Outgoing {
    /// A dispatched message carrying its reply.
    Reply(RedisMessage),
    /// A request the transport refused before dispatch.
    Rejected(RespValue),
}

/// A session whose replies are drained by a connection's writer task.
#[derive(Debug, Clone)]
pub struct ChannelSession {
    id: u64,
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl ChannelSession {
    /// Creates a session and the receiver its writer should drain.
    pub fn new(id: u64) -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    /// Queues an error reply for a request that was never dispatched.
    pub fn reject(&self, reply: RespValue) -> Result<(), SessionError> {
        self.tx
            .send(Outgoing::Rejected(reply))
            .map_err(|_| SessionError::Closed(self.id))
    }
}

impl Session for ChannelSession {
    fn id(&self) -> u64 {
        self.id
    }

    fn send(&self, message: RedisMessage) -> Result<(), SessionError> {
        self.tx
            .send(Outgoing::Reply(message))
            .map_err(|_| SessionError::Closed(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::RedisCommand;

    #[tokio::test]
    async fn test_channel_session_delivers() {
        let (session, mut rx) = ChannelSession::new(4);
        assert_eq!(session.id(), 4);

        session
            .send(RedisMessage::new(RedisCommand::Ping, 4, Vec::new()))
            .unwrap();
        session.reject(RespValue::error("ERR nope")).unwrap();

        match rx.recv().await.unwrap() {
            Outgoing::Reply(message) => assert_eq!(message.command(), RedisCommand::Ping),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(rx.recv().await.unwrap(), Outgoing::Rejected(_)));
    }

    #[test]
    fn test_send_after_close_fails() {
        let (session, rx) = ChannelSession::new(5);
        drop(rx);

        let err = session
            .send(RedisMessage::new(RedisCommand::Ping, 5, Vec::new()))
            .unwrap_err();
        assert!(matches!(err, SessionError::Closed(5)));
    }
}
