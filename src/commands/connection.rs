//! Connection commands: PING, ECHO and QUIT.
//!
//! These never touch the cache, so they are answered locally.

use crate::commands::command::RedisCommand;
use crate::commands::handler::{CommandHandler, HandlerError};
use crate::commands::message::RedisMessage;
use crate::protocol::RespValue;
use async_trait::async_trait;

const SUPPORTED: &[RedisCommand] = &[RedisCommand::Ping, RedisCommand::Echo, RedisCommand::Quit];

/// Answers connection-level commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConnectionCommandHandler;

impl ConnectionCommandHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandHandler for ConnectionCommandHandler {
    fn name(&self) -> &'static str {
        "connection"
    }

    fn supported_commands(&self) -> &'static [RedisCommand] {
        SUPPORTED
    }

    async fn handle(&self, mut message: RedisMessage) -> Result<RedisMessage, HandlerError> {
        let response = match message.command() {
            // PING [message]
            RedisCommand::Ping => match message.args().first() {
                Some(text) => RespValue::bulk_string(text.clone()),
                None => RespValue::pong(),
            },
            // ECHO message
            RedisCommand::Echo => match message.args().first() {
                Some(text) => RespValue::bulk_string(text.clone()),
                None => {
                    return Err(HandlerError::Failed("ECHO without a message".to_string()));
                }
            },
            // QUIT; the transport closes the connection once this is written
            RedisCommand::Quit => RespValue::ok(),
            other => {
                return Err(HandlerError::Unsupported {
                    handler: self.name(),
                    command: other,
                })
            }
        };

        message.set_response(response);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio_test::block_on;

    fn run(command: RedisCommand, args: &[&str]) -> Result<RedisMessage, HandlerError> {
        let args = args.iter().map(|s| Bytes::from(s.to_string())).collect();
        block_on(ConnectionCommandHandler::new().handle(RedisMessage::new(command, 1, args)))
    }

    #[test]
    fn test_ping() {
        let reply = run(RedisCommand::Ping, &[]).unwrap();
        assert_eq!(reply.response(), Some(&RespValue::pong()));

        let reply = run(RedisCommand::Ping, &["hello"]).unwrap();
        assert_eq!(reply.response(), Some(&RespValue::bulk_string("hello")));
    }

    #[test]
    fn test_echo() {
        let reply = run(RedisCommand::Echo, &["Ariz"]).unwrap();
        assert_eq!(reply.response(), Some(&RespValue::bulk_string("Ariz")));
        assert!(run(RedisCommand::Echo, &[]).is_err());
    }

    #[test]
    fn test_quit() {
        let reply = run(RedisCommand::Quit, &[]).unwrap();
        assert_eq!(reply.into_response(), Some(RespValue::ok()));
    }

    #[test]
    fn test_rejects_foreign_command() {
        let err = run(RedisCommand::Get, &["key"]).unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Unsupported {
                command: RedisCommand::Get,
                ..
            }
        ));
    }
}
