//! A decoded request travelling through the dispatch pipeline.

use crate::commands::command::RedisCommand;
use crate::protocol::RespValue;
use bytes::Bytes;
use thiserror::Error;

/// Longest command name echoed back in an unknown-command reply.
const MAX_ECHOED_NAME: usize = 128;

/// Errors turning a decoded argument list into a [`RedisMessage`].
///
/// Each variant maps to the reply Redis itself would send, and the
/// connection stays open.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(RedisCommand),
}

impl DecodeError {
    /// The error reply to write back to the client.
    pub fn to_reply(&self) -> RespValue {
        RespValue::error(self.to_string())
    }
}

/// One request/response cycle.
///
/// Created per inbound request, owned by the dispatch pipeline, and handed
/// to the session once its response slot is set.
#[derive(Debug, Clone, PartialEq)]
pub struct RedisMessage {
    command: RedisCommand,
    client_id: u64,
    args: Vec<Bytes>,
    response: Option<RespValue>,
}

impl RedisMessage {
    /// Creates a message for `command` with the given arguments.
    pub fn new(command: RedisCommand, client_id: u64, args: Vec<Bytes>) -> Self {
        Self {
            command,
            client_id,
            args,
            response: None,
        }
    }

    /// Builds a message from a decoded request (command name first).
    pub fn decode(mut frame: Vec<Bytes>, client_id: u64) -> Result<Self, DecodeError> {
        if frame.is_empty() {
            return Err(DecodeError::UnknownCommand(String::new()));
        }

        let args = frame.split_off(1);
        let name = &frame[0];
        let command = RedisCommand::from_name(name).ok_or_else(|| {
            let shown = &name[..name.len().min(MAX_ECHOED_NAME)];
            DecodeError::UnknownCommand(String::from_utf8_lossy(shown).into_owned())
        })?;

        if !command.arity().accepts(args.len()) {
            return Err(DecodeError::WrongArity(command));
        }

        Ok(Self::new(command, client_id, args))
    }

    /// A message that carries only an error reply.
    ///
    /// Used when the original message was consumed by a pipeline stage that
    /// failed before producing one.
    pub fn error_reply(command: RedisCommand, client_id: u64, message: &str) -> Self {
        let mut reply = Self::new(command, client_id, Vec::new());
        reply.set_response(RespValue::generic_error(message));
        reply
    }

    pub fn command(&self) -> RedisCommand {
        self.command
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    /// The first argument, which is the key for key-addressed commands.
    pub fn key(&self) -> Option<&Bytes> {
        self.args.first()
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    pub fn response(&self) -> Option<&RespValue> {
        self.response.as_ref()
    }

    /// Sets the response slot. A message is answered once.
    pub fn set_response(&mut self, response: RespValue) {
        debug_assert!(
            self.response.is_none(),
            "response already set for {}",
            self.command
        );
        self.response = Some(response);
    }

    /// Consumes the message, returning its response.
    pub fn into_response(self) -> Option<RespValue> {
        self.response
    }
}
