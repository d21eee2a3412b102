//! Handler Registry
//!
//! Maps each command to the specialized handler that answers it. The map is
//! built once at startup from a closed list of handlers and is read-only
//! afterwards, so lookups from many connection tasks need no locking.
//!
//! Two handlers claiming the same command is a configuration error: the
//! build fails instead of letting the later handler win.

use crate::commands::command::RedisCommand;
use crate::commands::handler::CommandHandler;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while building a registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command {command} is claimed by both '{existing}' and '{rejected}'")]
    DuplicateCommand {
        command: RedisCommand,
        existing: &'static str,
        rejected: &'static str,
    },
}

/// Immutable command → handler map.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<RedisCommand, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    /// Builds a registry from a fixed list of handlers.
    ///
    /// # Example
    ///
    /// ```
    /// use flashbridge::commands::{ConnectionCommandHandler, HandlerRegistry, RedisCommand};
    /// use std::sync::Arc;
    ///
    /// let registry = HandlerRegistry::new(vec![Arc::new(ConnectionCommandHandler::new())]).unwrap();
    /// assert!(registry.lookup(RedisCommand::Ping).is_some());
    /// assert!(registry.lookup(RedisCommand::Get).is_none());
    /// ```
    pub fn new(handlers: Vec<Arc<dyn CommandHandler>>) -> Result<Self, RegistryError> {
        handlers
            .into_iter()
            .try_fold(RegistryBuilder::default(), RegistryBuilder::register)
            .map(RegistryBuilder::build)
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The registry with every built-in specialized handler.
    pub fn with_builtin_handlers() -> Result<Self, RegistryError> {
        Self::new(vec![Arc::new(
            crate::commands::connection::ConnectionCommandHandler::new(),
        )])
    }

    /// Returns the handler for `command`, if one was registered.
    pub fn lookup(&self, command: RedisCommand) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(&command).cloned()
    }

    pub fn contains(&self, command: RedisCommand) -> bool {
        self.handlers.contains_key(&command)
    }

    /// Number of commands with a specialized handler.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self
            .handlers
            .iter()
            .map(|(cmd, handler)| (cmd.name(), handler.name()))
            .collect();
        entries.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &entries)
            .finish()
    }
}

/// Accumulates registrations until [`RegistryBuilder::build`].
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<RedisCommand, Arc<dyn CommandHandler>>,
}

impl RegistryBuilder {
    /// Adds `handler` under every command it supports.
    ///
    /// Nothing is inserted if any of its commands is already taken.
    pub fn register(mut self, handler: Arc<dyn CommandHandler>) -> Result<Self, RegistryError> {
        let commands = handler.supported_commands();

        if let Some((command, existing)) = commands
            .iter()
            .find_map(|cmd| self.handlers.get(cmd).map(|h| (*cmd, h.name())))
        {
            return Err(RegistryError::DuplicateCommand {
                command,
                existing,
                rejected: handler.name(),
            });
        }

        for command in commands {
            self.handlers.insert(*command, Arc::clone(&handler));
        }

        debug!(handler = handler.name(), commands = ?commands, "Added command handler");
        Ok(self)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::connection::ConnectionCommandHandler;
    use crate::commands::handler::HandlerError;
    use crate::commands::message::RedisMessage;
    use async_trait::async_trait;

    struct StaticHandler {
        name: &'static str,
        commands: &'static [RedisCommand],
    }

    #[async_trait]
    impl CommandHandler for StaticHandler {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supported_commands(&self) -> &'static [RedisCommand] {
            self.commands
        }

        async fn handle(&self, message: RedisMessage) -> Result<RedisMessage, HandlerError> {
            Ok(message)
        }
    }

    #[test]
    fn test_lookup_hits_every_supported_command() {
        let strings: Arc<dyn CommandHandler> = Arc::new(StaticHandler {
            name: "strings",
            commands: &[RedisCommand::Append, RedisCommand::Strlen],
        });
        let registry = HandlerRegistry::builder()
            .register(Arc::new(ConnectionCommandHandler::new()))
            .and_then(|b| b.register(Arc::clone(&strings)))
            .unwrap()
            .build();

        for cmd in [RedisCommand::Ping, RedisCommand::Echo, RedisCommand::Quit] {
            assert_eq!(registry.lookup(cmd).unwrap().name(), "connection");
        }
        for cmd in [RedisCommand::Append, RedisCommand::Strlen] {
            assert!(Arc::ptr_eq(&registry.lookup(cmd).unwrap(), &strings));
        }
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_lookup_misses_unclaimed_commands() {
        let registry = HandlerRegistry::with_builtin_handlers().unwrap();
        for cmd in [RedisCommand::Get, RedisCommand::Set, RedisCommand::FlushDb] {
            assert!(registry.lookup(cmd).is_none());
            assert!(!registry.contains(cmd));
        }
    }

    #[test]
    fn test_duplicate_command_fails() {
        let result = HandlerRegistry::new(vec![
            Arc::new(ConnectionCommandHandler::new()),
            Arc::new(StaticHandler {
                name: "shadow",
                commands: &[RedisCommand::Get, RedisCommand::Echo],
            }),
        ]);

        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateCommand {
                command: RedisCommand::Echo,
                existing: "connection",
                rejected: "shadow",
            }
        );
    }

    #[test]
    fn test_same_handler_twice_fails() {
        let handler: Arc<dyn CommandHandler> = Arc::new(ConnectionCommandHandler::new());
        let result = HandlerRegistry::new(vec![Arc::clone(&handler), handler]);
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateCommand {
                command: RedisCommand::Ping,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_registry() {
        let registry = HandlerRegistry::new(Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.lookup(RedisCommand::Ping).is_none());
    }
}
