//! The closed set of commands recognised at the wire level.
//!
//! Every command the bridge understands has a variant here, whether it is
//! answered by a specialized handler, forwarded to the cache executor, or
//! recognised only to be refused.

use std::fmt;

/// Number of arguments a command takes, not counting the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    /// Returns true if `count` arguments satisfy this arity.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(min, max) => (min..=max).contains(&count),
        }
    }
}

/// A Redis command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedisCommand {
    // Connection
    Ping,
    Echo,
    Quit,

    // Strings and keys
    Get,
    Set,
    GetSet,
    Del,
    Exists,
    Append,
    Strlen,
    Incr,
    Decr,
    MGet,
    MSet,

    // Server
    DbSize,
    FlushDb,
}

impl RedisCommand {
    /// Every command, in declaration order.
    pub const ALL: &'static [RedisCommand] = &[
        RedisCommand::Ping,
        RedisCommand::Echo,
        RedisCommand::Quit,
        RedisCommand::Get,
        RedisCommand::Set,
        RedisCommand::GetSet,
        RedisCommand::Del,
        RedisCommand::Exists,
        RedisCommand::Append,
        RedisCommand::Strlen,
        RedisCommand::Incr,
        RedisCommand::Decr,
        RedisCommand::MGet,
        RedisCommand::MSet,
        RedisCommand::DbSize,
        RedisCommand::FlushDb,
    ];

    /// Looks up a command by name, ignoring ASCII case.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|cmd| cmd.name().as_bytes().eq_ignore_ascii_case(name))
    }

    /// The canonical upper-case command name.
    pub fn name(self) -> &'static str {
        match self {
            RedisCommand::Ping => "PING",
            RedisCommand::Echo => "ECHO",
            RedisCommand::Quit => "QUIT",
            RedisCommand::Get => "GET",
            RedisCommand::Set => "SET",
            RedisCommand::GetSet => "GETSET",
            RedisCommand::Del => "DEL",
            RedisCommand::Exists => "EXISTS",
            RedisCommand::Append => "APPEND",
            RedisCommand::Strlen => "STRLEN",
            RedisCommand::Incr => "INCR",
            RedisCommand::Decr => "DECR",
            RedisCommand::MGet => "MGET",
            RedisCommand::MSet => "MSET",
            RedisCommand::DbSize => "DBSIZE",
            RedisCommand::FlushDb => "FLUSHDB",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            RedisCommand::Ping => Arity::Range(0, 1),
            RedisCommand::Echo => Arity::Exact(1),
            RedisCommand::Quit => Arity::Exact(0),
            RedisCommand::Get => Arity::Exact(1),
            RedisCommand::Set => Arity::Exact(2),
            RedisCommand::GetSet => Arity::Exact(2),
            RedisCommand::Del => Arity::AtLeast(1),
            RedisCommand::Exists => Arity::AtLeast(1),
            RedisCommand::Append => Arity::Exact(2),
            RedisCommand::Strlen => Arity::Exact(1),
            RedisCommand::Incr => Arity::Exact(1),
            RedisCommand::Decr => Arity::Exact(1),
            RedisCommand::MGet => Arity::AtLeast(1),
            RedisCommand::MSet => Arity::AtLeast(2),
            RedisCommand::DbSize => Arity::Exact(0),
            RedisCommand::FlushDb => Arity::Exact(0),
        }
    }
}

impl fmt::Display for RedisCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(RedisCommand::from_name(b"get"), Some(RedisCommand::Get));
        assert_eq!(RedisCommand::from_name(b"GetSet"), Some(RedisCommand::GetSet));
        assert_eq!(RedisCommand::from_name(b"dbsize"), Some(RedisCommand::DbSize));
        assert_eq!(RedisCommand::from_name(b"HGETALL"), None);
        assert_eq!(RedisCommand::from_name(b""), None);
    }

    #[test]
    fn test_names_round_trip() {
        for cmd in RedisCommand::ALL {
            assert_eq!(RedisCommand::from_name(cmd.name().as_bytes()), Some(*cmd));
        }
    }

    #[test]
    fn test_arity() {
        assert!(RedisCommand::Ping.arity().accepts(0));
        assert!(RedisCommand::Ping.arity().accepts(1));
        assert!(!RedisCommand::Ping.arity().accepts(2));
        assert!(RedisCommand::Del.arity().accepts(3));
        assert!(!RedisCommand::Del.arity().accepts(0));
        assert!(!RedisCommand::Get.arity().accepts(2));
    }
}
