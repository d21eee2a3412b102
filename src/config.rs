//! Server configuration.
//!
//! [`ServerConfig`] is what the library consumes. The binary builds it from
//! command-line arguments and environment variables with `clap`.

use clap::Parser;
use std::time::Duration;

/// Default read buffer limit per connection (64 KB).
pub const DEFAULT_MAX_BUFFER: usize = 64 * 1024;

/// Runtime settings for the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bound on each handler/executor call. `None` waits forever.
    pub command_timeout: Option<Duration>,
    /// Serialize dispatch per session so replies keep request order.
    pub ordered_replies: bool,
    /// Maximum bytes buffered for one incomplete request.
    pub max_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            command_timeout: Some(crate::dispatch::DEFAULT_COMMAND_TIMEOUT),
            ordered_replies: true,
            max_buffer: DEFAULT_MAX_BUFFER,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Command-line arguments of the `flashbridge` binary.
#[derive(Debug, Parser)]
#[command(name = "flashbridge", version, about = "Redis protocol bridge")]
pub struct Args {
    /// Host to bind to
    #[arg(long, env = "FLASHBRIDGE_HOST", default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "FLASHBRIDGE_PORT", default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Per-command timeout in milliseconds (0 disables it)
    #[arg(long, env = "FLASHBRIDGE_COMMAND_TIMEOUT_MS", default_value_t = 5000)]
    pub command_timeout_ms: u64,

    /// Let replies on one connection complete out of request order
    #[arg(long, env = "FLASHBRIDGE_UNORDERED_REPLIES")]
    pub unordered_replies: bool,

    /// Maximum bytes buffered for one incomplete request
    #[arg(long, env = "FLASHBRIDGE_MAX_BUFFER", default_value_t = DEFAULT_MAX_BUFFER)]
    pub max_buffer: usize,
}

impl Args {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            command_timeout: match self.command_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            ordered_replies: !self.unordered_replies,
            max_buffer: self.max_buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_server_config() {
        let config = Args::parse_from(["flashbridge"]).into_config();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "127.0.0.1:6379");
    }

    #[test]
    fn test_overrides() {
        let config = Args::parse_from([
            "flashbridge",
            "--host",
            "0.0.0.0",
            "-p",
            "6380",
            "--command-timeout-ms",
            "0",
            "--unordered-replies",
        ])
        .into_config();

        assert_eq!(config.bind_address(), "0.0.0.0:6380");
        assert_eq!(config.command_timeout, None);
        assert!(!config.ordered_replies);
    }
}
