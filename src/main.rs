//! FlashBridge - A Redis Protocol Bridge
//!
//! This is the main entry point for the FlashBridge server.
//! It wires the handler registry, the cache executor and the dispatcher
//! together, then accepts connections until Ctrl+C.

use clap::Parser;
use flashbridge::commands::HandlerRegistry;
use flashbridge::config::{Args, ServerConfig};
use flashbridge::connection::Server;
use flashbridge::dispatch::Dispatcher;
use flashbridge::storage::{StorageEngine, StorageExecutor};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &ServerConfig) {
    let timeout = match config.command_timeout {
        Some(limit) => format!("{} ms", limit.as_millis()),
        None => "disabled".to_string(),
    };

    println!(
        r#"
FlashBridge v{} - Redis Protocol Bridge
──────────────────────────────────────────────────────────────
Server started on {}
Command timeout: {}
Ordered replies: {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        flashbridge::VERSION,
        config.bind_address(),
        timeout,
        config.ordered_replies
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "flashbridge=info".into()),
        )
        .with_target(false)
        .init();

    // A command claimed twice is a wiring bug; refuse to start.
    let registry = HandlerRegistry::with_builtin_handlers()?;
    info!(commands = registry.len(), "Handler registry initialized");

    let storage = Arc::new(StorageEngine::new());
    let executor = Arc::new(StorageExecutor::new(Arc::clone(&storage)));
    let dispatcher = Arc::new(
        Dispatcher::new(registry, executor).with_command_timeout(config.command_timeout),
    );

    let server = Server::bind(&config, dispatcher).await?;
    let connections = server.stats();
    print_banner(&config);

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    };

    tokio::select! {
        _ = server.run() => {}
        _ = shutdown => {}
    }

    let stats = storage.stats();
    info!(
        connections = connections.connections_accepted.load(Ordering::Relaxed),
        commands = connections.commands_processed.load(Ordering::Relaxed),
        keys = stats.keys,
        gets = stats.get_ops,
        sets = stats.set_ops,
        dels = stats.del_ops,
        "Server shutdown complete"
    );
    Ok(())
}
