//! TCP accept loop.

use crate::config::ServerConfig;
use crate::connection::handler::{handle_connection, ConnectionOptions, ConnectionStats};
use crate::connection::session::ConnectionObserver;
use crate::dispatch::Dispatcher;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Listens for clients and spawns one connection task per socket.
pub struct Server {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<ConnectionStats>,
    options: ConnectionOptions,
    observer: Option<Arc<dyn ConnectionObserver>>,
}

impl Server {
    /// Binds to the configured address.
    pub async fn bind(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        info!(address = %listener.local_addr()?, "Listening");

        Ok(Self {
            listener,
            dispatcher,
            stats: Arc::new(ConnectionStats::new()),
            options: ConnectionOptions::from(config),
            observer: None,
        })
    }

    /// Installs a listener notified as clients come and go.
    pub fn with_observer(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until the surrounding task is dropped.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        error!(client = %addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    tokio::spawn(handle_connection(
                        stream,
                        addr,
                        Arc::clone(&self.dispatcher),
                        Arc::clone(&self.stats),
                        self.options,
                        self.observer.clone(),
                    ));
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::HandlerRegistry;
    use crate::connection::handler::REQUEST_TOO_LARGE;
    use crate::connection::ConnectionError;
    use crate::storage::{
        CacheCommand, CacheExecutor, CacheRequest, CacheResponse, ExecutorError, StorageEngine,
        StorageExecutor,
    };
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl ConnectionObserver for RecordingObserver {
        fn on_connected(&self, session_id: u64, _addr: SocketAddr) {
            self.events
                .lock()
                .unwrap()
                .push(format!("connected:{}", session_id));
        }

        fn on_disconnected(&self, session_id: u64, error: Option<&ConnectionError>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("disconnected:{}:{}", session_id, error.is_some()));
        }
    }

    /// Storage executor that answers GET only after a delay.
    struct SlowGetExecutor {
        inner: StorageExecutor,
        delay: Duration,
    }

    #[async_trait]
    impl CacheExecutor for SlowGetExecutor {
        async fn execute(&self, request: CacheRequest) -> Result<CacheResponse, ExecutorError> {
            if request.command == CacheCommand::Get {
                tokio::time::sleep(self.delay).await;
            }
            self.inner.execute(request).await
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            port: 0,
            ..ServerConfig::default()
        }
    }

    async fn create_test_server(
        observer: Option<Arc<dyn ConnectionObserver>>,
    ) -> (SocketAddr, Arc<StorageEngine>, Arc<ConnectionStats>) {
        let storage = Arc::new(StorageEngine::new());
        let executor = Arc::new(StorageExecutor::new(Arc::clone(&storage)));
        let (addr, stats) = start_server(test_config(), executor, observer).await;
        (addr, storage, stats)
    }

    async fn start_server(
        config: ServerConfig,
        executor: Arc<dyn CacheExecutor>,
        observer: Option<Arc<dyn ConnectionObserver>>,
    ) -> (SocketAddr, Arc<ConnectionStats>) {
        let dispatcher = Dispatcher::new(HandlerRegistry::with_builtin_handlers().unwrap(), executor);

        let mut server = Server::bind(&config, Arc::new(dispatcher)).await.unwrap();
        if let Some(observer) = observer {
            server = server.with_observer(observer);
        }
        let addr = server.local_addr().unwrap();
        let stats = server.stats();
        tokio::spawn(server.run());

        (addr, stats)
    }

    async fn create_unordered_server() -> SocketAddr {
        let config = ServerConfig {
            ordered_replies: false,
            ..test_config()
        };
        let executor = Arc::new(SlowGetExecutor {
            inner: StorageExecutor::new(Arc::new(StorageEngine::new())),
            delay: Duration::from_millis(200),
        });
        start_server(config, executor, None).await.0
    }

    async fn roundtrip(client: &mut TcpStream, request: &[u8], expected: &[u8]) {
        client.write_all(request).await.unwrap();
        let mut buf = vec![0u8; expected.len()];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(
            String::from_utf8_lossy(&buf),
            String::from_utf8_lossy(expected)
        );
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        roundtrip(&mut client, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;
        roundtrip(&mut client, b"PING hello\r\n", b"$5\r\nhello\r\n").await;
    }

    #[tokio::test]
    async fn test_set_get() {
        let (addr, storage, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        roundtrip(
            &mut client,
            b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$4\r\nAriz\r\n",
            b"+OK\r\n",
        )
        .await;
        roundtrip(
            &mut client,
            b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n",
            b"$4\r\nAriz\r\n",
        )
        .await;
        roundtrip(&mut client, b"*2\r\n$3\r\nGET\r\n$4\r\nnope\r\n", b"$-1\r\n").await;

        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_pipelined_replies_keep_order() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        roundtrip(
            &mut client,
            b"*3\r\n$3\r\nSET\r\n$2\r\nk1\r\n$2\r\nv1\r\n*3\r\n$3\r\nSET\r\n$2\r\nk2\r\n$2\r\nv2\r\n*2\r\n$3\r\nGET\r\n$2\r\nk1\r\n*3\r\n$3\r\nDEL\r\n$2\r\nk1\r\n$2\r\nk2\r\n*1\r\n$6\r\nDBSIZE\r\n",
            b"+OK\r\n+OK\r\n$2\r\nv1\r\n:2\r\n:0\r\n",
        )
        .await;
    }

    #[tokio::test]
    async fn test_rejected_requests_keep_connection_open() {
        let (addr, _, stats) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        roundtrip(
            &mut client,
            b"*1\r\n$7\r\nFOOBARZ\r\n",
            b"-ERR unknown command 'FOOBARZ'\r\n",
        )
        .await;
        roundtrip(
            &mut client,
            b"*1\r\n$3\r\nGET\r\n",
            b"-ERR wrong number of arguments for 'GET' command\r\n",
        )
        .await;
        roundtrip(&mut client, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;

        assert_eq!(stats.commands_rejected.load(Ordering::Relaxed), 2);
        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_unsupported_command() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        roundtrip(
            &mut client,
            b"*2\r\n$4\r\nINCR\r\n$1\r\nn\r\n",
            b"-ERR Unsupported operation!\r\n",
        )
        .await;
    }

    #[tokio::test]
    async fn test_quit_closes_after_reply() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        roundtrip(&mut client, b"*1\r\n$4\r\nQUIT\r\n", b"+OK\r\n").await;

        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_unordered_replies_may_overtake() {
        let addr = create_unordered_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        roundtrip(
            &mut client,
            b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n*1\r\n$4\r\nPING\r\n",
            b"+PONG\r\n$-1\r\n",
        )
        .await;
    }

    #[tokio::test]
    async fn test_unordered_quit_waits_for_earlier_replies() {
        let addr = create_unordered_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n*1\r\n$4\r\nQUIT\r\n")
            .await
            .unwrap();

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&reply), "$-1\r\n+OK\r\n");
    }

    #[tokio::test]
    async fn test_oversized_request_is_answered_before_close() {
        let config = ServerConfig {
            max_buffer: 1024,
            ..test_config()
        };
        let executor = Arc::new(StorageExecutor::new(Arc::new(StorageEngine::new())));
        let (addr, _) = start_server(config, executor, None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        let mut request = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$5000\r\n".to_vec();
        request.extend(std::iter::repeat(b'x').take(2000));
        client.write_all(&request).await.unwrap();

        let expected = format!("-ERR {}\r\n", REQUEST_TOO_LARGE);
        let mut reply = vec![0u8; expected.len()];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&reply), expected);
    }

    #[tokio::test]
    async fn test_protocol_error_closes_connection() {
        let (addr, _, _) = create_test_server(None).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*1\r\n+PING\r\n").await.unwrap();

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert!(reply.starts_with(b"-ERR Protocol error"));
    }

    #[tokio::test]
    async fn test_observer_and_stats() {
        let observer = Arc::new(RecordingObserver::default());
        let (addr, _, stats) =
            create_test_server(Some(Arc::clone(&observer) as Arc<dyn ConnectionObserver>)).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        roundtrip(&mut client, b"*1\r\n$4\r\nPING\r\n", b"+PONG\r\n").await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);

        drop(client);
        for _ in 0..50 {
            if stats.active_connections.load(Ordering::Relaxed) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
        assert!(stats.bytes_read.load(Ordering::Relaxed) > 0);
        assert!(stats.bytes_written.load(Ordering::Relaxed) > 0);

        let events = observer.events.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert!(events[0].starts_with("connected:"));
        assert!(events[1].starts_with("disconnected:"));
        assert!(events[1].ends_with(":false"));
    }
}
