use crate::config::{Config, ServerConfig};
use crate::routing::{Engine, Router};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// HTTP/1 server for an [`Engine`]
///
/// # Example
///
/// ```rust,no_run
/// use satchel::{Container, Engine, Router, Server};
/// use std::sync::Arc;
///
/// # async fn run() -> std::io::Result<()> {
/// let container = Arc::new(Container::new());
/// container.add_singleton(Arc::new(Engine::new())).unwrap();
/// let router = Router::new(container).unwrap();
///
/// Server::from_config(&router)
///     .port(3000)
///     .run_with_shutdown(async {
///         let _ = tokio::signal::ctrl_c().await;
///     })
///     .await
/// # }
/// ```
pub struct Server {
    engine: Arc<Engine>,
    host: String,
    port: u16,
}

impl Server {
    pub fn new(router: &Router) -> Self {
        Self {
            engine: router.engine().clone(),
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }

    /// Create a server listening on the configured [`ServerConfig`] address
    pub fn from_config(router: &Router) -> Self {
        let config = Config::get::<ServerConfig>().unwrap_or_else(ServerConfig::from_env);
        Self {
            engine: router.engine().clone(),
            host: config.host,
            port: config.port,
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The `host:port` address the server binds
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn run(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr()).await?;
        serve(self.engine, listener, signal).await
    }
}

/// Accept connections on `listener` until `signal` resolves
///
/// Each connection is served on its own task. After the signal no new
/// connections are accepted; connections already accepted run to completion.
pub async fn serve<F>(engine: Arc<Engine>, listener: TcpListener, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    tracing::info!("Satchel server running on http://{}", addr);

    tokio::pin!(signal);
    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut signal => {
                tracing::info!(%addr, "shutdown signal received, no longer accepting connections");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::error!(error = %err, "failed to accept connection");
                    continue;
                }
            },
        };

        let io = TokioIo::new(stream);
        let engine = engine.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: hyper::Request<Incoming>| {
                let engine = engine.clone();
                async move { Ok::<_, Infallible>(engine.handle(req).await) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, error = %err, "error serving connection");
            }
        });
    }
}
