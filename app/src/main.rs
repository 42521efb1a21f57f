use clap::Parser;
use satchel::{logging, Config, Container, Router, Server};
use std::path::Path;
use std::sync::Arc;

mod bootstrap;
mod controllers;
mod middleware;
mod routes;
mod services;

/// Demo API served through the satchel router
#[derive(Parser, Debug)]
#[command(name = "app", version)]
struct Args {
    /// Host to bind (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides SERVER_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let environment = Config::init(Path::new("."));
    logging::init();
    tracing::info!(%environment, "starting");

    let container = Arc::new(Container::new());
    bootstrap::register(&container)?;

    let router = Router::new(container)?;
    routes::register(&router);

    let mut server = Server::from_config(&router);
    if let Some(host) = args.host.as_deref() {
        server = server.host(host);
    }
    if let Some(port) = args.port {
        server = server.port(port);
    }

    server.run_with_shutdown(shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
