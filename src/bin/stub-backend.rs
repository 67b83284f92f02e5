//! Trivial backend for trying the load balancer by hand.
//!
//! ```text
//! stub-backend --port 6000 &
//! stub-backend --port 6001 &
//! lb-proxy --backends http://127.0.0.1:6000,http://127.0.0.1:6001
//! ```

use std::net::SocketAddr;

use axum::{routing::any, Router};
use clap::Parser;

#[derive(Parser)]
#[command(name = "stub-backend")]
#[command(about = "Answers every request with the port it listens on", long_about = None)]
struct Cli {
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let port = cli.port;

    let app = Router::new()
        .route("/", any(move || async move { format!("Hi from Server: {}\n", port) }))
        .route("/{*path}", any(move || async move { format!("Hi from Server: {}\n", port) }));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("Serve at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
