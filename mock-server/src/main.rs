use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    // A ready-to-use token so hosts can point at the server immediately.
    let token = mock_server::issue_token("usr-mock", &format!("http://{addr}"), Duration::from_secs(3600));
    tracing::info!(%token, "issued token for usr-mock");

    mock_server::run(listener).await
}
