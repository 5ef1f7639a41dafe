use tokio::net::TcpListener;

/// Fixture server for exercising fetch hosts by hand.
///
/// `HOST` and `PORT` pick the bind address (default `127.0.0.1:3000`).
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    let addr = listener.local_addr()?;
    println!("listening on http://{addr} (routes: /echo, /status/{{code}}, /redirect, /text)");
    mock_server::run(listener).await
}
