use mock_server::Credentials;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let credentials = Credentials {
        consumer_key: std::env::var("MOCK_CONSUMER_KEY").unwrap_or_else(|_| "ck_mock".to_string()),
        consumer_secret: std::env::var("MOCK_CONSUMER_SECRET").unwrap_or_else(|_| "cs_mock".to_string()),
    };
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, consumer_key = %credentials.consumer_key, "mock store listening");
    mock_server::run(listener, credentials).await
}
