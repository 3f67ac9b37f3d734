use std::sync::Arc;

use fileserver::FileServerApi;
use torrent::TorrentApi;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize qBittorrent API client
    let client = TorrentApi::new(&config.qbit_host, &config.qbit_username, &config.qbit_password);

    // Authenticate with qBittorrent
    if let Err(e) = client.login().await {
        tracing::error!("Failed to login to qBittorrent: {}", e);
        tracing::error!("Please check your credentials in the .env file");
        std::process::exit(1);
    }

    tracing::info!("qBittorrent client authenticated");

    let server = FileServerApi::new(Arc::new(client), config.accounts);
    if let Err(e) = server.serve(&config.host, config.port).await {
        tracing::error!("File server stopped: {}", e);
        std::process::exit(1);
    }
}
