use clap::Parser;
use log::info;
use server::level::{HttpMosaicProvider, LevelProvider, StaticLevelProvider};
use server::network::{BoxError, Server, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the WebSocket listener to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value = "3000")]
    port: u16,

    /// Maximum number of concurrent connections
    #[arg(short = 'm', long, default_value = "256")]
    max_connections: usize,

    /// Close rooms idle for this many seconds
    #[arg(long, default_value = "1800")]
    room_ttl_secs: u64,

    /// Mosaic provider endpoint for reproduction games
    #[arg(long, default_value = "http://127.0.0.1:8000/api/getRandomMosaic")]
    mosaic_url: String,

    /// API key sent to the mosaic provider
    #[arg(long, env = "MOSAIC_API_KEY")]
    mosaic_api_key: Option<String>,

    /// Serve this mosaic JSON file instead of calling the provider
    #[arg(long)]
    mosaic_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let provider: Arc<dyn LevelProvider> = match &args.mosaic_file {
        Some(path) => {
            info!("Serving mosaic from {}", path.display());
            Arc::new(StaticLevelProvider::from_file(path).await?)
        }
        None => {
            info!("Fetching mosaics from {}", args.mosaic_url);
            Arc::new(HttpMosaicProvider::new(
                args.mosaic_url.clone(),
                args.mosaic_api_key.clone(),
            ))
        }
    };

    let config = ServerConfig {
        max_clients: args.max_connections,
        room_ttl: Duration::from_secs(args.room_ttl_secs),
        ..ServerConfig::default()
    };

    let addr = format!("{}:{}", args.host, args.port);
    info!("Starting room server on {}", addr);
    info!("Max connections: {}", args.max_connections);

    let server = Server::new(&addr, config, provider).await?;
    server.run().await
}
