use clap::Parser;
use client::network::{Client, ClientOptions, Lobby};
use log::info;
use shared::GameId;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server WebSocket URL
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Name shown in chat
    #[arg(short = 'n', long, default_value = "player")]
    name: String,

    /// Open a new room on connect
    #[arg(short = 'c', long, conflicts_with = "join")]
    create: bool,

    /// Join the room with this code on connect
    #[arg(short = 'j', long)]
    join: Option<String>,

    /// Game to start once an opponent joins (reproduction or tetris)
    #[arg(short = 'l', long)]
    launch: Option<GameId>,

    /// Ignore keyboard input and let the countdown place every piece
    #[arg(short = 'a', long)]
    auto: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let lobby = match (args.create, args.join) {
        (true, _) => Lobby::Create,
        (false, Some(code)) => Lobby::Join(code.to_ascii_uppercase()),
        (false, None) => Lobby::Idle,
    };

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    if let Some(game_id) = args.launch {
        info!("Will launch {} when an opponent joins", game_id);
    }

    let client = Client::new(ClientOptions {
        server_url: args.server,
        name: args.name,
        lobby,
        launch: args.launch,
        auto: args.auto,
    });

    client.run().await?;

    Ok(())
}
