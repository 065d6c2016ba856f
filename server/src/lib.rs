//! # Room Server Library
//!
//! Matchmaking and relay server for two-player puzzle duels. Players connect
//! over WebSocket, meet in a room identified by a short code, launch a game
//! together and then mirror their boards and chat through the server.
//!
//! The server never simulates a game. Each client runs its own engine and
//! pushes snapshots; the server only checks that they are well formed and
//! forwards them to the other member of the room.
//!
//! ## Architecture
//!
//! ### Single Event Loop
//! One task owns the connection registry and every room. Per-connection tasks
//! parse frames and forward them as [`network::ServerMessage`]s, so room state
//! needs no locks and events from one connection are handled in order.
//!
//! ### Level Loading
//! Reproduction games need a mosaic from an external provider. The fetch runs
//! in its own task and reports back to the loop, so a slow provider never
//! stalls other rooms.
//!
//! ## Module Organization
//!
//! - `client_manager`: connection registry with a capacity limit
//! - `room_manager`: room codes, membership, launch rules, idle reaping
//! - `relay`: chat stamping and board forwarding
//! - `level`: mosaic providers (HTTP or static file)
//! - `network`: WebSocket transport and the event loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::level::HttpMosaicProvider;
//! use server::network::{Server, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let provider = Arc::new(HttpMosaicProvider::new(
//!         "http://127.0.0.1:8000/api/getRandomMosaic",
//!         Some("secret".to_string()),
//!     ));
//!     let server = Server::new("127.0.0.1:3000", ServerConfig::default(), provider).await?;
//!     server.run().await
//! }
//! ```

pub mod client_manager;
pub mod level;
pub mod network;
pub mod relay;
pub mod room_manager;
