//! # Game Client Library
//!
//! Terminal client for two-player puzzle duels. The client owns its whole
//! game: it runs the engine locally, enforces the turn countdown, and pushes
//! a snapshot of its board to the server after every change so the opponent
//! can watch.
//!
//! ## Module Organization
//!
//! - `game`: the local [`shared::GameSession`] plus the latest opponent board
//! - `input`: text command parsing
//! - `network`: WebSocket connection, lobby flow and the main `select!` loop
//! - `rendering`: boards, pieces and scores as plain text
//! - `timer`: the per-turn countdown, re-armed with each new turn
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, ClientOptions, Lobby};
//! use shared::GameId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientOptions {
//!         server_url: "ws://127.0.0.1:3000".to_string(),
//!         name: "ana".to_string(),
//!         lobby: Lobby::Create,
//!         launch: Some(GameId::BlockClear),
//!         auto: false,
//!     });
//!     client.run().await
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod timer;
