//! Server network layer: WebSocket connections and the room event loop

use crate::client_manager::{ClientManager, ConnectionId};
use crate::level::{level_for, LevelError, LevelProvider};
use crate::relay::{self, Delivery};
use crate::room_manager::{normalize_code, RoomError, RoomManager};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::protocol::{ChatRequest, GameStarted, LaunchRequest, LevelData};
use shared::{timestamp_millis, ClientEvent, GameId, ServerEvent, SnapshotEnvelope};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;
use tokio_tungstenite::tungstenite::Message;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Runtime limits of the room server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_clients: usize,
    /// Rooms without any activity for this long are closed
    pub room_ttl: Duration,
    /// How often idle rooms are looked for
    pub reap_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_clients: 256,
            room_ttl: Duration::from_secs(30 * 60),
            reap_interval: Duration::from_secs(60),
        }
    }
}

/// Messages sent from connection and level tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    ClientConnected {
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<ServerEvent>,
        reply: oneshot::Sender<Option<ConnectionId>>,
    },
    EventReceived {
        client_id: ConnectionId,
        event: ClientEvent,
    },
    ClientDisconnected {
        client_id: ConnectionId,
    },
    LevelReady {
        room_code: String,
        game_id: GameId,
        result: Result<LevelData, LevelError>,
    },
}

/// Room server. One loop owns every connection and room; connection tasks
/// only translate between WebSocket frames and [`ServerMessage`]s.
pub struct Server {
    listener: TcpListener,
    clients: ClientManager,
    rooms: RoomManager,
    provider: Arc<dyn LevelProvider>,
    config: ServerConfig,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        config: ServerConfig,
        provider: Arc<dyn LevelProvider>,
    ) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            clients: ClientManager::new(config.max_clients),
            rooms: RoomManager::new(),
            provider,
            config,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main server loop: accepts connections, dispatches events and reaps
    /// idle rooms. Runs until the process stops.
    pub async fn run(mut self) -> Result<(), BoxError> {
        let mut reap_interval = interval(self.config.reap_interval);

        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!("TCP connection from {}", addr);
                            tokio::spawn(handle_connection(stream, addr, self.server_tx.clone()));
                        }
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                },

                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = reap_interval.tick() => self.reap_idle_rooms(),
            }
        }

        Ok(())
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ClientConnected {
                addr,
                sender,
                reply,
            } => {
                let client_id = self.clients.add_client(addr, sender.clone());
                if client_id.is_none() {
                    warn!("Rejecting {}: server full", addr);
                    let _ = sender.send(ServerEvent::RoomError("server is full".to_string()));
                }
                let _ = reply.send(client_id);
            }
            ServerMessage::EventReceived { client_id, event } => {
                self.handle_event(client_id, event);
            }
            ServerMessage::ClientDisconnected { client_id } => {
                self.leave_current_room(client_id, "your opponent disconnected");
                self.clients.remove_client(&client_id);
            }
            ServerMessage::LevelReady {
                room_code,
                game_id,
                result,
            } => self.handle_level_ready(room_code, game_id, result),
        }
    }

    fn handle_event(&mut self, client_id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom => self.handle_create_room(client_id),
            ClientEvent::JoinRoom(code) => self.handle_join_room(client_id, &code),
            ClientEvent::LaunchGame(request) => self.handle_launch_game(client_id, request),
            ClientEvent::SendTetrisState(envelope) => self.handle_board(client_id, envelope),
            ClientEvent::SendMessage(request) => self.handle_chat(client_id, request),
            ClientEvent::LeaveRoom => {
                if self.leave_current_room(client_id, "your opponent left the room") {
                    self.clients.set_room(client_id, None);
                }
            }
        }
    }

    fn reject(&self, client_id: ConnectionId, error: RoomError) {
        debug!("Client {}: {}", client_id, error);
        self.clients
            .send_to(client_id, ServerEvent::RoomError(error.to_string()));
    }

    fn deliver(&self, delivery: Delivery) {
        self.clients.send_all(&delivery.targets, &delivery.event);
    }

    fn handle_create_room(&mut self, client_id: ConnectionId) {
        match self.rooms.create_room(client_id) {
            Ok(code) => {
                self.leave_current_room(client_id, "your opponent left the room");
                self.clients.set_room(client_id, Some(code.clone()));
                self.clients.send_to(client_id, ServerEvent::RoomCreated(code));
            }
            Err(e) => self.reject(client_id, e),
        }
    }

    fn handle_join_room(&mut self, client_id: ConnectionId, code: &str) {
        let code = normalize_code(code);
        match self.rooms.join_room(&code, client_id) {
            Ok(members) => {
                self.leave_current_room(client_id, "your opponent left the room");
                self.clients.set_room(client_id, Some(code.clone()));
                let event = ServerEvent::PlayerJoined(format!(
                    "player {} joined room {}",
                    members.len(),
                    code
                ));
                self.clients.send_all(&members, &event);
            }
            Err(e) => self.reject(client_id, e),
        }
    }

    fn handle_launch_game(&mut self, client_id: ConnectionId, request: LaunchRequest) {
        let game_id = request.game_id;
        let room_code = normalize_code(&request.room_code);
        if let Err(e) = self.rooms.launch_game(&room_code, client_id, game_id) {
            self.reject(client_id, e);
            return;
        }

        // The level fetch may be slow; it reports back through the loop
        let provider = Arc::clone(&self.provider);
        let server_tx = self.server_tx.clone();
        tokio::spawn(async move {
            let result = level_for(provider.as_ref(), game_id).await;
            if server_tx
                .send(ServerMessage::LevelReady {
                    room_code,
                    game_id,
                    result,
                })
                .is_err()
            {
                error!("Server loop gone before level was ready");
            }
        });
    }

    fn handle_level_ready(
        &mut self,
        room_code: String,
        game_id: GameId,
        result: Result<LevelData, LevelError>,
    ) {
        let level_data = match result {
            Ok(level_data) => level_data,
            Err(e) => {
                error!("Failed to load {} level for room {}: {}", game_id, room_code, e);
                return;
            }
        };
        let Some(room) = self.rooms.get(&room_code) else {
            debug!("Room {} closed before its level arrived", room_code);
            return;
        };

        info!("Starting {} in room {}", game_id, room_code);
        let event = ServerEvent::GameStarted(GameStarted {
            message: format!("{} is starting", game_id),
            game_id,
            level_data,
        });
        self.clients.send_all(&room.members, &event);
    }

    fn handle_board(&mut self, client_id: ConnectionId, envelope: SnapshotEnvelope) {
        let members = match self.rooms.members_for(&envelope.room_code, client_id) {
            Ok(members) => members,
            Err(e) => {
                warn!("Dropping board from client {}: {}", client_id, e);
                return;
            }
        };
        match relay::board(&members, client_id, envelope) {
            Ok(delivery) => self.deliver(delivery),
            Err(e) => warn!("Dropping malformed board from client {}: {}", client_id, e),
        }
    }

    fn handle_chat(&mut self, client_id: ConnectionId, request: ChatRequest) {
        match self.rooms.members_for(&request.room_code, client_id) {
            Ok(members) => self.deliver(relay::chat(members, request, timestamp_millis())),
            Err(e) => self.reject(client_id, e),
        }
    }

    /// Removes the client from its room, if any, and tells whoever remains.
    /// Returns true if the client was in a room.
    fn leave_current_room(&mut self, client_id: ConnectionId, notice: &str) -> bool {
        let Some(code) = self.clients.room_of(client_id).map(str::to_string) else {
            return false;
        };
        if let Some(departure) = self.rooms.leave_room(&code, client_id) {
            let event = ServerEvent::PlayerLeft(notice.to_string());
            self.clients.send_all(&departure.remaining, &event);
        }
        true
    }

    fn reap_idle_rooms(&mut self) {
        for room in self.rooms.reap_idle(self.config.room_ttl) {
            let event = ServerEvent::RoomClosed(format!("room {} closed after inactivity", room.code));
            for member in &room.members {
                self.clients.set_room(*member, None);
                self.clients.send_to(*member, event.clone());
            }
        }
    }
}

/// Serves one WebSocket connection until either side closes it
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (mut sink, mut frames) = socket.split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let (reply_tx, reply_rx) = oneshot::channel();

    let connected = ServerMessage::ClientConnected {
        addr,
        sender: event_tx,
        reply: reply_tx,
    };
    if server_tx.send(connected).is_err() {
        return;
    }
    let client_id = reply_rx.await.ok().flatten();

    // Outbound events keep their per-connection order
    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode event for {}: {}", addr, e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let Some(client_id) = client_id else {
        // The loop dropped its sender after queueing the rejection
        let _ = writer.await;
        return;
    };

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if server_tx
                        .send(ServerMessage::EventReceived { client_id, event })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => warn!("Malformed frame from client {}: {}", client_id, e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Connection error from client {}: {}", client_id, e);
                break;
            }
        }
    }

    let _ = server_tx.send(ServerMessage::ClientDisconnected { client_id });
}
