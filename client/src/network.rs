use crate::game::ClientGameState;
use crate::input::{parse_command, Command, CommandError, HELP};
use crate::rendering::render_game;
use crate::timer::TurnTimer;
use futures_util::{Sink, SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::protocol::{ChatRequest, LaunchRequest};
use shared::{ClientEvent, GameId, ServerEvent, TimeoutOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// What the client does right after connecting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lobby {
    Create,
    Join(String),
    Idle,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub server_url: String,
    pub name: String,
    pub lobby: Lobby,
    /// Game the host launches once an opponent joins
    pub launch: Option<GameId>,
    /// Do not read commands; the countdown plays every turn
    pub auto: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Client {
    options: ClientOptions,
    game: ClientGameState,
    timer: TurnTimer,
    room_code: Option<String>,
    pending_join: Option<String>,
    is_host: bool,
    outbox: Vec<ClientEvent>,
}

impl Client {
    pub fn new(options: ClientOptions) -> Self {
        let mut client = Self {
            options,
            game: ClientGameState::new(),
            timer: TurnTimer::new(),
            room_code: None,
            pending_join: None,
            is_host: false,
            outbox: Vec::new(),
        };
        match client.options.lobby.clone() {
            Lobby::Create => client.queue(ClientEvent::CreateRoom),
            Lobby::Join(code) => client.join(code),
            Lobby::Idle => {}
        }
        client
    }

    pub fn room_code(&self) -> Option<&str> {
        self.room_code.as_deref()
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn game(&self) -> &ClientGameState {
        &self.game
    }

    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }

    /// Events waiting to be written to the socket
    pub fn take_outbox(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn queue(&mut self, event: ClientEvent) {
        self.outbox.push(event);
    }

    fn join(&mut self, code: String) {
        self.pending_join = Some(code.clone());
        self.queue(ClientEvent::JoinRoom(code));
    }

    fn redraw(&self) {
        println!("{}", render_game(&self.game, self.timer.remaining()));
    }

    pub fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::RoomCreated(code) => {
                println!("room {} created, waiting for an opponent", code);
                self.room_code = Some(code);
                self.is_host = true;
            }
            ServerEvent::PlayerJoined(message) => {
                println!("{}", message);
                // A successful join moves us out of any previous room
                if let Some(code) = self.pending_join.take() {
                    self.room_code = Some(code);
                    self.is_host = false;
                    self.game.clear_opponent();
                }
                if self.is_host {
                    if let (Some(game_id), Some(code)) = (self.options.launch, self.room_code.clone()) {
                        info!("Launching {} in room {}", game_id, code);
                        self.queue(ClientEvent::LaunchGame(LaunchRequest {
                            room_code: code,
                            game_id,
                        }));
                    }
                }
            }
            ServerEvent::PlayerLeft(message) => {
                println!("{}", message);
                self.game.clear_opponent();
                // The remaining member becomes host
                self.is_host = self.room_code.is_some();
            }
            ServerEvent::RoomClosed(message) => {
                println!("{}", message);
                self.room_code = None;
                self.is_host = false;
                self.game.clear_opponent();
            }
            ServerEvent::RoomError(message) => {
                println!("error: {}", message);
                self.pending_join = None;
            }
            ServerEvent::GameStarted(started) => {
                if !started.message.is_empty() {
                    println!("{}", started.message);
                }
                match self.game.start(started.game_id, started.level_data) {
                    Ok(()) => self.after_turn(),
                    Err(e) => warn!("Cannot start game: {}", e),
                }
            }
            ServerEvent::ReceiveTetrisState(envelope) => {
                if self.game.apply_opponent(envelope).is_ok() {
                    self.redraw();
                }
            }
            ServerEvent::ReceiveMessage(message) => {
                println!("[{}] {}", message.sender, message.content);
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Place(mv) => {
                if self.game.play(mv) {
                    self.after_turn();
                } else {
                    println!("cannot place there");
                }
            }
            Command::Rotate { slot } => {
                if self.game.rotate(slot) {
                    self.push_snapshot();
                    self.redraw();
                } else {
                    println!("nothing to rotate in slot {}", slot);
                }
            }
            Command::Say(content) => match self.room_code.clone() {
                Some(room_code) => self.queue(ClientEvent::SendMessage(ChatRequest {
                    room_code,
                    sender: self.options.name.clone(),
                    content,
                })),
                None => println!("join a room first"),
            },
            Command::Create => self.queue(ClientEvent::CreateRoom),
            Command::Join(code) => self.join(code),
            Command::Launch(game_id) => match self.room_code.clone() {
                Some(room_code) => self.queue(ClientEvent::LaunchGame(LaunchRequest {
                    room_code,
                    game_id,
                })),
                None => println!("join a room first"),
            },
            Command::Leave => {
                if self.room_code.take().is_some() {
                    self.queue(ClientEvent::LeaveRoom);
                    self.is_host = false;
                    self.game.clear_opponent();
                }
            }
            Command::Board => self.redraw(),
            Command::Help => println!("{}", HELP),
            Command::Quit => {
                if self.room_code.take().is_some() {
                    self.queue(ClientEvent::LeaveRoom);
                }
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Countdown for `turn` expired
    pub fn handle_timeout(&mut self, turn: u64) {
        match self.game.handle_timeout(turn) {
            TimeoutOutcome::Placed(mv) => {
                println!("time's up, piece placed at row {} col {}", mv.row, mv.col);
                self.after_turn();
            }
            TimeoutOutcome::Ignored => {
                debug!("No room for the current piece, waiting another turn");
                self.arm_timer();
            }
            TimeoutOutcome::Finished => {
                self.timer.disarm();
                self.push_snapshot();
                self.redraw();
            }
            TimeoutOutcome::Stale => {}
        }
    }

    fn arm_timer(&mut self) {
        match self.game.session() {
            Some(session) if session.is_active() => {
                self.timer.arm(session.turn(), session.turn_duration())
            }
            _ => self.timer.disarm(),
        }
    }

    fn after_turn(&mut self) {
        self.arm_timer();
        self.push_snapshot();
        self.redraw();
    }

    fn push_snapshot(&mut self) {
        let Some(room_code) = self.room_code.as_deref() else {
            return;
        };
        if let Some(envelope) = self.game.outgoing_snapshot(room_code) {
            self.queue(ClientEvent::SendTetrisState(envelope));
        }
    }

    /// Connects and runs until the player quits or the server goes away
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}", self.options.server_url);
        let (socket, _) = connect_async(self.options.server_url.as_str()).await?;
        let (mut sink, mut frames) = socket.split();
        info!("Connected");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut reading_stdin = !self.options.auto;
        if reading_stdin {
            println!("{}", HELP);
        }

        loop {
            for event in self.take_outbox() {
                send_event(&mut sink, &event).await?;
            }

            tokio::select! {
                frame = frames.next() => match frame {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => self.handle_server_event(event),
                        Err(e) => warn!("Malformed event from server: {}", e),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                },

                line = lines.next_line(), if reading_stdin => match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(command) => {
                            if self.handle_command(command) == Flow::Quit {
                                break;
                            }
                        }
                        Err(CommandError::Empty) => {}
                        Err(e) => println!("{}", e),
                    },
                    Ok(None) => reading_stdin = false,
                    Err(e) => {
                        warn!("Stopped reading commands: {}", e);
                        reading_stdin = false;
                    }
                },

                turn = self.timer.expired() => self.handle_timeout(turn),
            }
        }

        for event in self.take_outbox() {
            send_event(&mut sink, &event).await?;
        }
        sink.close().await?;
        Ok(())
    }
}

async fn send_event<S>(sink: &mut S, event: &ClientEvent) -> Result<(), Box<dyn std::error::Error>>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + 'static,
{
    let text = serde_json::to_string(event)?;
    sink.send(Message::Text(text)).await?;
    Ok(())
}
