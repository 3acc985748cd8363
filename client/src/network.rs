use crate::config::ClientConfig;
use crate::console;
use crate::dispatch::{decode, dispatch};
use crate::error::ClientError;
use crate::game::{GameSession, View};
use crate::input::{CommandTable, UserAction};
use crate::typing;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ServerMessage};
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::TcpStream;
use tokio::time::{interval, interval_at, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type SocketWriteHandle = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type SocketReadHandle = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Maps a user-supplied server address onto a WebSocket URL.
///
/// `https://` becomes `wss://`, `http://` becomes `ws://`, a bare host gets `ws://`
/// and anything that already carries a scheme is left alone.
pub fn normalize_address(input: &str) -> String {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = input.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if input.contains("://") {
        input.to_string()
    } else {
        format!("ws://{}", input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

#[derive(Debug)]
pub enum InboundEvent {
    Message(ServerMessage),
    Closed,
}

/// One WebSocket connection to the game server. Never reconnects.
pub struct Connection {
    address: String,
    write: SocketWriteHandle,
    read: SocketReadHandle,
    state: ConnectionState,
}

impl Connection {
    pub async fn open(address: &str) -> Result<Self, ClientError> {
        let address = normalize_address(address);
        info!("Connecting to {}", address);

        let (stream, _response) =
            connect_async(address.as_str())
                .await
                .map_err(|source| ClientError::Transport {
                    address: address.clone(),
                    source,
                })?;
        let (write, read) = stream.split();
        info!("Connected to {}", address);

        Ok(Connection {
            address,
            write,
            read,
            state: ConnectionState::Open,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Fire-and-forget. Messages sent while not open are dropped, not queued.
    pub async fn send(&mut self, message: &ClientMessage) {
        if !self.is_open() {
            debug!("Dropping {:?}, connection not open", message);
            return;
        }
        let body = match message.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!("Could not encode {:?}: {}", message, e);
                return;
            }
        };
        if let Err(e) = self.write.send(Message::Text(body)).await {
            warn!("Send failed, closing connection: {}", e);
            self.state = ConnectionState::Closed;
        }
    }

    /// Waits for the next server message this client understands. Frames that
    /// fail to decode or carry an unknown type are skipped.
    pub async fn next_event(&mut self) -> InboundEvent {
        while self.is_open() {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => match decode(&text) {
                    Some(ServerMessage::Unknown) => debug!("Skipping unknown message type"),
                    Some(message) => return InboundEvent::Message(message),
                    None => {}
                },
                Some(Ok(Message::Close(frame))) => {
                    info!("Server closed connection: {:?}", frame);
                    self.state = ConnectionState::Closed;
                }
                Some(Ok(other)) => debug!("Ignoring non-text frame: {:?}", other),
                Some(Err(e)) => {
                    warn!("Connection error: {}", e);
                    self.state = ConnectionState::Closed;
                }
                None => {
                    info!("Connection stream ended");
                    self.state = ConnectionState::Closed;
                }
            }
        }
        InboundEvent::Closed
    }

    pub async fn close(&mut self) {
        if self.is_open() {
            let _ = self.write.send(Message::Close(None)).await;
            self.state = ConnectionState::Closed;
        }
    }
}

/// Top-level controller: owns the connection and the game session and feeds
/// them from one event loop.
pub struct Client {
    connection: Connection,
    game: GameSession,
    config: ClientConfig,
    commands: CommandTable,
    last_view: Option<View>,
}

impl Client {
    pub async fn new(server_addr: &str, config: ClientConfig) -> Result<Self, ClientError> {
        let connection = Connection::open(server_addr).await?;

        Ok(Client {
            connection,
            game: GameSession::new(config.clone()),
            config,
            commands: CommandTable::new(),
            last_view: None,
        })
    }

    pub fn game(&self) -> &GameSession {
        &self.game
    }

    pub async fn join(&mut self, room_id: &str, player_name: &str, timer_seconds: u32) {
        info!("Joining room {} as {}", room_id, player_name);
        self.game.join(room_id, player_name, timer_seconds);
        self.flush().await;
    }

    async fn flush(&mut self) {
        for message in self.game.drain_outbox() {
            self.connection.send(&message).await;
        }
    }

    /// Applies one user action. Returns false when the user asked to quit.
    fn handle_action(&mut self, action: UserAction, now: Instant) -> bool {
        match action {
            UserAction::SelectSpell(arg) => {
                let spell_id = self
                    .game
                    .game()
                    .map_or(arg.clone(), |game| console::resolve_spell(game, &arg));
                self.game.select_spell(&spell_id);
            }
            UserAction::SelectTarget(arg) => {
                let target_id = self
                    .game
                    .game()
                    .map_or(arg.clone(), |game| console::resolve_target(game, &arg));
                self.game.select_target(&target_id);
            }
            UserAction::Type(text) => {
                self.game.input_typing(&text, now);
                let typing = self.game.typing();
                if typing.is_active() {
                    println!("{}", console::render_typing(&typing.segments()));
                }
            }
            UserAction::Submit => {
                let typing = self.game.typing();
                let finished = typing::is_complete(typing.target(), typing.typed());
                self.game.submit_typing(finished, now);
            }
            UserAction::PlayAgain => {
                self.game.play_again();
            }
            UserAction::DismissError => self.game.dismiss_error(),
            UserAction::Help => println!("{}", console::HELP),
            UserAction::Unknown(command) => println!("Unknown command: {}", command),
            UserAction::Quit => return false,
        }
        true
    }

    fn present(&mut self) {
        let view = self.game.view(Instant::now());
        if console::should_present(self.last_view.as_ref(), &view) {
            println!("{}", console::render(&self.game, &view));
        }
        self.last_view = Some(view);
    }

    /// Runs until the user quits, `input` ends or the server goes away. Each
    /// line read from `input` is one user command.
    pub async fn run<R>(&mut self, input: R) -> Result<(), ClientError>
    where
        R: AsyncBufRead + Unpin,
    {
        let keepalive_period = self.config.keepalive_interval;
        let mut keepalive = interval_at(
            tokio::time::Instant::now() + keepalive_period,
            keepalive_period,
        );
        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut lines = input.lines();

        loop {
            tokio::select! {
                event = self.connection.next_event() => match event {
                    InboundEvent::Message(message) => {
                        dispatch(message, &mut self.game, Instant::now());
                    }
                    InboundEvent::Closed => {
                        self.game.connection_lost();
                        self.present();
                        return Err(ClientError::ConnectionLost);
                    }
                },

                line = lines.next_line() => match line? {
                    Some(line) => {
                        let action = self.commands.parse(&line);
                        if !self.handle_action(action, Instant::now()) {
                            info!("Leaving game");
                            self.connection.close().await;
                            return Ok(());
                        }
                    }
                    None => {
                        info!("Input closed, leaving game");
                        self.connection.close().await;
                        return Ok(());
                    }
                },

                _ = ticker.tick() => {
                    self.game.tick(Instant::now());
                },

                _ = keepalive.tick() => {
                    // Dropped silently by send() if the connection is no longer open.
                    self.connection.send(&ClientMessage::Ping).await;
                },
            }

            self.flush().await;
            self.present();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_host() {
        assert_eq!(normalize_address("example.com"), "ws://example.com");
        assert_eq!(normalize_address("localhost:8000"), "ws://localhost:8000");
    }

    #[test]
    fn test_normalize_http_schemes() {
        assert_eq!(normalize_address("https://example.com"), "wss://example.com");
        assert_eq!(normalize_address("http://example.com/ws"), "ws://example.com/ws");
    }

    #[test]
    fn test_normalize_keeps_ws_schemes() {
        assert_eq!(normalize_address("ws://x"), "ws://x");
        assert_eq!(normalize_address("wss://x:443"), "wss://x:443");
        assert_eq!(normalize_address("  ws://x  "), "ws://x");
    }
}
