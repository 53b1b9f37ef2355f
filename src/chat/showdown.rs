//! Pokemon Showdown chat client.
//!
//! Showdown speaks a line-based protocol over a websocket. Every frame may contain several
//! lines, prefixed with `>roomid` when they belong to a room. Outbound messages are sent as
//! `roomid|text`.
use std::future::Future;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::Instrument;
use url::Url;

use crate::bot::event::BotEvent;
use crate::chat::{ChatClient, ChatMessage};

pub const DEFAULT_SERVER_URL: &str = "wss://sim3.psim.us/showdown/websocket";
pub const DEFAULT_LOGIN_URL: &str = "https://play.pokemonshowdown.com/action.php";

#[derive(thiserror::Error, Debug)]
pub enum ShowdownError {
    #[error("login request failed: {0}")]
    LoginRequest(#[from] reqwest::Error),
    #[error("login was rejected: {0}")]
    LoginRejected(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("connection was closed by the server")]
    Closed,
}

pub struct ShowdownConfig {
    pub server_url: Url,
    pub login_url: Url,
    pub nickname: String,
    /// Password of a registered nickname. Unregistered nicknames log in without one.
    pub password: Option<SecretString>,
    pub room: String,
    pub reconnect_delay: Duration,
}

/// Handle used to send lines to the configured room.
#[derive(Clone)]
pub struct ShowdownClient {
    room: String,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl ChatClient for ShowdownClient {
    async fn report(&self, text: &str) -> anyhow::Result<()> {
        self.outbound
            .send(format!("{}|{text}", self.room))
            .map_err(|_| anyhow!("Showdown connection has ended"))
    }
}

/// Creates a Showdown client together with a future that keeps the connection alive.
///
/// Chat lines posted in the room are forwarded to `events`. The future reconnects after
/// `reconnect_delay` whenever the connection drops, and ends once `events` is closed.
pub fn create_showdown_client(
    config: ShowdownConfig,
    events: mpsc::Sender<BotEvent>,
) -> (ShowdownClient, impl Future<Output = ()>) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let room = to_id(&config.room);
    let client = ShowdownClient {
        room: room.clone(),
        outbound: outbound_tx,
    };
    let connection = ShowdownConnection {
        room,
        config,
        http: reqwest::Client::new(),
        outbound: outbound_rx,
        events,
    };
    (client, connection.run())
}

struct ShowdownConnection {
    room: String,
    config: ShowdownConfig,
    http: reqwest::Client,
    outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::Sender<BotEvent>,
}

impl ShowdownConnection {
    async fn run(mut self) {
        loop {
            let span = tracing::info_span!("Showdown", room = %self.room);
            match self.run_session().instrument(span).await {
                Ok(()) => return,
                Err(error) => tracing::error!("Showdown connection failed: {error:?}"),
            }
            if self.events.is_closed() {
                return;
            }
            tracing::info!(
                "Reconnecting to Showdown in {}s",
                self.config.reconnect_delay.as_secs()
            );
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// Runs a single websocket session. Returns `Ok` only when the bot is shutting down.
    ///
    /// Outbound lines stay queued until the bot has logged in and joined the room.
    async fn run_session(&mut self) -> Result<(), ShowdownError> {
        let (socket, _) = connect_async(self.config.server_url.as_str()).await?;
        tracing::info!("Connected to {}", self.config.server_url);
        let (mut sink, mut stream) = socket.split();
        // Lines sent before the rename and join would be posted as a guest outside the room.
        let mut joined = false;

        loop {
            tokio::select! {
                frame = stream.next() => {
                    let Some(frame) = frame else {
                        return Err(ShowdownError::Closed);
                    };
                    let WsMessage::Text(frame) = frame? else {
                        continue;
                    };
                    for message in parse_frame(frame.as_str()) {
                        match message {
                            ServerMessage::Challenge(challenge) => {
                                let assertion = self.login(&challenge).await?;
                                let rename = format!("|/trn {},0,{assertion}", self.config.nickname);
                                sink.send(WsMessage::Text(rename.into())).await?;
                                let join = format!("|/join {}", self.room);
                                sink.send(WsMessage::Text(join.into())).await?;
                                joined = true;
                                tracing::info!("Logged in as {}", self.config.nickname);
                            }
                            ServerMessage::Chat { room, message } => {
                                if room != self.room
                                    || to_id(message.username()) == to_id(&self.config.nickname)
                                {
                                    continue;
                                }
                                if self.events.send(BotEvent::Chat(message)).await.is_err() {
                                    return Ok(());
                                }
                            }
                        }
                    }
                }
                line = self.outbound.recv(), if joined => {
                    let Some(line) = line else {
                        return Ok(());
                    };
                    sink.send(WsMessage::Text(line.into())).await?;
                }
            }
        }
    }

    /// Exchanges the challenge string for a signed assertion of the bot's identity.
    async fn login(&self, challenge: &str) -> Result<String, ShowdownError> {
        let request = match &self.config.password {
            Some(password) => self.http.post(self.config.login_url.clone()).form(&[
                ("act", "login"),
                ("name", self.config.nickname.as_str()),
                ("pass", password.expose_secret().as_str()),
                ("challstr", challenge),
            ]),
            None => self.http.post(self.config.login_url.clone()).form(&[
                ("act", "getassertion"),
                ("userid", to_id(&self.config.nickname).as_str()),
                ("challstr", challenge),
            ]),
        };
        let body = request.send().await?.error_for_status()?.text().await?;
        parse_login_response(&body)
    }
}

#[derive(Debug, PartialEq)]
enum ServerMessage {
    /// Challenge string needed to log in.
    Challenge(String),
    /// Chat line posted in a room.
    Chat { room: String, message: ChatMessage },
}

/// Parses the lines of a single websocket frame that are relevant to the bot.
fn parse_frame(frame: &str) -> Vec<ServerMessage> {
    let mut lines = frame.lines().peekable();
    let room = match lines.peek().and_then(|line| line.strip_prefix('>')) {
        Some(room) => {
            let room = room.to_string();
            lines.next();
            room
        }
        None => String::new(),
    };

    let lines: Vec<&str> = lines.collect();
    // A frame with `|init|` carries the backlog of a freshly joined room. Commands in it have
    // already been handled (or were never meant for us).
    let is_backlog = lines.iter().any(|line| line.starts_with("|init|"));

    lines
        .into_iter()
        .filter_map(|line| {
            if let Some(challenge) = line.strip_prefix("|challstr|") {
                return Some(ServerMessage::Challenge(challenge.to_string()));
            }
            if is_backlog {
                return None;
            }
            parse_chat_line(line).map(|message| ServerMessage::Chat {
                room: room.clone(),
                message,
            })
        })
        .collect()
}

fn parse_chat_line(line: &str) -> Option<ChatMessage> {
    let rest = line.strip_prefix('|')?;
    let (kind, rest) = rest.split_once('|')?;
    let (user, text) = match kind {
        "c" | "chat" => rest.split_once('|')?,
        "c:" => {
            let (_timestamp, rest) = rest.split_once('|')?;
            rest.split_once('|')?
        }
        _ => return None,
    };
    Some(ChatMessage::new(user, text))
}

#[derive(serde::Deserialize)]
struct LoginResponse {
    assertion: Option<String>,
}

/// Login responses are prefixed with `]` to prevent JSON hijacking. `getassertion` returns
/// the bare assertion instead of JSON.
fn parse_login_response(body: &str) -> Result<String, ShowdownError> {
    let assertion = match body.strip_prefix(']') {
        Some(json) => serde_json::from_str::<LoginResponse>(json)
            .map_err(|error| ShowdownError::LoginRejected(error.to_string()))?
            .assertion
            .unwrap_or_default(),
        None => body.trim().to_string(),
    };
    if assertion.is_empty() || assertion.starts_with(';') {
        return Err(ShowdownError::LoginRejected(assertion));
    }
    Ok(assertion)
}

/// Converts a name to the identifier form used by Showdown (lowercase alphanumeric).
pub fn to_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
