//! Single websocket connection to the token feed

use std::time::Duration;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use crate::shared::errors::ConnectionError;
use super::codec::{encode_subscription, Subscription};

type FeedSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection settings
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub channel: String,
    pub token: String,
    pub connect_timeout_ms: u64,
}

/// Lifecycle of the feed socket.
///
/// Nothing moves out of `Error` or `Disconnected` on its own; reconnecting is
/// up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Owns at most one live socket and its subscription
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: ConnectionState,
    writer: Option<SplitSink<FeedSocket, Message>>,
    reader: Option<SplitStream<FeedSocket>>,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
            writer: None,
            reader: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Opens the socket and sends the subscription handshake.
    ///
    /// Any previous socket is fully torn down first. A single attempt is made.
    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Disconnected || self.writer.is_some() || self.reader.is_some() {
            self.disconnect().await;
        }

        self.state = ConnectionState::Connecting;
        info!(endpoint = %self.config.endpoint, channel = %self.config.channel, "Connecting to token feed");

        let timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let socket = match tokio::time::timeout(timeout, connect_async(self.config.endpoint.as_str())).await {
            Ok(Ok((socket, _response))) => socket,
            Ok(Err(e)) => {
                self.state = ConnectionState::Error;
                error!(endpoint = %self.config.endpoint, error = %e, "Feed connection failed");
                return Err(ConnectionError::Connect {
                    endpoint: self.config.endpoint.clone(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                self.state = ConnectionState::Error;
                error!(endpoint = %self.config.endpoint, timeout_ms = self.config.connect_timeout_ms, "Feed connection timed out");
                return Err(ConnectionError::Timeout(self.config.connect_timeout_ms));
            }
        };

        let (mut writer, reader) = socket.split();
        let subscription = Subscription {
            channel: self.config.channel.clone(),
            token: self.config.token.clone(),
        };
        let handshake = encode_subscription(&subscription)
            .map_err(|e| ConnectionError::Handshake(e.to_string()));
        let sent = match handshake {
            Ok(payload) => writer
                .send(Message::Text(payload))
                .await
                .map_err(|e| ConnectionError::Handshake(e.to_string())),
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            self.state = ConnectionState::Error;
            error!(error = %e, "Subscription handshake failed");
            return Err(e);
        }

        self.writer = Some(writer);
        self.reader = Some(reader);
        self.state = ConnectionState::Connected;
        info!(endpoint = %self.config.endpoint, "Subscribed to token feed");
        Ok(())
    }

    /// Next text payload from the feed.
    ///
    /// `None` once the socket is closed or detached. Protocol-level ping/pong
    /// frames are skipped.
    pub async fn next_frame(&mut self) -> Option<Result<String, ConnectionError>> {
        loop {
            let reader = self.reader.as_mut()?;
            match reader.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        warn!("Dropping non UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Token feed closed by server");
                    self.reader = None;
                    self.state = ConnectionState::Disconnected;
                    return None;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    error!(error = %e, "Token feed socket error");
                    self.reader = None;
                    self.state = ConnectionState::Error;
                    return Some(Err(ConnectionError::Socket(e.to_string())));
                }
                None => {
                    self.reader = None;
                    self.state = ConnectionState::Disconnected;
                    return None;
                }
            }
        }
    }

    /// Detaches the reader, then closes the socket. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        let reader = self.reader.take();
        let writer = self.writer.take();
        if reader.is_none() && writer.is_none() {
            self.state = ConnectionState::Disconnected;
            return;
        }

        drop(reader);
        if let Some(mut writer) = writer {
            match tokio::time::timeout(CLOSE_TIMEOUT, writer.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "Socket close reported an error"),
                Err(_) => debug!("Socket close timed out"),
            }
        }

        self.state = ConnectionState::Disconnected;
        info!(endpoint = %self.config.endpoint, "Disconnected from token feed");
    }
}
