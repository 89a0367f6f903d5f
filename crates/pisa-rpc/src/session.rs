//! Persistent websocket session to a balancer.
//!
//! The socket is owned by a driver task. Callers talk to it over a command
//! channel and observe its lifecycle through a watch channel, so a socket
//! that closes while nobody is waiting still leaves the session marked as
//! failed and the next `send` fails immediately.

use crate::envelope::BalanceRequest;
use crate::error::RpcError;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Reply = oneshot::Sender<Result<String, RpcError>>;

/// Configuration for a balancer session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Balancer endpoint (e.g., `ws://localhost:8080`).
    pub url: String,
    /// Upper bound on opening the socket.
    pub connect_timeout: Duration,
    /// Upper bound on one request/response round trip. `None` waits until
    /// the reply arrives or the transport fails.
    pub request_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

impl SessionConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Open, no request outstanding.
    Ready,
    /// Open, waiting on a reply.
    InFlight,
    /// Shutdown requested.
    Closing,
    /// Closed on request.
    Closed,
    /// Transport failed or closed underneath us. Terminal.
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

enum Command {
    Request { text: String, reply: Reply },
    Close,
}

/// One live connection to a balancer. At most one request is outstanding
/// at a time; a concurrent `send` fails with [`RpcError::RequestInFlight`].
///
/// Dropping the session closes the socket.
pub struct BalancerSession {
    url: String,
    request_timeout: Option<Duration>,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
    in_flight: Mutex<()>,
}

impl BalancerSession {
    /// Open a session. Resolves once the websocket handshake completes.
    pub async fn connect(config: &SessionConfig) -> Result<Self, RpcError> {
        log::debug!("connecting to balancer at {}", config.url);
        let (stream, _response) =
            tokio::time::timeout(config.connect_timeout, connect_async(config.url.as_str()))
                .await
                .map_err(|_| {
                    RpcError::Connection(format!(
                        "timed out after {:?} connecting to {}",
                        config.connect_timeout, config.url
                    ))
                })?
                .map_err(|e| RpcError::Connection(format!("{}: {}", config.url, e)))?;
        log::info!("balancer session open: {}", config.url);

        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(SessionState::Ready);
        tokio::spawn(drive(stream, cmd_rx, state_tx, config.url.clone()));

        Ok(Self {
            url: config.url.clone(),
            request_timeout: config.request_timeout,
            commands: cmd_tx,
            state: state_rx,
            in_flight: Mutex::new(()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_open(&self) -> bool {
        !matches!(
            self.state(),
            SessionState::Closing | SessionState::Closed | SessionState::Failed
        )
    }

    /// Send `request` and resolve with the raw text of the first reply.
    pub async fn send(&self, request: &BalanceRequest) -> Result<String, RpcError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| RpcError::RequestInFlight)?;
        if !self.is_open() {
            return Err(self.terminal_error());
        }

        let text = request.to_json()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Request {
                text,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.terminal_error())?;
        log::debug!(
            "sent {} request {}",
            request.request_type.request_type(),
            request.request_id
        );

        let reply = match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, reply_rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    log::warn!(
                        "request {} timed out after {:?}, closing session",
                        request.request_id,
                        limit
                    );
                    self.close().await;
                    return Err(RpcError::Timeout);
                }
            },
            None => reply_rx.await,
        };
        reply.map_err(|_| self.terminal_error())?
    }

    /// Close the session. Idempotent. A request still outstanding is
    /// rejected with [`RpcError::Closed`].
    pub async fn close(&self) {
        if self.state().is_terminal() {
            return;
        }
        // fails only if the driver already exited
        let _ = self.commands.send(Command::Close).await;
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| s.is_terminal()).await;
    }

    fn terminal_error(&self) -> RpcError {
        match self.state() {
            SessionState::Failed => RpcError::Connection("closed unexpectedly".into()),
            _ => RpcError::Closed,
        }
    }
}

// ─── Driver ─────────────────────────────────────────────────────────────────

async fn drive(
    mut ws: WsStream,
    mut commands: mpsc::Receiver<Command>,
    state: watch::Sender<SessionState>,
    url: String,
) {
    let mut pending: Option<Reply> = None;

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Command::Request { text, reply }) => {
                    if let Err(e) = ws.send(Message::Text(text)).await {
                        log::warn!("balancer send failed on {}: {}", url, e);
                        let _ = reply.send(Err(RpcError::Connection(format!("send failed: {}", e))));
                        state.send_replace(SessionState::Failed);
                        break;
                    }
                    pending = Some(reply);
                    state.send_replace(SessionState::InFlight);
                }
                // explicit close, or every handle dropped
                Some(Command::Close) | None => {
                    state.send_replace(SessionState::Closing);
                    if let Some(reply) = pending.take() {
                        let _ = reply.send(Err(RpcError::Closed));
                    }
                    if let Err(e) = ws.close(None).await {
                        log::debug!("close handshake on {}: {}", url, e);
                    }
                    log::info!("balancer session closed: {}", url);
                    state.send_replace(SessionState::Closed);
                    break;
                }
            },
            frame = ws.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => Ok(text),
                    Some(Ok(Message::Binary(bytes))) => String::from_utf8(bytes)
                        .map_err(|_| RpcError::Protocol("binary reply is not valid UTF-8".into())),
                    Some(Ok(Message::Close(_))) | None => {
                        fail(&mut pending, &state, &url, "closed unexpectedly".into());
                        break;
                    }
                    Some(Err(e)) => {
                        fail(&mut pending, &state, &url, format!("closed unexpectedly: {}", e));
                        break;
                    }
                    Some(Ok(_)) => continue,
                };
                match pending.take() {
                    Some(reply) => {
                        state.send_replace(SessionState::Ready);
                        let _ = reply.send(text);
                    }
                    None => log::warn!("discarding unsolicited message from {}", url),
                }
            }
        }
    }
}

fn fail(pending: &mut Option<Reply>, state: &watch::Sender<SessionState>, url: &str, reason: String) {
    log::warn!("balancer connection {} {}", url, reason);
    if let Some(reply) = pending.take() {
        let _ = reply.send(Err(RpcError::Connection(reason)));
    }
    state.send_replace(SessionState::Failed);
}
