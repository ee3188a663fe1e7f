use axum::extract::ws::close_code;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

use crate::config::ConnectionConfig;
use crate::event::{EventBus, SessionEvent, Subscription};
use crate::game::GameplayError;
use crate::session::{ActivationGuard, Session, SessionError, SessionRegistry};
use crate::shared::AppState;

use super::messages::{ErrorMessage, GameStateMessage, MoveRequest};
use super::socket::{SocketError, SocketReceiver, SocketSender};
use super::throttle::Throttler;

pub const MAX_PLAYER_NAME_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid player name '{0}'")]
    InvalidPlayerName(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Sending a message took longer than {0:?}")]
    SendTimeout(Duration),

    #[error("No message received within {0:?}")]
    ReceiveTimeout(Duration),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Failed to encode message: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] SocketError),

    #[error("Session topic was closed")]
    TopicClosed,
}

impl ConnectionError {
    /// Errors that refuse the join itself; the client gets an error message
    /// and a normal close instead of an abnormal one.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ConnectionError::InvalidPlayerName(_) | ConnectionError::Session(_)
        )
    }
}

/// Player names are 1 to 10 word characters: letters, digits or underscores
/// from any script
pub fn validate_player_name(name: &str) -> Result<(), ConnectionError> {
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_PLAYER_NAME_LEN
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ConnectionError::InvalidPlayerName(name.to_string()))
    }
}

/// Everything a live connection holds on to. Fields drop in declaration
/// order: the player slot is freed before the topic membership.
struct ConnectionScope {
    guard: ActivationGuard,
    subscription: Subscription,
}

/// One player's duplex connection to a session
pub struct Connection {
    session_id: Uuid,
    player: String,
    registry: Arc<SessionRegistry>,
    event_bus: EventBus,
    config: ConnectionConfig,
}

impl Connection {
    pub fn new(state: &AppState, session_id: Uuid, player: impl Into<String>) -> Self {
        Self {
            session_id,
            player: player.into(),
            registry: Arc::clone(&state.registry),
            event_bus: state.event_bus.clone(),
            config: state.connection_config.clone(),
        }
    }

    /// Runs the connection until the client leaves or something fails.
    ///
    /// The player slot and the topic subscription are released before the
    /// closing frame goes out, whichever way the loops end.
    #[instrument(skip_all, fields(session_id = %self.session_id, player = %self.player))]
    pub async fn run<S, R>(self, mut sender: S, receiver: R)
    where
        S: SocketSender,
        R: SocketReceiver,
    {
        let mut scope = match self.open() {
            Ok(scope) => scope,
            Err(e) => return self.fail(&mut sender, e).await,
        };

        let topic = scope.subscription.topic().to_string();
        self.event_bus.publish(
            &topic,
            SessionEvent::PlayerJoined {
                player: self.player.clone(),
            },
        );
        info!("Player connected");

        let result = self.serve(&mut scope, &mut sender, receiver).await;
        drop(scope);

        // Peers must not keep showing this player as active
        self.event_bus.publish(
            &topic,
            SessionEvent::PlayerLeft {
                player: self.player.clone(),
            },
        );

        match result {
            Ok(()) => {
                info!("Player disconnected");
                self.close(&mut sender, close_code::NORMAL, String::new()).await;
            }
            Err(e) => self.fail(&mut sender, e).await,
        }
    }

    /// Ends the connection after `error`: rejected joins are told why and
    /// closed normally, everything else is closed as abnormal
    async fn fail<S: SocketSender>(&self, sender: &mut S, error: ConnectionError) {
        if error.is_rejection() {
            warn!(error = %error, "Join rejected");
            let message = ErrorMessage::new(error.to_string());
            if let Err(e) = self.send_json(sender, &message).await {
                debug!(error = %e, "Failed to deliver join rejection");
            }
            self.close(sender, close_code::NORMAL, String::new()).await;
            return;
        }

        match error {
            ConnectionError::SendTimeout(_) | ConnectionError::ReceiveTimeout(_) => {
                warn!(error = %error, "Connection timed out");
            }
            _ => error!(error = %error, "Connection failed"),
        }
        self.close(sender, close_code::AWAY, error.to_string()).await;
    }

    /// Validates the name, activates the player and subscribes to the session topic
    fn open(&self) -> Result<ConnectionScope, ConnectionError> {
        validate_player_name(&self.player)?;
        let session = self.registry.get(self.session_id)?;
        let guard = session.activate(&self.player)?;
        let subscription = self.event_bus.subscribe(&session.topic());
        Ok(ConnectionScope {
            guard,
            subscription,
        })
    }

    /// Runs the outbound and inbound loops until the first one finishes
    async fn serve<S, R>(
        &self,
        scope: &mut ConnectionScope,
        sender: &mut S,
        receiver: R,
    ) -> Result<(), ConnectionError>
    where
        S: SocketSender,
        R: SocketReceiver,
    {
        let ConnectionScope {
            guard,
            subscription,
        } = scope;
        let session = guard.session();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        tokio::select! {
            result = self.send_loop(session, subscription, notice_rx, sender) => result,
            result = self.receive_loop(session, receiver, notice_tx) => result,
        }
    }

    /// Renders a fresh view on every topic signal and forwards error notices
    async fn send_loop<S: SocketSender>(
        &self,
        session: &Session,
        subscription: &mut Subscription,
        mut notices: mpsc::UnboundedReceiver<String>,
        sender: &mut S,
    ) -> Result<(), ConnectionError> {
        loop {
            tokio::select! {
                event = subscription.next() => {
                    let event = event.ok_or(ConnectionError::TopicClosed)?;
                    trace!(event = event.event_type(), "Sending snapshot");
                    let view = GameStateMessage::for_player(&self.player, &session.snapshot());
                    self.send_json(sender, &view).await?;
                }
                Some(notice) = notices.recv() => {
                    self.send_json(sender, &ErrorMessage::new(notice)).await?;
                }
            }
        }
    }

    /// Reads throttled moves from the client and applies them to the game
    async fn receive_loop<R: SocketReceiver>(
        &self,
        session: &Session,
        mut receiver: R,
        notices: mpsc::UnboundedSender<String>,
    ) -> Result<(), ConnectionError> {
        let mut throttler = Throttler::new(self.config.throttle);

        loop {
            throttler.throttle().await;

            let message = timeout(self.config.receive_timeout, receiver.receive_message())
                .await
                .map_err(|_| ConnectionError::ReceiveTimeout(self.config.receive_timeout))??;
            let Some(text) = message else {
                debug!("Client closed the connection");
                return Ok(());
            };

            match self.handle_move(session, &text)? {
                Ok(request) => {
                    debug!(row = request.row, col = request.col, "Move applied");
                    self.event_bus.publish(
                        &session.topic(),
                        SessionEvent::MovePlayed {
                            player: self.player.clone(),
                            row: request.row,
                            col: request.col,
                        },
                    );
                }
                Err(e) => {
                    debug!(error = %e, "Move rejected");
                    // Only fails once the send loop is gone, and then select! is already done
                    let _ = notices.send(e.to_string());
                }
            }
        }
    }

    /// Outer error ends the connection, inner error goes back to the player
    fn handle_move(
        &self,
        session: &Session,
        text: &str,
    ) -> Result<Result<MoveRequest, GameplayError>, ConnectionError> {
        if !session.is_players_turn(&self.player) {
            return Ok(Err(GameplayError::NotPlayersTurn));
        }

        let request: MoveRequest = serde_json::from_str(text)
            .map_err(|e| ConnectionError::MalformedMessage(e.to_string()))?;

        Ok(session
            .play_move(&self.player, request.row, request.col)
            .map(|()| request))
    }

    async fn send_json<S, T>(&self, sender: &mut S, message: &T) -> Result<(), ConnectionError>
    where
        S: SocketSender,
        T: Serialize,
    {
        let text = serde_json::to_string(message)?;
        timeout(self.config.send_timeout, sender.send_message(text))
            .await
            .map_err(|_| ConnectionError::SendTimeout(self.config.send_timeout))??;
        Ok(())
    }

    async fn close<S: SocketSender>(&self, sender: &mut S, code: u16, reason: String) {
        match timeout(self.config.send_timeout, sender.close(code, reason)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Failed to send close frame"),
            Err(_) => debug!("Timed out sending close frame"),
        }
    }
}
