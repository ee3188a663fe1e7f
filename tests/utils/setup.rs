#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use uuid::Uuid;

use tictactoe::{
    session::SessionConfig, AppState, Connection, ConnectionConfig, EventBus, Session,
    SessionRegistry,
};

use super::assertions::GameView;
use super::mocks::{MockReceiver, MockSender, Outbound, StalledSender};

/// Upper bound for anything a test waits on
pub const WAIT: Duration = Duration::from_secs(2);

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub session: Arc<Session>,
}

pub struct TestSetupBuilder {
    session_timeout: Duration,
    connection_config: ConnectionConfig,
    field_size: usize,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            session_timeout: Duration::from_secs(60),
            connection_config: ConnectionConfig {
                throttle: Duration::from_millis(5),
                ..ConnectionConfig::default()
            },
            field_size: 3,
        }
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.connection_config.send_timeout = timeout;
        self
    }

    pub fn with_field_size(mut self, field_size: usize) -> Self {
        self.field_size = field_size;
        self
    }

    pub fn build(self) -> TestSetup {
        let registry = Arc::new(SessionRegistry::new(self.session_timeout));
        let session = registry.create(SessionConfig {
            field_size: self.field_size,
        });
        let state = AppState::new(registry, EventBus::new(), self.connection_config);
        TestSetup { state, session }
    }
}

impl TestSetup {
    pub fn session_id(&self) -> Uuid {
        self.session.id()
    }

    /// Connects `player` to the session under test
    pub fn connect(&self, player: &str) -> TestClient {
        self.connect_to(self.session_id(), player)
    }

    pub fn connect_to(&self, session_id: Uuid, player: &str) -> TestClient {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let connection = Connection::new(&self.state, session_id, player);
        let handle = tokio::spawn(connection.run(MockSender::new(out_tx), MockReceiver::new(in_rx)));

        TestClient {
            name: player.to_string(),
            inbound: Some(in_tx),
            outbound: out_rx,
            handle,
        }
    }

    /// Connects a client that never reads what the server sends
    pub fn connect_stalled(&self, player: &str) -> TestClient {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let connection = Connection::new(&self.state, self.session_id(), player);
        let handle =
            tokio::spawn(connection.run(StalledSender::new(out_tx), MockReceiver::new(in_rx)));

        TestClient {
            name: player.to_string(),
            inbound: Some(in_tx),
            outbound: out_rx,
            handle,
        }
    }
}

/// The client side of one connection
pub struct TestClient {
    pub name: String,
    inbound: Option<mpsc::UnboundedSender<String>>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    handle: JoinHandle<()>,
}

impl TestClient {
    pub async fn next_message(&mut self) -> Outbound {
        timeout(WAIT, self.outbound.recv())
            .await
            .unwrap_or_else(|_| panic!("{} received nothing", self.name))
            .unwrap_or_else(|| panic!("{} connection is gone", self.name))
    }

    /// Waits for a game view, failing on anything else
    pub async fn next_view(&mut self) -> GameView {
        match self.next_message().await {
            Outbound::Text(text) => serde_json::from_str(&text)
                .unwrap_or_else(|e| panic!("{} got a non-view message {text}: {e}", self.name)),
            other => panic!("{} expected a view, got {other:?}", self.name),
        }
    }

    /// Skips views until one satisfies `predicate`
    pub async fn wait_for_view(&mut self, predicate: impl Fn(&GameView) -> bool) -> GameView {
        loop {
            let view = self.next_view().await;
            if predicate(&view) {
                return view;
            }
        }
    }

    /// Reads until the server goes quiet and returns the last view
    pub async fn latest_view(&mut self) -> GameView {
        let mut latest = self.next_view().await;
        while let Ok(Some(message)) =
            timeout(Duration::from_millis(100), self.outbound.recv()).await
        {
            match message {
                Outbound::Text(text) => latest = serde_json::from_str(&text).unwrap(),
                other => panic!("{} expected a view, got {other:?}", self.name),
            }
        }
        latest
    }

    /// Waits for an `{error}` message
    pub async fn next_error(&mut self) -> String {
        match self.next_message().await {
            Outbound::Text(text) => {
                let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                value["error"]
                    .as_str()
                    .unwrap_or_else(|| panic!("{} expected an error, got {text}", self.name))
                    .to_string()
            }
            other => panic!("{} expected an error, got {other:?}", self.name),
        }
    }

    /// Skips views until an `{error}` message arrives
    pub async fn wait_for_error(&mut self) -> String {
        loop {
            if let Outbound::Text(text) = self.next_message().await {
                let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                if let Some(error) = value["error"].as_str() {
                    return error.to_string();
                }
            }
        }
    }

    /// Skips remaining views and returns the close code
    pub async fn expect_close(&mut self) -> u16 {
        loop {
            match self.next_message().await {
                Outbound::Close { code, .. } => return code,
                Outbound::Text(_) => continue,
            }
        }
    }

    /// Asserts that nothing arrives for a short while
    pub async fn expect_silence(&mut self) {
        if let Ok(message) = timeout(Duration::from_millis(100), self.outbound.recv()).await {
            panic!("{} should not have received {message:?}", self.name);
        }
    }

    pub fn send_move(&self, row: i64, col: i64) {
        self.send_raw(json!({ "row": row, "col": col }).to_string());
    }

    pub fn send_raw(&self, text: String) {
        self.inbound
            .as_ref()
            .expect("client already disconnected")
            .send(text)
            .expect("connection is gone");
    }

    /// Closes the client side and waits for the server to finish
    pub async fn disconnect(mut self) -> u16 {
        self.inbound.take();
        let code = self.expect_close().await;
        self.finished().await;
        code
    }

    /// Waits for the server side of the connection to return
    pub async fn finished(self) {
        timeout(WAIT, self.handle)
            .await
            .expect("connection did not finish")
            .expect("connection task panicked");
    }
}
