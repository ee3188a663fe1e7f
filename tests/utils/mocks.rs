//! In-memory stand-ins for the two halves of a WebSocket
#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use tokio::sync::mpsc;

use tictactoe::websockets::{SocketError, SocketReceiver, SocketSender};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// What the server pushed to a client
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

/// Records everything the server sends
pub struct MockSender {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl MockSender {
    pub fn new(outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl SocketSender for MockSender {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.outbound
            .send(Outbound::Text(message))
            .map_err(|_| SocketError::SendFailed("client went away".to_string()))
    }

    async fn close(&mut self, code: u16, reason: String) -> Result<(), SocketError> {
        self.outbound
            .send(Outbound::Close { code, reason })
            .map_err(|_| SocketError::SendFailed("client went away".to_string()))
    }
}

/// A client that never reads: every text send hangs, closing still works
pub struct StalledSender {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl StalledSender {
    pub fn new(outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl SocketSender for StalledSender {
    async fn send_message(&mut self, _message: String) -> Result<(), SocketError> {
        std::future::pending().await
    }

    async fn close(&mut self, code: u16, reason: String) -> Result<(), SocketError> {
        self.outbound
            .send(Outbound::Close { code, reason })
            .map_err(|_| SocketError::SendFailed("client went away".to_string()))
    }
}

/// Feeds client messages to the server; dropping the sending side is a disconnect
pub struct MockReceiver {
    inbound: mpsc::UnboundedReceiver<String>,
}

impl MockReceiver {
    pub fn new(inbound: mpsc::UnboundedReceiver<String>) -> Self {
        Self { inbound }
    }
}

#[async_trait]
impl SocketReceiver for MockReceiver {
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        Ok(self.inbound.recv().await)
    }
}
