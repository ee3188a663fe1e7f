// Public API
pub use connection::{validate_player_name, Connection, ConnectionError, MAX_PLAYER_NAME_LEN};
pub use handler::join_session;
pub use messages::{ErrorMessage, GameStateMessage, MoveRequest};
pub use socket::{SocketError, SocketReceiver, SocketSender};
pub use throttle::Throttler;

// Internal modules
mod connection;
mod handler;
mod messages;
mod socket;
mod throttle;
