// Public API - what other modules can use
pub use cleanup_task::{cleanup_dead_sessions, spawn_cleanup_task, CleanupConfig};
pub use errors::SessionError;
pub use handlers::{create_session, get_session};
pub use models::{ActivationGuard, Player, Session, SessionConfig, SessionSnapshot, MAX_PLAYERS};
pub use registry::SessionRegistry;
pub use types::{CreateSessionRequest, CreateSessionResponse, PlayerResponse, SessionResponse};

// Internal modules
mod cleanup_task;
mod errors;
mod handlers;
mod models;
mod registry;
mod types;
