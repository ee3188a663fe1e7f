use thiserror::Error;
use uuid::Uuid;

/// Reasons a session lookup or a join attempt is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session {0} is not found")]
    NotFound(Uuid),

    #[error("All players have already joined the session")]
    SessionFull,

    #[error("The player '{0}' has already joined the session")]
    AlreadyActive(String),
}
