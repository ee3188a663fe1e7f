use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::errors::SessionError;
use super::models::{Session, SessionConfig};
use crate::game::Game;

/// Process-wide table of live sessions
///
/// The session map sits behind one mutex held only for map operations;
/// per-session state has its own lock, so sessions never block each other.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Arc<Session>>>,
    session_timeout: Duration,
}

impl SessionRegistry {
    /// Creates an empty registry whose sweep reclaims sessions idle for longer
    /// than `session_timeout`
    pub fn new(session_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            session_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Creates and stores a tic-tac-toe session
    pub fn create(&self, config: SessionConfig) -> Arc<Session> {
        self.create_with_game(config.build_game())
    }

    /// Creates and stores a session hosting `game` under a fresh id
    pub fn create_with_game(&self, game: Box<dyn Game>) -> Arc<Session> {
        let mut sessions = self.lock();
        let id = loop {
            let id = Uuid::new_v4();
            if !sessions.contains_key(&id) {
                break id;
            }
        };

        let session = Arc::new(Session::new(id, game));
        sessions.insert(id, Arc::clone(&session));

        info!(session_id = %session.id(), total = sessions.len(), "Session created");
        session
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<Session>, SessionError> {
        let session = self.lock().get(&id).cloned();
        match session {
            Some(session) => {
                debug!(session_id = %id, "Session found");
                Ok(session)
            }
            None => {
                debug!(session_id = %id, "Session not found");
                Err(SessionError::NotFound(id))
            }
        }
    }

    pub fn delete(&self, id: Uuid) -> Result<Arc<Session>, SessionError> {
        let removed = self.lock().remove(&id);
        match removed {
            Some(session) => {
                debug!(session_id = %id, "Session deleted");
                Ok(session)
            }
            None => {
                warn!(session_id = %id, "Session not found for deletion");
                Err(SessionError::NotFound(id))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes every dead session and returns their ids
    pub fn sweep(&self) -> Vec<Uuid> {
        self.sweep_at(Utc::now())
    }

    /// Like [`sweep`](Self::sweep) with an explicit clock reading
    #[instrument(skip(self))]
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut sessions = self.lock();

        let dead: Vec<Uuid> = sessions
            .values()
            .filter(|session| session.reclaim_if_dead(self.session_timeout, now))
            .map(|session| session.id())
            .collect();

        for id in &dead {
            sessions.remove(id);
        }

        debug!(
            reclaimed = dead.len(),
            remaining = sessions.len(),
            "Sweep finished"
        );
        dead
    }
}
