use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::registry::SessionRegistry;
use crate::event::EventBus;

/// Configuration for the cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run the cleanup task
    pub cleanup_interval: Duration,
    /// How long a session must sit without connections before deletion
    pub session_timeout: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(5 * 60), // 5 minutes
            session_timeout: Duration::from_secs(10 * 60), // 10 minutes
        }
    }
}

/// Spawns the background cleanup task. Cancelling `shutdown` stops it at the
/// next suspension point; callers do not need to await the handle.
pub fn spawn_cleanup_task(
    registry: Arc<SessionRegistry>,
    event_bus: EventBus,
    cleanup_interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_cleanup_task(
        registry,
        event_bus,
        cleanup_interval,
        shutdown,
    ))
}

/// Periodically removes sessions nobody is using until `shutdown` fires
#[instrument(skip(registry, event_bus, shutdown))]
pub async fn run_cleanup_task(
    registry: Arc<SessionRegistry>,
    event_bus: EventBus,
    cleanup_interval: Duration,
    shutdown: CancellationToken,
) {
    info!(
        cleanup_interval_secs = cleanup_interval.as_secs(),
        session_timeout_secs = registry.session_timeout().as_secs(),
        "Starting session cleanup background task"
    );

    let mut next_run = Instant::now() + cleanup_interval;

    loop {
        debug!(
            sleep = ?next_run.saturating_duration_since(Instant::now()),
            "Cleanup task sleeping"
        );

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = sleep_until(next_run) => {}
        }

        // Scheduled before the sweep so a slow pass does not push later runs back
        next_run = Instant::now() + cleanup_interval;

        let reclaimed = cleanup_dead_sessions(&registry, &event_bus);
        if reclaimed.is_empty() {
            info!("No dead sessions have been found");
        } else {
            info!(
                total = reclaimed.len(),
                sessions = ?reclaimed,
                "Dead sessions removed"
            );
        }
    }

    info!("Session cleanup task stopped");
}

/// Runs one sweep and closes the bus topics of every removed session
pub fn cleanup_dead_sessions(registry: &SessionRegistry, event_bus: &EventBus) -> Vec<Uuid> {
    let reclaimed = registry.sweep();

    for session_id in &reclaimed {
        let detached = event_bus.close_topic(&session_id.to_string());
        debug!(session_id = %session_id, detached, "Session topic closed");
    }

    reclaimed
}
