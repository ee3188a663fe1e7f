use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum spacing between consecutive operations
#[derive(Debug)]
pub struct Throttler {
    next: Instant,
    spacing: Duration,
}

impl Throttler {
    pub fn new(spacing: Duration) -> Self {
        Self {
            next: Instant::now(),
            spacing,
        }
    }

    /// Waits until the previous call is at least `spacing` in the past
    pub async fn throttle(&mut self) {
        sleep_until(self.next).await;
        self.next = Instant::now() + self.spacing;
    }
}
