//! Fixed-interval pacing between portal requests.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum spacing between consecutive requests.
///
/// The interval is fixed for the whole run; it never reacts to how the
/// portal responds.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `interval` has passed since the previous call returned.
    ///
    /// The first call never waits.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready_at = last + self.interval;
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
