//! Request pacing between calls to the Jira API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;

/// Spaces upstream requests by a minimum cooldown and can push the next slot
/// further out when Jira answers 429 with a `Retry-After` delay.
#[derive(Clone, Debug)]
pub struct RequestPacer {
    cooldown: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl RequestPacer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits until the next request slot opens, then reserves the following one.
    pub async fn acquire(&self) {
        let mut slot = self.next_slot.lock().await;
        let now = Instant::now();
        if let Some(at) = *slot {
            if at > now {
                sleep(at - now).await;
            }
        }
        *slot = Some(Instant::now() + self.cooldown);
    }

    /// Pushes the next slot at least `wait` into the future. Used after an
    /// upstream 429 so the following request honors `Retry-After`.
    pub async fn penalize(&self, wait: Duration) {
        let mut slot = self.next_slot.lock().await;
        let candidate = Instant::now() + wait;
        match *slot {
            Some(at) if at >= candidate => {}
            _ => *slot = Some(candidate),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::RequestPacer;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn cooldown_accessor_returns_configured_value() {
        let pacer = RequestPacer::new(Duration::from_millis(25));
        assert_eq!(pacer.cooldown(), Duration::from_millis(25));
    }

    #[tokio::test]
    async fn second_acquire_waits_for_cooldown() {
        let pacer = RequestPacer::new(Duration::from_millis(40));

        pacer.acquire().await;
        let start = Instant::now();
        pacer.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[tokio::test]
    async fn penalty_delays_next_acquire() {
        let pacer = RequestPacer::new(Duration::from_millis(5));

        pacer.acquire().await;
        pacer.penalize(Duration::from_millis(60)).await;
        let start = Instant::now();
        pacer.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn penalty_never_shortens_an_existing_slot() {
        let pacer = RequestPacer::new(Duration::from_millis(80));

        pacer.acquire().await;
        pacer.penalize(Duration::from_millis(1)).await;
        let start = Instant::now();
        pacer.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(70));
    }
}
