use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

struct WindowSlot {
    started: Instant,
    count: u32,
}

/// Fixed-window request limiter keyed by client identity.
///
/// Each identity gets `max` requests per `window`; the counter resets when
/// the window elapses. State lives only in process memory.
pub struct RateLimiter {
    window: Duration,
    max: u32,
    clients: Mutex<HashMap<String, WindowSlot>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request from `client` and returns whether it is allowed
    /// within the current window.
    pub async fn allow(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let slot = clients.entry(client.to_string()).or_insert(WindowSlot {
            started: now,
            count: 0,
        });
        if now.duration_since(slot.started) >= self.window {
            slot.started = now;
            slot.count = 0;
        }
        if slot.count >= self.max {
            return false;
        }
        slot.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_max_then_denies() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        assert!(limiter.allow("1.2.3.4").await);
        assert!(limiter.allow("1.2.3.4").await);
        assert!(limiter.allow("1.2.3.4").await);
        assert!(!limiter.allow("1.2.3.4").await);
    }

    #[tokio::test]
    async fn identities_are_tracked_separately() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.allow("1.2.3.4").await);
        assert!(!limiter.allow("1.2.3.4").await);
        assert!(limiter.allow("5.6.7.8").await);
    }

    #[tokio::test]
    async fn window_elapse_resets_the_counter() {
        let limiter = RateLimiter::new(Duration::from_millis(10), 1);
        assert!(limiter.allow("1.2.3.4").await);
        assert!(!limiter.allow("1.2.3.4").await);
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(limiter.allow("1.2.3.4").await);
    }
}
