use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Cooperative stop flag shared by a stage and whoever owns it.
///
/// Loops check [`expired`](Self::expired) at iteration boundaries; nothing is
/// preempted. A stage blocked in `Receiver::receive` only wakes when its
/// sender is dropped, so cancel downstream stages before dropping producers.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    expired: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    pub fn expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Sleeps for `timeout`, waking early once cancelled. Returns `expired()`.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.expired() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
        self.expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = Cancellation::new();
        let observer = token.clone();
        assert!(!observer.expired());
        token.cancel();
        assert!(observer.expired());
        assert!(observer.wait_for(Duration::from_secs(5)));
        // idempotent
        observer.cancel();
        assert!(token.expired());
    }

    #[test]
    fn wait_for_times_out_when_not_cancelled() {
        let token = Cancellation::new();
        let start = Instant::now();
        assert!(!token.wait_for(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
