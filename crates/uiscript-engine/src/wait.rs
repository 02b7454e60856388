use std::time::Duration;
use tokio::time::Instant;

/// Fixed-interval retry clock for polling a UI condition.
///
/// ```ignore
/// let mut poller = Poller::new(timeout, interval);
/// loop {
///     if condition().await { break; }
///     if !poller.next().await { return Err(...); }
/// }
/// ```
pub struct Poller {
    /// `None` when the timeout is too large to represent; polls forever.
    deadline: Option<Instant>,
    interval: Duration,
}

impl Poller {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            interval,
        }
    }

    /// Timeout given in whole seconds; negative values mean a single check.
    pub fn seconds(seconds: i64, interval: Duration) -> Self {
        Self::new(Duration::from_secs(seconds.max(0) as u64), interval)
    }

    /// Sleep until the next attempt. Returns `false` once the timeout has
    /// elapsed.
    pub async fn next(&mut self) -> bool {
        let pause = match self.deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return false;
                }
                self.interval.min(deadline - now)
            }
            None => self.interval,
        };
        tokio::time::sleep(pause).await;
        true
    }
}
