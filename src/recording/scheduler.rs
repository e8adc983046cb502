//! Self-rescheduling tick timer.
//!
//! Each tick sets the deadline of the next one after it has finished, so ticks
//! never overlap. Stopping cancels the token and no further tick fires.

use std::future::pending;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Deadline of the next animation tick plus its cancellation token.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    deadline: Instant,
    token: CancellationToken,
}

impl TickSchedule {
    /// A schedule whose first tick is due at `deadline`.
    pub fn starting_at(deadline: Instant) -> Self {
        Self {
            deadline,
            token: CancellationToken::new(),
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn reschedule(&mut self, deadline: Instant) {
        self.deadline = deadline;
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Resolves when the scheduled tick is due.
///
/// Never resolves when there is no schedule or it gets cancelled while waiting.
pub async fn wait_for_tick(schedule: Option<TickSchedule>) {
    let Some(schedule) = schedule else {
        return pending().await;
    };
    tokio::select! {
        _ = schedule.token.cancelled() => pending().await,
        _ = sleep_until(schedule.deadline) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_tick_fires_at_deadline() {
        let start = Instant::now();
        let schedule = TickSchedule::starting_at(start + Duration::from_millis(25));
        wait_for_tick(Some(schedule)).await;
        assert_eq!(start.elapsed(), Duration::from_millis(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_schedule_never_fires() {
        let schedule = TickSchedule::starting_at(Instant::now() + Duration::from_millis(25));
        schedule.cancel();
        let fired = timeout(Duration::from_secs(5), wait_for_tick(Some(schedule))).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting() {
        let schedule = TickSchedule::starting_at(Instant::now() + Duration::from_millis(100));
        let handle = schedule.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });
        let fired = timeout(Duration::from_secs(1), wait_for_tick(Some(schedule))).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_schedule_waits_forever() {
        let fired = timeout(Duration::from_secs(1), wait_for_tick(None)).await;
        assert!(fired.is_err());
    }

    #[test]
    fn test_reschedule_moves_deadline() {
        let now = Instant::now();
        let mut schedule = TickSchedule::starting_at(now);
        schedule.reschedule(now + Duration::from_millis(25));
        assert_eq!(schedule.deadline(), now + Duration::from_millis(25));
        assert!(!schedule.is_cancelled());
    }
}
