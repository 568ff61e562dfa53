use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Single-shot trigger for autonomous slide advances.
///
/// There is exactly one deadline slot: `arm` replaces any previous deadline
/// and `cancel` clears it, which makes "at most one timer outstanding" hold
/// by construction. Dwell time is fixed at construction.
#[derive(Debug)]
pub struct AutoplayScheduler {
    dwell: Duration,
    deadline: Option<Instant>,
}

impl AutoplayScheduler {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            deadline: None,
        }
    }

    /// Schedule the next auto-advance one dwell from now, superseding any
    /// previously armed deadline.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.dwell);
    }

    /// Abort a pending deadline. No effect if none is armed.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve when the armed deadline passes, disarming it. Pends forever
    /// while unarmed, so this can sit in a `select!` arm unguarded.
    pub async fn expired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}
