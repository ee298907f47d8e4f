use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A periodic purge task owned by whoever spawned it.
///
/// The task stops when [`Sweeper::shutdown`] is called or the handle is
/// dropped.
pub struct Sweeper {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Runs `sweep` every `period`, first tick after one full period.
    /// `sweep` returns the number of entries it removed.
    pub fn spawn<F>(name: &'static str, period: Duration, sweep: F) -> Self
    where
        F: Fn() -> usize + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => {
                        debug!("{} sweeper shutting down", name);
                        break;
                    }
                    _ = interval.tick() => {
                        let removed = sweep();
                        if removed > 0 {
                            debug!("{} sweeper removed {} stale entries", name, removed);
                        }
                    }
                }
            }
        });

        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancels the task and waits for it to finish.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("{} sweeper ended abnormally: {}", self.name, e);
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
