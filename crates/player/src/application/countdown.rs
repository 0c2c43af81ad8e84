//! Cancellable one-second ticker driving the offer timeout.
//!
//! Every tick carries the generation it was started with, so a tick that
//! races with a restart is recognisably stale. Starting a new countdown
//! cancels the previous one; dropping the `Countdown` cancels it too.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

const TICK: Duration = Duration::from_secs(1);

pub struct Countdown {
    tracker: TaskTracker,
    running: Option<Running>,
}

struct Running {
    generation: u64,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Ticker tasks are spawned on `tracker`, so the owner can observe how many
    /// are still alive.
    pub fn new(tracker: TaskTracker) -> Self {
        Self {
            tracker,
            running: None,
        }
    }

    /// Send `generation` on `ticks` once per second, `seconds` times.
    pub fn start(&mut self, generation: u64, seconds: u32, ticks: mpsc::UnboundedSender<u64>) {
        self.cancel();

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let task = self.tracker.spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            for _ in 0..seconds {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = interval.tick() => {
                        if ticks.send(generation).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        tracing::debug!(generation, seconds, "Countdown started");
        self.running = Some(Running {
            generation,
            cancel_token,
            task,
        });
    }

    pub fn cancel(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel_token.cancel();
            running.task.abort();
            tracing::debug!(generation = running.generation, "Countdown cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.cancel_token.is_cancelled() && !r.task.is_finished())
    }

    pub fn generation(&self) -> Option<u64> {
        self.running.as_ref().map(|r| r.generation)
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
