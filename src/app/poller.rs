//! Queue poller - repeating timer task with an explicit stop handle
//!
//! The poller only produces ticks. Deciding whether a tick turns into a
//! request is the app state's job, so the timer knows nothing about users
//! or queue contents.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Which fetch path a tick is for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollKind {
    Queue,
    Progress,
}

/// A timer tick tagged with the view epoch that started the poller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollTick {
    pub epoch: u64,
    pub kind: PollKind,
}

/// Handle to a running poll task. Stops the task when stopped or dropped.
pub struct Poller {
    epoch: u64,
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn the two interval loops. The first tick of each arrives one
    /// period after start; the caller does the immediate fetch itself.
    pub fn start(
        epoch: u64,
        tick_tx: mpsc::UnboundedSender<PollTick>,
        queue_every: Duration,
        progress_every: Duration,
    ) -> Self {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let now = Instant::now();
            let mut queue = interval_at(now + queue_every, queue_every);
            let mut progress = interval_at(now + progress_every, progress_every);
            queue.set_missed_tick_behavior(MissedTickBehavior::Delay);
            progress.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(epoch, "poller started");
            loop {
                let kind = tokio::select! {
                    biased;

                    _ = &mut cancel_rx => break,
                    _ = queue.tick() => PollKind::Queue,
                    _ = progress.tick() => PollKind::Progress,
                };
                if tick_tx.send(PollTick { epoch, kind }).is_err() {
                    break;
                }
            }
            tracing::debug!(epoch, "poller stopped");
        });

        Poller {
            epoch,
            cancel_tx: Some(cancel_tx),
            handle,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stop scheduling further ticks. In-flight requests are unaffected.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
