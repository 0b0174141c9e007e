use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

/// Background ticker driving a session's playback time.
///
/// The task stays alive but dormant while stopped, and ends for good once
/// [`Clock::cancel`] is called.
pub struct Clock {
    running: watch::Sender<bool>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Clock {
    /// Spawns a stopped clock calling `on_tick` once per `period` while running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(period: Duration, on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (running, rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(rx, cancel.clone(), period, on_tick));

        Self {
            running,
            cancel,
            task,
        }
    }

    pub fn resume(&self) {
        self.running.send_replace(true);
    }

    pub fn stop(&self) {
        self.running.send_replace(false);
    }

    /// Ends the ticking task. Safe to call any number of times.
    pub fn cancel(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run<F>(
    mut running: watch::Receiver<bool>,
    cancel: CancellationToken,
    period: Duration,
    mut on_tick: F,
) where
    F: FnMut(),
{
    // Missed ticks burst to catch up, so elapsed ticks track wall time.
    let mut interval = tokio::time::interval(period);

    loop {
        let is_running = *running.borrow_and_update();

        if !is_running {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = running.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    interval.reset();
                }
            }
            continue;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = running.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = interval.tick() => on_tick(),
        }
    }
}
