use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

/// Handle to a poller running on its own task.
///
/// Dropping the handle also stops the poller at its next pause.
pub struct PollerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl PollerHandle {
    pub(super) fn new(stop: watch::Sender<bool>, task: JoinHandle<u64>) -> Self {
        Self { stop, task }
    }

    /// Ask the poller to stop. An in-flight status request is allowed to finish.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the poller task to end. Returns the number of cycles it ran.
    pub async fn join(self) -> Result<u64, JoinError> {
        let PollerHandle { stop, task } = self;
        let cycles = task.await;
        drop(stop);
        cycles
    }

    /// `stop` followed by `join`.
    pub async fn shutdown(self) -> Result<u64, JoinError> {
        self.stop();
        self.join().await
    }
}
