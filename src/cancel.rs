use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// How often a waiting caller re-checks its token.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared flag raised once the user asks the run to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum Interrupted {
    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to spawn worker thread")]
    Spawn(#[source] io::Error),

    #[error("worker thread exited without a result")]
    WorkerLost,
}

/// Run `work` on a worker thread and wait for it unless `cancel` fires first.
///
/// On cancellation the worker is abandoned; whatever it holds is dropped when it finishes.
pub fn run_cancellable<T, F>(cancel: &CancelToken, work: F) -> Result<T, Interrupted>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(Interrupted::Cancelled);
    }

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("gitsum-worker".into())
        .spawn(move || {
            // the receiver is gone if the caller was cancelled
            let _ = tx.send(work());
        })
        .map_err(Interrupted::Spawn)?;

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(value) => return Ok(value),
            Err(RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    log::debug!("cancellation requested, abandoning worker");
                    return Err(Interrupted::Cancelled);
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Err(Interrupted::WorkerLost),
        }
    }
}
