//! Background execution and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use super::{BatchEvent, BatchJob, BatchResult, ChannelObserver};

/// Cooperative cancellation flag, checked before each row.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Rows already handed to the sink stay sent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A batch running on its own thread.
///
/// Progress arrives on [`events`](Self::events); the final result comes from
/// [`join`](Self::join) and is also sent as [`BatchEvent::Finished`].
#[derive(Debug)]
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    cancel: CancelToken,
    thread: JoinHandle<BatchResult>,
}

impl BatchHandle {
    /// The event stream.
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    /// Ask the batch to stop before its next row.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `true` once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the batch to end.
    pub fn join(self) -> BatchResult {
        self.thread.join().unwrap_or_else(|_| {
            BatchResult::aborted(
                0,
                0,
                "Error: batch worker stopped unexpectedly.".to_string(),
                Vec::new(),
            )
        })
    }
}

pub(super) fn spawn(mut job: BatchJob) -> std::io::Result<BatchHandle> {
    let (tx, rx) = mpsc::channel();
    let cancel = job.cancel_token();
    let thread = thread::Builder::new()
        .name("zpl-merge-batch".to_string())
        .spawn(move || job.run(&mut ChannelObserver::new(tx)))?;
    Ok(BatchHandle {
        events: rx,
        cancel,
        thread,
    })
}
