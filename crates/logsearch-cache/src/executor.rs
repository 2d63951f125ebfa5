use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::task::FileNameFetch;

/// Background queue that runs file-name fetches off the caller's thread.
///
/// Submission never blocks. At most `workers` fetches run at once; with a single worker
/// fetches are serialized in submission order.
pub struct FetchExecutor {
    sender: Mutex<Option<mpsc::UnboundedSender<FileNameFetch>>>,
    pending: Arc<AtomicUsize>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct PendingSlot(Arc<AtomicUsize>);

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl FetchExecutor {
    pub fn start(handle: &Handle, workers: usize) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<FileNameFetch>();
        let slots = Arc::new(Semaphore::new(workers.clamp(1, Semaphore::MAX_PERMITS)));
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);
        let worker = handle.spawn(async move {
            while let Some(fetch) = receiver.recv().await {
                let slot = PendingSlot(Arc::clone(&worker_pending));
                let permit = match Arc::clone(&slots).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                tokio::spawn(async move {
                    let id = fetch.id().clone();
                    let outcome = fetch.run().await;
                    debug!(fetch = %id, ?outcome, "logsearch fetch slot released");
                    drop(permit);
                    drop(slot);
                });
            }
            debug!("logsearch fetch queue closed");
        });
        Self {
            sender: Mutex::new(Some(sender)),
            pending,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queues a fetch. Returns `false` once the executor has been shut down, in which
    /// case the fetch is dropped and its in-flight marker cleared.
    pub fn submit(&self, fetch: FileNameFetch) -> bool {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            return false;
        };
        self.pending.fetch_add(1, Ordering::AcqRel);
        if sender.send(fetch).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            warn!("logsearch fetch queue closed unexpectedly; dropping fetch");
            return false;
        }
        true
    }

    /// Fetches queued or running.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Stops accepting fetches. Queued and running fetches still complete.
    pub fn shutdown(&self) -> Option<JoinHandle<()>> {
        self.sender.lock().take();
        self.worker.lock().take()
    }
}
