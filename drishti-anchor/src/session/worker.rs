//! Background worker for area-map finalization.
//!
//! Exactly one worker may be in flight at a time, owned by the session.
//! The foreground loop polls [`FinalizeWorker::is_running`] each tick
//! instead of joining, so the UI keeps rendering; there is no mid-flight
//! cancellation — once started, finalization runs to completion and the
//! session defers its restart until the worker is observed stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::error::Result;
use crate::tracking::{AreaKey, AreaMapService};

/// A single in-flight area-map finalization run.
pub struct FinalizeWorker {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    result_rx: Receiver<Result<AreaKey>>,
}

impl FinalizeWorker {
    /// Spawn the worker thread. The service is shared rather than moved so
    /// the session can start another run next save.
    pub fn spawn(service: Arc<Mutex<dyn AreaMapService>>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let (result_tx, result_rx) = mpsc::channel();

        let flag = Arc::clone(&running);
        let handle = std::thread::spawn(move || {
            log::info!("Area-map finalization started");
            let result = service.lock().unwrap().finalize_and_persist();
            // Result first, then the flag: a foreground poll that sees the
            // worker stopped will find the result already in the channel.
            let _ = result_tx.send(result);
            flag.store(false, Ordering::Release);
        });

        Self {
            handle: Some(handle),
            running,
            result_rx,
        }
    }

    /// Liveness flag polled by the foreground loop.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Drain the result, if the worker has finished and produced one.
    pub fn try_result(&self) -> Option<Result<AreaKey>> {
        self.result_rx.try_recv().ok()
    }
}

impl Drop for FinalizeWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
