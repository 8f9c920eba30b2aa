//! Background render tasks
//!
//! Each mesh viewer drives its frames from a dedicated thread rather than a
//! shared event loop, so tearing one viewer down never stalls the others.
//! Cancellation is synchronous: `cancel` returns only after the thread has
//! observed the flag and exited, which guarantees no frame callback runs
//! after disposal completes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use stepscope_core::Result;

static ACTIVE_TASKS: AtomicUsize = AtomicUsize::new(0);

/// Decrements the active count when the task thread exits, including by
/// unwinding out of a panicking frame callback.
struct ActiveTask;

impl Drop for ActiveTask {
    fn drop(&mut self) {
        ACTIVE_TASKS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Number of render tasks currently alive, across all viewers
///
/// Returns to zero once every viewer has been disposed; useful for
/// verifying leak-free teardown in tests and diagnostics.
pub fn active_tasks() -> usize {
    ACTIVE_TASKS.load(Ordering::SeqCst)
}

/// A cancellable periodic task running on its own thread
pub struct RenderTask {
    cancelled: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RenderTask {
    /// Spawn a task invoking `frame` roughly every `interval`
    pub fn spawn<F>(name: &str, interval: Duration, mut frame: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        ACTIVE_TASKS.fetch_add(1, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name(format!("stepscope-render-{}", name))
            .spawn(move || {
                let _active = ActiveTask;
                while !flag.load(Ordering::SeqCst) {
                    frame();
                    thread::park_timeout(interval);
                }
            });

        match spawned {
            Ok(handle) => Ok(Self {
                cancelled,
                thread: Some(handle),
            }),
            Err(e) => {
                ACTIVE_TASKS.fetch_sub(1, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Stop the task and wait for its thread to exit
    ///
    /// Idempotent; later calls are no-ops.
    pub fn cancel(&mut self) {
        let Some(handle) = self.thread.take() else {
            return;
        };
        self.cancelled.store(true, Ordering::SeqCst);
        handle.thread().unpark();
        if handle.join().is_err() {
            log::warn!("render task panicked before shutdown");
        }
    }

    /// Whether the task has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.thread.is_none()
    }
}

impl Drop for RenderTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Serializes tests that spawn tasks; the active count is process-wide and
/// parallel test threads would otherwise perturb each other's assertions.
#[cfg(test)]
pub(crate) fn count_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
