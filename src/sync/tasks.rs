//! Fire-and-forget background work with an observable completion signal.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    in_flight: AtomicUsize,
    spawned: AtomicUsize,
    completed: AtomicUsize,
    idle: Notify,
}

/// Handle for submitting background tasks.
///
/// Callers never wait on the tasks they submit. Tests can wait for the set
/// to drain with [`BackgroundTasks::wait_idle`].
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

/// Decrements the in-flight counter when a task ends, including on panic.
struct CompletionGuard(Arc<Inner>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.completed.fetch_add(1, Ordering::SeqCst);
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl BackgroundTasks {
    /// Create an empty task set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a task on the current runtime.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.spawned.fetch_add(1, Ordering::SeqCst);
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = CompletionGuard(Arc::clone(&self.inner));
        tokio::spawn(async move {
            let _guard = guard;
            fut.await;
        });
    }

    /// Tasks currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Tasks submitted so far.
    pub fn spawned(&self) -> usize {
        self.inner.spawned.load(Ordering::SeqCst)
    }

    /// Tasks finished so far.
    pub fn completed(&self) -> usize {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Wait until no task is in flight.
    ///
    /// Tasks spawned by other tasks are included, as long as they are
    /// submitted before their parent finishes.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a notification in between is not lost.
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}
