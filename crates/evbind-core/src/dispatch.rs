//! Fire-and-forget callback dispatch
//!
//! The engine never runs a binding callback itself. Once a combo fires, the
//! callback is handed to a [`Dispatch`] implementation after the engine's
//! lock is released, so a slow callback cannot stall the event stream and a
//! callback may call back into the engine.
//!
//! No handle to a dispatched callback is kept; it runs to completion on its
//! own.

use std::sync::Arc;
use std::thread;

use tokio::runtime::Handle;

/// A binding callback.
pub type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Runs fired callbacks independently of the caller.
pub trait Dispatch: Send + Sync {
    /// Start `callback` without waiting for it to finish.
    fn dispatch(&self, callback: Callback);
}

/// Runs every callback on a freshly spawned OS thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDispatch;

impl Dispatch for ThreadDispatch {
    fn dispatch(&self, callback: Callback) {
        let spawned = thread::Builder::new()
            .name("evbind-callback".to_string())
            .spawn(move || callback());

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn callback thread: {}", e);
        }
    }
}

/// Runs callbacks on a tokio runtime's blocking pool.
///
/// Callbacks are plain closures that may block, so they go through
/// `spawn_blocking` rather than onto the async workers.
#[derive(Debug, Clone)]
pub struct TokioDispatch {
    handle: Handle,
}

impl TokioDispatch {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Dispatcher for the runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Dispatch for TokioDispatch {
    fn dispatch(&self, callback: Callback) {
        // Dropping the JoinHandle detaches the task.
        drop(self.handle.spawn_blocking(move || callback()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_thread_dispatch_runs_off_caller_thread() {
        let caller = thread::current().id();
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);

        ThreadDispatch.dispatch(Arc::new(move || {
            let _ = tx.lock().send(thread::current().id());
        }));

        let ran_on = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(ran_on, caller);
    }

    #[test]
    fn test_thread_dispatch_does_not_wait() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = parking_lot::Mutex::new(release_rx);
        let (done_tx, done_rx) = mpsc::channel();
        let done_tx = parking_lot::Mutex::new(done_tx);

        // The callback blocks until released; dispatch must still return.
        ThreadDispatch.dispatch(Arc::new(move || {
            let _ = release_rx.lock().recv();
            let _ = done_tx.lock().send(());
        }));

        assert!(done_rx.try_recv().is_err());
        release_tx.send(()).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_tokio_dispatch_current_outside_runtime() {
        assert!(TokioDispatch::current().is_none());
    }

    #[tokio::test]
    async fn test_tokio_dispatch_runs_callback() {
        let notify = Arc::new(tokio::sync::Notify::new());
        let signal = notify.clone();

        let dispatcher = TokioDispatch::current().unwrap();
        dispatcher.dispatch(Arc::new(move || signal.notify_one()));

        tokio::time::timeout(Duration::from_secs(5), notify.notified())
            .await
            .unwrap();
    }
}
