//! Background passes.
//!
//! A pass runs on its own worker thread. The caller gets a [`PassHandle`]:
//! a page counter that only moves forward, a cancellation flag the pass checks
//! between pages, and exactly one terminal result.

use crate::error::{RedactorError, RedactorResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

/// Progress and cancellation shared between a pass and its caller.
#[derive(Debug, Clone)]
pub struct PassControl {
    progress: Arc<watch::Sender<usize>>,
    cancelled: Arc<AtomicBool>,
}

impl Default for PassControl {
    fn default() -> Self {
        Self::detached()
    }
}

impl PassControl {
    /// A control nobody is watching, for passes run inline.
    pub fn detached() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            progress: Arc::new(tx),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Records one more finished page.
    pub fn advance(&self) {
        self.progress.send_modify(|done| *done += 1);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Pages finished so far.
    pub fn completed(&self) -> usize {
        *self.progress.borrow()
    }

    /// Fails with [`RedactorError::Cancelled`] if cancellation was requested.
    pub fn checkpoint(&self) -> RedactorResult<()> {
        if self.is_cancelled() {
            return Err(RedactorError::Cancelled {
                completed_pages: self.completed(),
            });
        }
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.progress.subscribe()
    }
}

/// A pass running in the background.
pub struct PassHandle<T> {
    control: PassControl,
    result: oneshot::Receiver<RedactorResult<T>>,
}

impl<T> PassHandle<T> {
    /// Receiver for the page counter.
    pub fn progress(&self) -> watch::Receiver<usize> {
        self.control.subscribe()
    }

    pub fn completed(&self) -> usize {
        self.control.completed()
    }

    /// Asks the pass to stop at the next page boundary.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Returns the result if the pass has finished, without blocking.
    pub fn try_result(&mut self) -> Option<RedactorResult<T>> {
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(worker_lost())),
        }
    }

    /// Waits for the terminal result.
    pub async fn finish(self) -> RedactorResult<T> {
        self.result.await.unwrap_or_else(|_| Err(worker_lost()))
    }

    /// Blocks until the terminal result arrives. Must not be called from
    /// inside an async runtime.
    pub fn wait(self) -> RedactorResult<T> {
        self.result.blocking_recv().unwrap_or_else(|_| Err(worker_lost()))
    }
}

fn worker_lost() -> RedactorError {
    RedactorError::BackendError {
        backend: "worker".to_string(),
        message: "pass ended without reporting a result".to_string(),
        source: None,
    }
}

/// Runs `work` on a named worker thread.
pub fn spawn_pass<T, F>(name: &str, work: F) -> RedactorResult<PassHandle<T>>
where
    T: Send + 'static,
    F: FnOnce(&PassControl) -> RedactorResult<T> + Send + 'static,
{
    let control = PassControl::detached();
    let worker_control = control.clone();
    let (tx, rx) = oneshot::channel();

    std::thread::Builder::new()
        .name(format!("redactor-{}", name))
        .spawn(move || {
            let result = work(&worker_control);
            if let Err(e) = &result {
                tracing::warn!(error = %e, "background pass failed");
            }
            let _ = tx.send(result);
        })
        .map_err(|e| RedactorError::BackendError {
            backend: "worker".to_string(),
            message: "failed to spawn pass thread".to_string(),
            source: Some(Box::new(e)),
        })?;

    Ok(PassHandle {
        control,
        result: rx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_and_result() {
        let handle = spawn_pass("test", |control| {
            for _ in 0..3 {
                control.checkpoint()?;
                control.advance();
            }
            Ok(control.completed())
        })
        .unwrap();
        assert_eq!(handle.wait().unwrap(), 3);
    }

    #[test]
    fn test_cancel_before_start() {
        let (go_tx, go_rx) = std::sync::mpsc::channel::<()>();
        let handle = spawn_pass("cancel", move |control| {
            let _ = go_rx.recv();
            control.checkpoint()?;
            Ok(())
        })
        .unwrap();
        handle.cancel();
        go_tx.send(()).unwrap();
        let err = handle.wait().unwrap_err();
        assert!(matches!(err, RedactorError::Cancelled { completed_pages: 0 }));
    }

    #[test]
    fn test_poll_for_result() {
        let (go_tx, go_rx) = std::sync::mpsc::channel::<()>();
        let mut handle = spawn_pass("poll", move |_| {
            let _ = go_rx.recv();
            Ok(7)
        })
        .unwrap();
        assert!(handle.try_result().is_none());

        go_tx.send(()).unwrap();
        let result = loop {
            if let Some(result) = handle.try_result() {
                break result;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_panicking_worker_reports_error() {
        let handle = spawn_pass::<(), _>("panic", |_| panic!("boom")).unwrap();
        assert!(handle.wait().is_err());
    }

    #[tokio::test]
    async fn test_async_finish_observes_progress() {
        let handle = spawn_pass("async", |control| {
            control.advance();
            control.advance();
            Ok("done")
        })
        .unwrap();
        let mut progress = handle.progress();
        assert_eq!(handle.finish().await.unwrap(), "done");
        assert_eq!(*progress.borrow_and_update(), 2);
    }

    #[test]
    fn test_detached_control() {
        let control = PassControl::default();
        control.advance();
        assert_eq!(control.completed(), 1);
        assert!(control.checkpoint().is_ok());
        control.cancel();
        assert!(control.checkpoint().is_err());
    }
}
