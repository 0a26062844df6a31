//! Background model loading.
//!
//! Loading a statistical model can take seconds, so it runs on its own
//! thread. The caller keeps a [`ModelLoad`] and either polls it or waits.

use super::{DetectorError, EntityDetector, ModelKind};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::oneshot;

type LoadResult = Result<Arc<dyn EntityDetector>, DetectorError>;

/// A model being loaded in the background.
pub struct ModelLoad {
    kind: ModelKind,
    rx: oneshot::Receiver<LoadResult>,
}

impl ModelLoad {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Returns the result if loading has finished, without blocking.
    pub fn try_result(&mut self) -> Option<LoadResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(self.lost())),
        }
    }

    /// Waits for the load to finish.
    pub async fn wait(self) -> LoadResult {
        let kind = self.kind;
        self.rx.await.unwrap_or_else(|_| Err(lost(kind)))
    }

    /// Blocks the current thread until the load finishes. Must not be called
    /// from inside an async runtime.
    pub fn blocking_wait(self) -> LoadResult {
        let kind = self.kind;
        self.rx.blocking_recv().unwrap_or_else(|_| Err(lost(kind)))
    }

    fn lost(&self) -> DetectorError {
        lost(self.kind)
    }
}

fn lost(model: ModelKind) -> DetectorError {
    DetectorError::Failed {
        model,
        reason: "loader thread exited without a result".to_string(),
    }
}

/// Starts loading `detector` in the background.
///
/// The detector runs once on a short sample so an unavailable model is
/// reported here, before any document is processed. Use
/// `RedactionService::load_detector` to load whatever the service has
/// registered for a model kind.
pub fn load_detector(detector: Arc<dyn EntityDetector>) -> ModelLoad {
    let kind = detector.model();
    let (tx, rx) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name(format!("load-{:?}", kind).to_lowercase())
        .spawn(move || {
            tracing::info!(model = %kind, "Loading detection model");
            let result = detector
                .detect("sample", &BTreeSet::new())
                .map(|_| detector);
            match &result {
                Ok(_) => tracing::info!(model = %kind, "Detection model ready"),
                Err(e) => tracing::warn!(model = %kind, error = %e, "Detection model failed to load"),
            }
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "Failed to spawn model loader thread");
    }
    ModelLoad { kind, rx }
}
