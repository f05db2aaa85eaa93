//! Progress reporting and cancellation.
//!
//! Callers that want live updates subscribe to an unbounded channel of
//! [`ProgressEvent`]s; callers that don't pass the default hooks and pay
//! nothing. Cancellation is checked between items and between page slices,
//! never mid-capture; interrupting a capture is the renderer's business.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::{PaginateError, Result};

/// Updates emitted while a generation request runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    ItemStarted {
        index: usize,
        title: Option<String>,
    },
    ItemCompleted {
        index: usize,
        pages: usize,
    },
    /// The item failed locally and was excluded from the batch.
    ItemSkipped {
        index: usize,
        message: String,
    },
    PageRendered {
        page: usize,
    },
    MergeStarted {
        documents: usize,
    },
    Completed {
        total_pages: usize,
    },
}

pub type ProgressSender = tokio::sync::mpsc::UnboundedSender<ProgressEvent>;

/// Cooperative cancellation flag shared between the caller and a running
/// generation request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Error out of the current request if cancellation was signalled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PaginateError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Optional per-request hooks: a progress channel and a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct GenerationHooks {
    pub progress: Option<ProgressSender>,
    pub cancel: CancelToken,
}

impl GenerationHooks {
    /// Hooks wired to a fresh progress channel.
    pub fn with_progress() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (
            Self {
                progress: Some(tx),
                cancel: CancelToken::new(),
            },
            rx,
        )
    }

    /// Send an event if anyone is listening; a closed receiver is not an
    /// error.
    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event);
        }
    }
}
