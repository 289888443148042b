//! All-settled aggregation for batch operations.
//!
//! Batch flows such as "mark all notifications as read" issue one request per
//! item. A failing item must not abort the batch: every operation runs to
//! completion and the outcome is summarized as succeeded and failed keys.

use std::fmt::{Debug, Display};
use std::future::Future;

use serde::Serialize;
use tracing::warn;

/// Outcome of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary<K> {
    /// Keys whose operation succeeded, in execution order
    pub succeeded: Vec<K>,
    /// Keys whose operation failed, with the error message
    pub failed: Vec<(K, String)>,
}

impl<K> Default for BatchSummary<K> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<K> BatchSummary<K> {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when nothing failed (an empty batch counts as complete).
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line summary for toasts, e.g. "4 succeeded, 1 failed".
    pub fn describe(&self) -> String {
        format!(
            "{} succeeded, {} failed",
            self.succeeded_count(),
            self.failed_count()
        )
    }
}

/// Runs `op` for every key, one after another, and collects every outcome.
///
/// Operations are awaited sequentially so a large batch does not flood the
/// backend. Failures are logged and recorded; they never short-circuit.
pub async fn settle_all<K, I, F, Fut, T, E>(keys: I, mut op: F) -> BatchSummary<K>
where
    K: Clone + Debug,
    I: IntoIterator<Item = K>,
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut summary = BatchSummary::default();

    for key in keys {
        match op(key.clone()).await {
            Ok(_) => summary.succeeded.push(key),
            Err(e) => {
                warn!(item = ?key, error = %e, "Batch item failed");
                summary.failed.push((key, e.to_string()));
            }
        }
    }

    summary
}
