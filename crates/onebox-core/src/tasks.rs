//! Detached background work.
//!
//! Index pushes and notifications run here so their outcome never reaches
//! the caller that triggered them; they report through logs only.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinSet;

/// Set of fire-and-forget tasks spawned on the current Tokio runtime.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    /// Create an empty task set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task`, reaping any tasks that have already finished.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(finished) = tasks.try_join_next() {
            log_join_result(finished);
        }
        tracing::trace!(task = name, "Spawning background task");
        tasks.spawn(task);
    }

    /// Number of tasks not yet reaped.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait until every outstanding task has finished.
    ///
    /// Tasks spawned while draining are waited for as well.
    pub async fn drain(&self) {
        loop {
            let mut batch = {
                let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *tasks)
            };
            if batch.is_empty() {
                return;
            }
            while let Some(finished) = batch.join_next().await {
                log_join_result(finished);
            }
        }
    }
}

fn log_join_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Background task did not complete");
    }
}
