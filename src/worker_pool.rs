// ==============================================================================
// worker_pool.rs - Fixed-Size Scatter/Gather Executor
// ==============================================================================
// Description: Runs independent CPU-bound work items on a bounded worker pool
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Work items run on tokio's blocking pool; a semaphore caps how many run at
// once. Results are returned in submission order regardless of completion
// order. The first failure aborts the batch.
// ==============================================================================

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// Default worker count when none is configured
pub const DEFAULT_WORKERS: usize = 8;

/// A work item that did not produce a result (panicked or was cancelled)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Worker task failed (item {index:?}): {details}")]
pub struct WorkerFailure {
    /// Item index, when the failure could be attributed to one
    pub index: Option<usize>,
    pub details: String,
}

/// Bounded pool for embarrassingly parallel batches
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    semaphore: Arc<Semaphore>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl WorkerPool {
    /// Create a pool running at most `workers` items at once (minimum 1)
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            semaphore: Arc::new(Semaphore::new(workers)),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Apply `task` to every item and gather results by item index
    ///
    /// # Arguments
    /// * `label` - Batch name used in log messages
    /// * `items` - Independent work items
    /// * `task` - Pure function run once per item on the blocking pool
    ///
    /// # Returns
    /// * `Ok(Vec<R>)` - `results[i]` is the output for `items[i]`
    /// * `Err(E)` - First task error, or a [`WorkerFailure`] converted into `E`
    pub async fn scatter_gather<T, R, E, F>(
        &self,
        label: &str,
        items: Vec<T>,
        task: F,
    ) -> Result<Vec<R>, E>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: From<WorkerFailure> + Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + 'static,
    {
        let total = items.len();
        debug!("Dispatching {} '{}' work items across {} workers", total, label, self.workers);

        let task = Arc::new(task);
        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let mut set: JoinSet<(usize, Result<R, E>)> = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|e| WorkerFailure {
                    index: Some(index),
                    details: e.to_string(),
                })?;

            // Surface failures that finished while we waited for a slot
            while let Some(joined) = set.try_join_next() {
                if let Err(error) = store(&mut slots, joined) {
                    set.abort_all();
                    warn!("Aborting '{}' batch after work item failure", label);
                    return Err(error);
                }
            }

            let task = Arc::clone(&task);
            set.spawn_blocking(move || {
                let _permit = permit;
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(item)))
                    .unwrap_or_else(|payload| {
                        Err(E::from(WorkerFailure {
                            index: Some(index),
                            details: panic_message(payload.as_ref()),
                        }))
                    });
                (index, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(error) = store(&mut slots, joined) {
                set.abort_all();
                warn!("Aborting '{}' batch after work item failure", label);
                return Err(error);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    E::from(WorkerFailure {
                        index: Some(index),
                        details: "no result recorded".to_string(),
                    })
                })
            })
            .collect()
    }
}

fn store<R, E>(
    slots: &mut [Option<R>],
    joined: Result<(usize, Result<R, E>), JoinError>,
) -> Result<(), E>
where
    E: From<WorkerFailure>,
{
    match joined {
        Ok((index, Ok(result))) => {
            slots[index] = Some(result);
            Ok(())
        }
        Ok((_, Err(error))) => Err(error),
        Err(join_error) => Err(E::from(WorkerFailure {
            index: None,
            details: join_error.to_string(),
        })),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
