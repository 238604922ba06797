//! Fail-fast group of blocking index pushes.
//!
//! Tasks run to completion on Tokio's blocking pool. Waiting joins every task
//! even after one has failed; the first failure observed is the one
//! reported. Nothing is cancelled.

use gazetteer_core::index::{Dataset, IndexError};
use log::warn;
use tokio::runtime::Handle;
use tokio::task::JoinSet;

use super::PipelineError;

type TaskOutcome = (Dataset, Result<usize, PipelineError>);

/// Concurrent push tasks, one per dataset, sharing a single error slot.
///
/// # Examples
/// ```
/// use gazetteer_core::index::{Dataset, IndexError};
/// use gazetteer_data::pipeline::TaskGroup;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let mut group = TaskGroup::new(runtime.handle().clone());
/// group.spawn(Dataset::Points, || Ok(3));
/// group.spawn(Dataset::Paths, || Err(IndexError::push(Dataset::Paths, "disk full")));
///
/// let outcome = runtime.block_on(group.wait());
/// assert!(outcome.is_err());
/// ```
#[derive(Debug)]
pub struct TaskGroup {
    handle: Handle,
    tasks: JoinSet<TaskOutcome>,
}

impl TaskGroup {
    /// Empty group spawning onto `handle`'s runtime.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            tasks: JoinSet::new(),
        }
    }

    /// Start `work` on the blocking pool. It begins running immediately.
    pub fn spawn<F>(&mut self, dataset: Dataset, work: F)
    where
        F: FnOnce() -> Result<usize, IndexError> + Send + 'static,
    {
        let blocking = self.handle.spawn_blocking(work);
        self.tasks.spawn_on(
            async move {
                let outcome = match blocking.await {
                    Ok(result) => result.map_err(PipelineError::from),
                    Err(source) => Err(PipelineError::TaskPanicked { dataset, source }),
                };
                (dataset, outcome)
            },
            &self.handle,
        );
    }

    /// Number of tasks not yet joined.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether every task has been joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Join every task, returning per-dataset counts or the first error.
    pub async fn wait(mut self) -> Result<Vec<(Dataset, usize)>, PipelineError> {
        let mut completed = Vec::with_capacity(self.tasks.len());
        let mut first_error = None;
        while let Some(joined) = self.tasks.join_next().await {
            let (dataset, outcome) = match joined {
                Ok(task) => task,
                Err(source) => {
                    first_error.get_or_insert(PipelineError::Join(source));
                    continue;
                }
            };
            match outcome {
                Ok(count) => completed.push((dataset, count)),
                Err(err) => {
                    warn!("{dataset} push failed: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(completed),
        }
    }
}
