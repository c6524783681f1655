//! CycleLifecycleController - Runs one generation cycle end to end.
//!
//! A run:
//! 1. Clears the cycle's previous log
//! 2. Starts the cycle's sequencer and raises `request`
//! 3. Runs the generation task with a progress reporter as its sink
//! 4. Raises exactly one terminal event (`complete` or `error`), also when
//!    the task panics
//! 5. Stops the sequencer
//!
//! At most one run per cycle id is active at a time, so each log has a
//! single writer.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::domain::foundation::CycleId;
use crate::domain::generation::{GenerateRequest, GenerateResponse, GenerationError};
use crate::domain::progress::{EventKind, ProgressEvent};
use crate::ports::{EventLogStore, GenerationTask, ProgressBus};

use super::sequencer::EventSequencer;

/// Errors from starting or running a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Cycle {0} is already running")]
    CycleAlreadyActive(CycleId),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Cycle task aborted: {0}")]
    Aborted(String),
}

type ActiveCycles = Arc<Mutex<HashSet<CycleId>>>;

/// Marks a cycle active for as long as it is held.
struct ActiveCycle {
    cycle_id: CycleId,
    active: ActiveCycles,
}

impl Drop for ActiveCycle {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        active.remove(&self.cycle_id);
    }
}

/// Handle to a cycle started in the background.
#[derive(Debug)]
pub struct CycleHandle {
    cycle_id: CycleId,
    join: JoinHandle<Result<GenerateResponse, LifecycleError>>,
}

impl CycleHandle {
    pub fn cycle_id(&self) -> &CycleId {
        &self.cycle_id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the run to finish and return its outcome.
    pub async fn wait(self) -> Result<GenerateResponse, LifecycleError> {
        self.join
            .await
            .map_err(|e| LifecycleError::Aborted(e.to_string()))?
    }
}

/// Coordinates store, bus, sequencer and generation task for each run.
#[derive(Clone)]
pub struct CycleLifecycleController {
    store: Arc<dyn EventLogStore>,
    bus: Arc<dyn ProgressBus>,
    task: Arc<dyn GenerationTask>,
    active: ActiveCycles,
}

impl CycleLifecycleController {
    pub fn new(
        store: Arc<dyn EventLogStore>,
        bus: Arc<dyn ProgressBus>,
        task: Arc<dyn GenerationTask>,
    ) -> Self {
        Self {
            store,
            bus,
            task,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether a run for `cycle_id` is in progress.
    pub fn is_active(&self, cycle_id: &CycleId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(cycle_id)
    }

    /// Start a run in the background.
    ///
    /// Returns once the cycle is marked active and its previous log is
    /// cleared, so a viewer attaching afterwards never replays a stale run.
    /// A second `start` for the same id fails with
    /// [`LifecycleError::CycleAlreadyActive`].
    pub async fn start(
        &self,
        cycle_id: CycleId,
        request: GenerateRequest,
    ) -> Result<CycleHandle, LifecycleError> {
        let guard = self.claim(&cycle_id)?;
        self.clear_previous(&cycle_id).await;

        let controller = self.clone();
        let id = cycle_id.clone();
        let join = tokio::spawn(async move {
            let result = controller.execute(&id, request).await;
            drop(guard);
            result
        });

        Ok(CycleHandle { cycle_id, join })
    }

    /// Run a cycle to completion on the current task.
    pub async fn run(
        &self,
        cycle_id: &CycleId,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, LifecycleError> {
        let _guard = self.claim(cycle_id)?;
        self.clear_previous(cycle_id).await;
        self.execute(cycle_id, request).await
    }

    fn claim(&self, cycle_id: &CycleId) -> Result<ActiveCycle, LifecycleError> {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        if !active.insert(cycle_id.clone()) {
            return Err(LifecycleError::CycleAlreadyActive(cycle_id.clone()));
        }

        Ok(ActiveCycle {
            cycle_id: cycle_id.clone(),
            active: Arc::clone(&self.active),
        })
    }

    async fn clear_previous(&self, cycle_id: &CycleId) {
        if let Err(e) = self.store.clear(cycle_id).await {
            tracing::warn!(cycle_id = %cycle_id, error = %e, "Failed to clear previous progress");
        }
    }

    /// Runs with the cycle claimed and its log cleared.
    async fn execute(
        &self,
        cycle_id: &CycleId,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, LifecycleError> {
        let sequencer = EventSequencer::spawn(
            cycle_id.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.bus),
        );
        sequencer.raise(ProgressEvent::new(EventKind::Request).with_data(request.summary()));

        tracing::info!(cycle_id = %cycle_id, "Generation cycle started");

        let outcome = AssertUnwindSafe(self.task.generate(request, Arc::new(sequencer.reporter())))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(GenerationError::Panicked(panic_message(panic.as_ref()))));

        match &outcome {
            Ok(response) => {
                let data = match serde_json::to_value(response) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        tracing::warn!(cycle_id = %cycle_id, error = %e, "Failed to serialize result");
                        None
                    }
                };
                sequencer.raise(ProgressEvent::complete(data));
            }
            Err(e) => sequencer.raise(ProgressEvent::error(e.to_string())),
        }

        let stats = sequencer.finish().await;

        match &outcome {
            Ok(_) => tracing::info!(
                cycle_id = %cycle_id,
                appended = stats.appended,
                append_failures = stats.append_failures,
                publish_failures = stats.publish_failures,
                "Generation cycle completed"
            ),
            Err(e) => tracing::error!(
                cycle_id = %cycle_id,
                error = %e,
                appended = stats.appended,
                "Generation cycle failed"
            ),
        }

        outcome.map_err(LifecycleError::from)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl std::fmt::Debug for CycleLifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleLifecycleController")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
