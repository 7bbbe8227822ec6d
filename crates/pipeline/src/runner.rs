//! Background mission runs.
//!
//! The API responds to a mission submission before any step executes; the
//! run itself is a Tokio task owned by [`MissionRunner`]. Handles are kept
//! per mission so shutdown can wait for in-flight runs and abort stragglers.
//! A run that errors or panics outside the step loop still leaves its
//! mission in a terminal status.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use miso_core::types::DbId;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::conductor::{MissionConductor, MissionOutcome};
use crate::error::PipelineError;
use crate::store::MissionStore;

/// Recorded on a mission whose run task panicked.
pub const PANIC_ERROR: &str = "Mission run terminated unexpectedly";

type ActiveRuns = Arc<Mutex<HashMap<DbId, JoinHandle<()>>>>;

/// Owns the background task of every in-flight mission.
pub struct MissionRunner {
    conductor: Arc<MissionConductor>,
    store: Arc<dyn MissionStore>,
    active: ActiveRuns,
    tracker: TaskTracker,
}

impl MissionRunner {
    pub fn new(conductor: Arc<MissionConductor>, store: Arc<dyn MissionStore>) -> Self {
        Self {
            conductor,
            store,
            active: Arc::new(Mutex::new(HashMap::new())),
            tracker: TaskTracker::new(),
        }
    }

    /// Start a mission's run in the background.
    ///
    /// Returns `false` without spawning if the mission already has an active
    /// run or the runner is shutting down.
    pub fn launch(&self, mission_id: DbId) -> bool {
        let mut active = lock(&self.active);
        if self.tracker.is_closed() || active.contains_key(&mission_id) {
            return false;
        }

        let conductor = Arc::clone(&self.conductor);
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.active);

        let handle = self.tracker.spawn(async move {
            let result = AssertUnwindSafe(conductor.execute(mission_id))
                .catch_unwind()
                .await;

            match result {
                Ok(Ok(MissionOutcome::Complete { steps, .. })) => {
                    tracing::debug!(mission_id, steps, "Mission run finished");
                }
                Ok(Ok(MissionOutcome::Halted { step_number, .. })) => {
                    tracing::debug!(mission_id, step_number, "Mission run halted");
                }
                Ok(Err(PipelineError::NotPending(_))) => {
                    tracing::warn!(mission_id, "Mission was not pending, run skipped");
                }
                Ok(Err(e)) => {
                    tracing::error!(mission_id, error = %e, "Mission run failed");
                    record_failure(store.as_ref(), mission_id, &e.to_string()).await;
                }
                Err(_) => {
                    tracing::error!(mission_id, "Mission run panicked");
                    record_failure(store.as_ref(), mission_id, PANIC_ERROR).await;
                }
            }

            lock(&registry).remove(&mission_id);
        });

        active.insert(mission_id, handle);
        tracing::info!(mission_id, "Mission run launched");
        true
    }

    pub fn is_active(&self, mission_id: DbId) -> bool {
        lock(&self.active).contains_key(&mission_id)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }

    /// Stop accepting runs and wait up to `timeout` for in-flight ones.
    ///
    /// Runs still going after the timeout are aborted; their missions stay
    /// `running` until the next startup fails them. Returns `true` if every
    /// run finished on its own.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let in_flight = self.active_count();
        tracing::info!(in_flight, "Waiting for mission runs to finish");

        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok() {
            return true;
        }

        let stragglers: Vec<(DbId, JoinHandle<()>)> = lock(&self.active).drain().collect();
        for (mission_id, handle) in &stragglers {
            tracing::warn!(mission_id, "Aborting mission run at shutdown");
            handle.abort();
        }
        false
    }
}

/// Best-effort terminal write for a run that died outside the step loop.
async fn record_failure(store: &dyn MissionStore, mission_id: DbId, error: &str) {
    if let Err(e) = store.fail_running_tasks(mission_id, error).await {
        tracing::error!(mission_id, error = %e, "Failed to record task failure");
    }
    if let Err(e) = store.fail_mission(mission_id, error).await {
        tracing::error!(mission_id, error = %e, "Failed to record mission failure");
    }
}

/// The registry holds no invariants a panic could break, so a poisoned lock
/// is still usable.
fn lock(active: &ActiveRuns) -> MutexGuard<'_, HashMap<DbId, JoinHandle<()>>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use miso_db::models::status::{MissionStatus, TaskStatus};

    use crate::dispatcher::Dispatcher;
    use crate::error::GenerationError;
    use crate::executor::{ExecutorConfig, RemoteExecutor};
    use crate::generation::TextGenerator;
    use crate::store::memory::MemoryStore;

    enum Behavior {
        Reply,
        Panic,
        Hang,
    }

    struct Scripted(Behavior);

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            match self.0 {
                Behavior::Reply => Ok(format!("<{prompt}>")),
                Behavior::Panic => panic!("generator exploded"),
                Behavior::Hang => futures::future::pending().await,
            }
        }
    }

    fn runner(store: Arc<MemoryStore>, behavior: Behavior) -> MissionRunner {
        let dispatcher = Dispatcher::new(
            Some(Arc::new(Scripted(behavior))),
            RemoteExecutor::new(ExecutorConfig::default()).unwrap(),
        );
        let conductor = MissionConductor::new(store.clone(), Arc::new(dispatcher));
        MissionRunner::new(Arc::new(conductor), store)
    }

    fn one_step_mission(id: DbId) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.add_agent(1, "MISO_AI", None);
        store.add_mission(id, &[(1, 1, Some("go"))]);
        store
    }

    #[tokio::test]
    async fn runs_mission_in_background() {
        let store = one_step_mission(1);
        let runner = runner(store.clone(), Behavior::Reply);

        assert!(runner.launch(1));
        assert!(runner.shutdown(Duration::from_secs(5)).await);

        assert_eq!(store.mission(1).status, MissionStatus::Complete);
        assert_eq!(store.task(101).output_data.as_deref(), Some("<go>"));
        assert_eq!(runner.active_count(), 0);
    }

    #[tokio::test]
    async fn panicking_run_fails_mission_and_running_task() {
        let store = one_step_mission(2);
        let runner = runner(store.clone(), Behavior::Panic);

        assert!(runner.launch(2));
        assert!(runner.shutdown(Duration::from_secs(5)).await);

        let mission = store.mission(2);
        assert_eq!(mission.status, MissionStatus::Error);
        assert_eq!(mission.error_message.as_deref(), Some(PANIC_ERROR));
        assert_eq!(store.task(201).status_id, TaskStatus::Error.id());
        assert!(!runner.is_active(2));
    }

    #[tokio::test]
    async fn rejected_transition_fails_mission() {
        let store = one_step_mission(5);
        store.set_task_status(501, TaskStatus::Complete);
        let runner = runner(store.clone(), Behavior::Reply);

        assert!(runner.launch(5));
        assert!(runner.shutdown(Duration::from_secs(5)).await);

        let mission = store.mission(5);
        assert_eq!(mission.status, MissionStatus::Error);
        assert_eq!(
            mission.error_message.as_deref(),
            Some("Task 501 could not move to running")
        );
    }

    #[tokio::test]
    async fn duplicate_launch_is_rejected_while_active() {
        let store = one_step_mission(3);
        let runner = runner(store.clone(), Behavior::Hang);

        assert!(runner.launch(3));
        assert!(!runner.launch(3));
        assert!(runner.is_active(3));

        assert!(!runner.shutdown(Duration::from_millis(50)).await);
        assert_eq!(runner.active_count(), 0);
        assert_eq!(store.mission(3).status, MissionStatus::Running);
    }

    #[tokio::test]
    async fn no_launch_after_shutdown() {
        let store = one_step_mission(4);
        let runner = runner(store.clone(), Behavior::Reply);

        assert!(runner.shutdown(Duration::from_millis(10)).await);
        assert!(!runner.launch(4));
        assert_eq!(store.mission(4).status, MissionStatus::Pending);
    }
}
