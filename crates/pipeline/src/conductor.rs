//! Sequential step loop for one mission.
//!
//! Steps run strictly in ascending `step_number` order. Each step's
//! effective input is its seed `input_data` joined with the previous step's
//! output; the first failure halts the mission and leaves later steps
//! `pending`.

use std::sync::Arc;

use miso_core::chaining::effective_input;
use miso_core::types::DbId;
use miso_db::models::mission::MissionTask;

use crate::dispatcher::Dispatcher;
use crate::error::{PipelineError, StepFailure};
use crate::store::MissionStore;

/// How a mission run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionOutcome {
    /// Every step completed. `final_output` is the last step's output (empty
    /// for a mission with no steps).
    Complete { final_output: String, steps: usize },
    /// A step failed; the mission is `error` with `cause` recorded.
    Halted {
        task_id: DbId,
        step_number: i32,
        cause: String,
    },
}

/// Drives a single mission from `pending` to a terminal status.
pub struct MissionConductor {
    store: Arc<dyn MissionStore>,
    dispatcher: Arc<Dispatcher>,
}

impl MissionConductor {
    pub fn new(store: Arc<dyn MissionStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Run every step of a mission.
    ///
    /// Step failures are recorded in the store and reported as
    /// [`MissionOutcome::Halted`]. Store failures, a mission that is not
    /// `pending`, and guarded writes that match no row surface as errors.
    pub async fn execute(&self, mission_id: DbId) -> Result<MissionOutcome, PipelineError> {
        if !self.store.start_mission(mission_id).await? {
            return Err(PipelineError::NotPending(mission_id));
        }

        let tasks = self.store.tasks_ordered(mission_id).await?;
        tracing::info!(mission_id, steps = tasks.len(), "Mission started");

        let mut carry: Option<String> = None;
        for task in &tasks {
            match self.run_step(task, carry.as_deref()).await? {
                Ok(output) => carry = Some(output),
                Err(failure) => {
                    let cause = failure.to_string();
                    tracing::error!(
                        mission_id,
                        task_id = task.id,
                        step_number = task.step_number,
                        error = %cause,
                        "Mission halted",
                    );
                    let failed = self.store.fail_task(task.id, &cause).await?;
                    PipelineError::require(failed, "Task", task.id, "error")?;
                    let failed = self.store.fail_mission(mission_id, &cause).await?;
                    PipelineError::require(failed, "Mission", mission_id, "error")?;
                    return Ok(MissionOutcome::Halted {
                        task_id: task.id,
                        step_number: task.step_number,
                        cause,
                    });
                }
            }
        }

        let completed = self.store.complete_mission(mission_id).await?;
        PipelineError::require(completed, "Mission", mission_id, "complete")?;

        let final_output = carry.unwrap_or_default();
        tracing::info!(mission_id, final_output = %final_output, "Mission complete");

        Ok(MissionOutcome::Complete {
            final_output,
            steps: tasks.len(),
        })
    }

    /// Execute one step. The outer `Result` is a store failure, the inner one
    /// a step failure that halts the mission. `carry` is `None` for the first
    /// step.
    async fn run_step(
        &self,
        task: &MissionTask,
        carry: Option<&str>,
    ) -> Result<Result<String, StepFailure>, PipelineError> {
        let Some(agent) = self.store.agent(task.agent_id).await? else {
            return Ok(Err(StepFailure::AgentNotFound {
                agent_id: task.agent_id,
            }));
        };

        let input = effective_input(task.input_data.as_deref(), carry);
        let started = self.store.start_task(task.id, &input).await?;
        PipelineError::require(started, "Task", task.id, "running")?;
        tracing::debug!(
            task_id = task.id,
            step_number = task.step_number,
            agent_id = agent.id,
            target = %agent.target(),
            "Step started",
        );

        match self.dispatcher.dispatch(&agent, &input).await {
            Ok(output) => {
                let completed = self.store.complete_task(task.id, &output).await?;
                PipelineError::require(completed, "Task", task.id, "complete")?;
                tracing::debug!(task_id = task.id, "Step complete");
                Ok(Ok(output))
            }
            Err(e) => Ok(Err(e.into())),
        }
    }
}
