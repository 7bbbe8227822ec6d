//! Step dispatch.
//!
//! Routes one step to the execution target named by its agent's runtime.
//! The dispatcher never touches the store; persisting the outcome is the
//! conductor's job.

use std::sync::Arc;

use miso_core::agent_target::AgentTarget;
use miso_db::models::agent::Agent;

use crate::error::ExecutionError;
use crate::executor::RemoteExecutor;
use crate::generation::TextGenerator;

/// Executes a single step against an agent.
pub struct Dispatcher {
    generator: Option<Arc<dyn TextGenerator>>,
    executor: RemoteExecutor,
}

impl Dispatcher {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, executor: RemoteExecutor) -> Self {
        Self { generator, executor }
    }

    /// Run `input` through `agent` and return its output.
    ///
    /// Local agents ignore their registered command and send `input`
    /// straight to the generation capability as the prompt.
    pub async fn dispatch(&self, agent: &Agent, input: &str) -> Result<String, ExecutionError> {
        match agent.target() {
            AgentTarget::Local => {
                tracing::debug!(agent_id = agent.id, "Routing step to local generation");
                let generator = self
                    .generator
                    .as_ref()
                    .ok_or(ExecutionError::LocalUnavailable)?;
                Ok(generator.generate(input).await?)
            }
            AgentTarget::Remote(host) => {
                self.executor
                    .execute(&host, agent.command_or_empty(), input)
                    .await
            }
        }
    }
}
