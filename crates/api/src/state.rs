use std::sync::Arc;

use miso_core::types::DbId;
use miso_db::repositories::MissionRepo;
use miso_pipeline::conductor::MissionConductor;
use miso_pipeline::dispatcher::Dispatcher;
use miso_pipeline::executor::RemoteExecutor;
use miso_pipeline::generation::TextGenerator;
use miso_pipeline::policy_gate::{GenerativeReviewer, PolicyGate, PolicyReviewer};
use miso_pipeline::runner::MissionRunner;
use miso_pipeline::store::{MissionStore, PgMissionStore};

use crate::config::ServerConfig;

/// External capabilities the server is wired to.
#[derive(Clone, Default)]
pub struct Collaborators {
    /// Local generation capability for `MISO_AI` agents.
    pub generator: Option<Arc<dyn TextGenerator>>,
    /// Policy reviewer consulted before a mission is persisted.
    pub reviewer: Option<Arc<dyn PolicyReviewer>>,
}

impl Collaborators {
    /// Use one generator both for local steps and for policy review.
    pub fn from_generator(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        let reviewer = generator.clone().map(|g| {
            let reviewer: Arc<dyn PolicyReviewer> = Arc::new(GenerativeReviewer::new(g));
            reviewer
        });
        Self {
            generator,
            reviewer,
        }
    }
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: miso_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub policy_gate: Arc<PolicyGate>,
    /// Owner of every background mission run.
    pub runner: Arc<MissionRunner>,
}

impl AppState {
    /// Wire the mission pipeline on top of the pool.
    pub fn new(
        pool: miso_db::DbPool,
        config: ServerConfig,
        collaborators: Collaborators,
    ) -> anyhow::Result<Self> {
        let store: Arc<dyn MissionStore> = Arc::new(PgMissionStore::new(pool.clone()));
        let executor = RemoteExecutor::new(config.executor())?;
        let dispatcher = Arc::new(Dispatcher::new(collaborators.generator, executor));
        let conductor = Arc::new(MissionConductor::new(Arc::clone(&store), dispatcher));
        let runner = Arc::new(MissionRunner::new(conductor, store));
        let policy_gate = Arc::new(PolicyGate::new(
            collaborators.reviewer,
            config.policy_bypass,
        ));

        Ok(Self {
            pool,
            config: Arc::new(config),
            policy_gate,
            runner,
        })
    }

    /// Launch every mission left `pending` by a previous process.
    ///
    /// These were approved before they were persisted, so they run without
    /// another review. Returns the IDs that were launched.
    pub async fn resume_pending(&self) -> Result<Vec<DbId>, sqlx::Error> {
        let pending = MissionRepo::pending_ids(&self.pool).await?;
        Ok(pending
            .into_iter()
            .filter(|&id| self.runner.launch(id))
            .collect())
    }
}
