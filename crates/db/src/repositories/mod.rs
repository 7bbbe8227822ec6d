//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod agent_repo;
pub mod mission_repo;
pub mod mission_task_repo;

pub use agent_repo::AgentRepo;
pub use mission_repo::MissionRepo;
pub use mission_task_repo::MissionTaskRepo;
