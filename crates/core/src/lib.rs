//! Domain building blocks shared by the store, pipeline and API crates.

pub mod agent_target;
pub mod chaining;
pub mod error;
pub mod mission;
pub mod policy;
pub mod types;
