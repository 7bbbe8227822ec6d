pub mod agents;
pub mod missions;
