//! Mission execution engine.
//!
//! - [`policy_gate`] vetoes missions before anything is persisted.
//! - [`dispatcher`] routes one step to the local generation capability
//!   ([`generation`]) or a remote executor ([`executor`]).
//! - [`conductor`] drains a mission's steps in order through a
//!   [`store::MissionStore`].
//! - [`runner`] owns the background task of every in-flight mission.

pub mod conductor;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod generation;
pub mod policy_gate;
pub mod runner;
pub mod store;
