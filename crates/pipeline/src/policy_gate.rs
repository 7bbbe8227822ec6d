//! Pre-execution policy gate.
//!
//! [`PolicyGate::check`] is called once per mission submission, before the
//! mission or any of its tasks is persisted. An unavailable reviewer is never
//! a veto: it is an error unless the gate runs in bypass mode.

use std::sync::Arc;

use async_trait::async_trait;
use miso_core::policy::{self, Decision};

use crate::error::PolicyError;
use crate::generation::TextGenerator;

/// The external reviewer boundary: `review(text) -> {approved, justification}`.
#[async_trait]
pub trait PolicyReviewer: Send + Sync {
    async fn review(&self, mission: &str) -> Result<Decision, PolicyError>;
}

/// Reviewer that asks a [`TextGenerator`] for a `VETO` / `PROCEED` verdict.
pub struct GenerativeReviewer {
    generator: Arc<dyn TextGenerator>,
}

impl GenerativeReviewer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl PolicyReviewer for GenerativeReviewer {
    async fn review(&self, mission: &str) -> Result<Decision, PolicyError> {
        let answer = self.generator.generate(&policy::review_prompt(mission)).await?;
        Ok(policy::parse_verdict(&answer))
    }
}

/// Gate wrapping an optional reviewer and the explicit bypass flag.
pub struct PolicyGate {
    reviewer: Option<Arc<dyn PolicyReviewer>>,
    bypass: bool,
}

impl PolicyGate {
    pub fn new(reviewer: Option<Arc<dyn PolicyReviewer>>, bypass: bool) -> Self {
        Self { reviewer, bypass }
    }

    /// Review a mission description.
    ///
    /// Returns the reviewer's decision (which may be a veto). When no
    /// decision can be obtained, approves with an explanatory justification
    /// in bypass mode and fails otherwise.
    pub async fn check(&self, mission: &str) -> Result<Decision, PolicyError> {
        let Some(reviewer) = &self.reviewer else {
            if self.bypass {
                tracing::warn!(mission, "No policy reviewer configured, bypassing review");
                return Ok(Decision::bypassed());
            }
            return Err(PolicyError::NotConfigured);
        };

        match reviewer.review(mission).await {
            Ok(decision) => {
                tracing::info!(
                    mission,
                    approved = decision.approved,
                    justification = %decision.justification,
                    "Policy review completed",
                );
                Ok(decision)
            }
            Err(e) if self.bypass => {
                tracing::warn!(mission, error = %e, "Policy reviewer failed, bypassing review");
                Ok(Decision::bypassed())
            }
            Err(e) => {
                tracing::error!(mission, error = %e, "Policy reviewer failed");
                Err(e)
            }
        }
    }
}
