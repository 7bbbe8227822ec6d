//! Policy review decisions.
//!
//! The reviewer answers a fixed prompt with either [`VERDICT_VETO`] or
//! [`VERDICT_PROCEED`]. Any answer that mentions a veto is treated as one.

use serde::Serialize;

/// Reviewer answer that blocks a mission.
pub const VERDICT_VETO: &str = "VETO";

/// Reviewer answer that lets a mission proceed.
pub const VERDICT_PROCEED: &str = "PROCEED";

/// Justification recorded when review is bypassed because no reviewer is
/// available.
pub const BYPASS_JUSTIFICATION: &str = "Policy reviewer not available. Bypassing review.";

/// Outcome of a policy review. Serialized as the 403 body on rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub approved: bool,
    pub justification: String,
}

impl Decision {
    pub fn approve(justification: impl Into<String>) -> Self {
        Self {
            approved: true,
            justification: justification.into(),
        }
    }

    pub fn veto(justification: impl Into<String>) -> Self {
        Self {
            approved: false,
            justification: justification.into(),
        }
    }

    /// Decision used when the gate runs in bypass mode without a reviewer.
    pub fn bypassed() -> Self {
        Self::approve(BYPASS_JUSTIFICATION)
    }
}

/// Build the prompt sent to the reviewer for a mission description.
pub fn review_prompt(mission: &str) -> String {
    format!(
        "Review the following mission description. If it violates ethical norms, \
         respond with only \"{VERDICT_VETO}\". Otherwise, respond with \"{VERDICT_PROCEED}\".\
         \n\nMission: \"{mission}\""
    )
}

/// Interpret a raw reviewer answer.
///
/// The normalized (trimmed, upper-cased) answer becomes the justification.
pub fn parse_verdict(answer: &str) -> Decision {
    let normalized = answer.trim().to_uppercase();
    if normalized.contains(VERDICT_VETO) {
        Decision::veto(normalized)
    } else {
        Decision::approve(normalized)
    }
}
