//! Mission and agent submission validation.
//!
//! Runs before the policy gate so malformed submissions are rejected without
//! consulting the reviewer or touching the store.

use std::collections::HashSet;

use crate::error::CoreError;

/// Maximum length of agent and mission names.
pub const MAX_NAME_LEN: usize = 255;

/// Validate an agent or mission name.
pub fn validate_name(field: &str, name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the step numbers of a mission's task list.
///
/// Step numbers only need to define a strict total order: they must be
/// unique, but gaps are allowed and the input order does not matter.
pub fn validate_step_numbers<I>(steps: I) -> Result<(), CoreError>
where
    I: IntoIterator<Item = i32>,
{
    let mut seen = HashSet::new();
    for step in steps {
        if !seen.insert(step) {
            return Err(CoreError::Validation(format!(
                "duplicate step_number {step}"
            )));
        }
    }
    Ok(())
}
