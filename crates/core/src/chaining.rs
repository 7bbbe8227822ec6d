//! Step input chaining.
//!
//! A task's effective input is its static seed input followed by the output
//! carried over from the previous step, joined by [`INPUT_SEPARATOR`].

/// Separator placed between a task's seed input and the carried output.
pub const INPUT_SEPARATOR: &str = "\n";

/// Compute the effective input for a step.
///
/// `carry` is `None` only for the first step, which receives exactly its
/// seed input. Later steps always get the carried output, even when the
/// previous step produced an empty string; an absent or empty seed is
/// omitted together with the separator.
pub fn effective_input(seed: Option<&str>, carry: Option<&str>) -> String {
    let seed = seed.filter(|s| !s.is_empty());
    match (seed, carry) {
        (Some(seed), Some(carry)) => format!("{seed}{INPUT_SEPARATOR}{carry}"),
        (Some(seed), None) => seed.to_string(),
        (None, Some(carry)) => carry.to_string(),
        (None, None) => String::new(),
    }
}
