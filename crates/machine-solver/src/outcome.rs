use std::{fmt, str::FromStr};

use miette::Diagnostic;
use thiserror::Error;

// -----------------------------------------------------------------------------
// Limits
// -----------------------------------------------------------------------------

/// Largest number of free columns the linear path will enumerate.
pub const DEFAULT_MAX_FREE_VARIABLES: usize = 4;

/// Ceiling on distinct states the counter fallback may record.
pub const DEFAULT_MAX_VISITED_STATES: usize = 5_000_000;

/// Ceiling on states the counter fallback may dequeue and expand.
pub const DEFAULT_MAX_EXPANDED_STATES: usize = 10_000_000;

/// Resource bounds for counter-mode solving.
///
/// Every bound is a counter rather than a clock, so the same machine and the
/// same limits always produce the same outcome regardless of host speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_free_variables: usize,
    pub max_visited_states: usize,
    pub max_expanded_states: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_free_variables: DEFAULT_MAX_FREE_VARIABLES,
            max_visited_states: DEFAULT_MAX_VISITED_STATES,
            max_expanded_states: DEFAULT_MAX_EXPANDED_STATES,
        }
    }
}

impl Limits {
    pub fn with_max_free_variables(mut self, max: usize) -> Self {
        self.max_free_variables = max;
        self
    }

    pub fn with_max_visited_states(mut self, max: usize) -> Self {
        self.max_visited_states = max;
        self
    }

    pub fn with_max_expanded_states(mut self, max: usize) -> Self {
        self.max_expanded_states = max;
        self
    }
}

// -----------------------------------------------------------------------------
// Results
// -----------------------------------------------------------------------------

/// A successful solve: the option applied at every step, in replay order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Zero-based option indices.
    selections: Vec<usize>,
}

impl Solution {
    pub fn new(selections: Vec<usize>) -> Self {
        Self { selections }
    }

    /// Expands per-option counts into selections, option-index ascending.
    pub fn from_counts(counts: &[u64]) -> Self {
        let selections = counts
            .iter()
            .enumerate()
            .flat_map(|(button, &count)| std::iter::repeat(button).take(count as usize))
            .collect();
        Self { selections }
    }

    pub fn selections(&self) -> &[usize] {
        &self.selections
    }

    /// One-based option numbers, as shown to users.
    pub fn option_numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.selections.iter().map(|&button| button + 1)
    }

    pub fn total_applications(&self) -> usize {
        self.selections.len()
    }

    /// How many times each of the first `buttons` options was applied.
    pub fn counts(&self, buttons: usize) -> Vec<u64> {
        let mut counts = vec![0; buttons];
        for &button in &self.selections {
            if let Some(count) = counts.get_mut(button) {
                *count += 1;
            }
        }
        counts
    }
}

/// What a solve produced. Callers must branch on all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Solved(Solution),
    /// No sequence of applications reaches the goal.
    Unsolvable,
    /// A ceiling from [`Limits`] was hit before the search could decide.
    ResourceExhausted,
}

impl Outcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Outcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn total_applications(&self) -> Option<usize> {
        self.solution().map(Solution::total_applications)
    }
}

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("counter mode needs target counts, but the machine has no `{{...}}` group")]
    #[diagnostic(code(machine_solver::missing_target_counts))]
    MissingTargetCounts,
}

// -----------------------------------------------------------------------------
// Mode
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Each application flips the positions an option touches.
    #[default]
    Toggle,
    /// Each application increments the positions an option touches.
    Counter,
}

#[derive(Debug, Error, Diagnostic)]
#[error("unknown mode {0:?}")]
#[diagnostic(
    code(machine_solver::unknown_mode),
    help("expected `toggle` or `counter`")
)]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toggle" => Ok(Mode::Toggle),
            "counter" => Ok(Mode::Counter),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Toggle => f.write_str("toggle"),
            Mode::Counter => f.write_str("counter"),
        }
    }
}
