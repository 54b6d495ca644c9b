pub mod batch;
pub mod counter;
pub mod free_vars;
pub mod linear;
pub mod machine;
pub mod outcome;
pub mod parse;
mod search;
pub mod toggle;

pub use counter::{solve_counter, solve_counter_bfs};
pub use machine::{Button, Machine, Row};
pub use outcome::{Limits, Mode, Outcome, Solution, SolveError};
pub use parse::{parse_machine, ParseError};
pub use toggle::solve_toggle;

/// Solves one machine in the given mode.
pub fn solve(machine: &Machine, mode: Mode, limits: &Limits) -> Result<Outcome, SolveError> {
    match mode {
        Mode::Toggle => Ok(solve_toggle(machine)),
        Mode::Counter => solve_counter(machine, limits),
    }
}
