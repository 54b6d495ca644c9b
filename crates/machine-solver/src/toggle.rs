use crate::{
    machine::{Machine, Row},
    outcome::{Outcome, Solution},
    search::{breadth_first, Budget, Search},
};

/// Finds the fewest option applications that turn the all-off state into the
/// machine's desired state.
///
/// The state space is at most `2^positions`, so the search runs unbounded and
/// `Unsolvable` is always a proof: the desired state lies outside the group
/// generated by the options under XOR.
#[tracing::instrument(skip_all, fields(positions = machine.positions(), buttons = machine.buttons().len()))]
pub fn solve_toggle(machine: &Machine) -> Outcome {
    let len = machine.positions();
    let masks: Vec<Row> = machine
        .buttons()
        .iter()
        .map(|button| button.toggle_mask(len))
        .collect();

    let start = Row::repeat(false, len);
    let search = breadth_first(
        start,
        machine.desired(),
        masks.len(),
        Budget::unbounded(),
        |state, button| {
            let mut next = state.clone();
            next ^= &masks[button];
            Some(next)
        },
    );

    match search {
        Search::Found(path) => {
            tracing::debug!(applications = path.len(), "toggle goal reached");
            Outcome::Solved(Solution::new(path))
        }
        Search::Exhausted { visited } => {
            tracing::debug!(visited, "toggle goal unreachable");
            Outcome::Unsolvable
        }
        // Unbounded budget: never hit.
        Search::LimitReached { .. } => Outcome::ResourceExhausted,
    }
}
