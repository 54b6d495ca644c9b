use crate::{
    free_vars,
    linear::{LinearSystem, Rejection},
    machine::Machine,
    outcome::{Limits, Outcome, Solution, SolveError},
    search::{breadth_first, Budget, Search},
};

/// Finds the fewest option applications whose increments sum exactly to the
/// machine's target counts.
///
/// The linear path (elimination, then free-variable enumeration) runs first.
/// Any rejection throws its partial work away and restarts from scratch with
/// [`solve_counter_bfs`]; the two paths are never combined.
#[tracing::instrument(skip_all, fields(positions = machine.positions(), buttons = machine.buttons().len()))]
pub fn solve_counter(machine: &Machine, limits: &Limits) -> Result<Outcome, SolveError> {
    let targets = machine.targets().ok_or(SolveError::MissingTargetCounts)?;

    match solve_linear(machine, targets, limits) {
        Ok(counts) => {
            let solution = Solution::from_counts(&counts);
            tracing::debug!(
                applications = solution.total_applications(),
                "solved by elimination"
            );
            Ok(Outcome::Solved(solution))
        }
        Err(rejection) => {
            tracing::debug!(
                %rejection,
                "elimination rejected, falling back to breadth-first search"
            );
            Ok(bfs(machine, targets, limits))
        }
    }
}

/// Breadth-first search over count vectors, component-wise bounded by the
/// targets.
///
/// Hitting a ceiling in `limits` yields [`Outcome::ResourceExhausted`] rather
/// than [`Outcome::Unsolvable`]: only a search that drains its whole bounded
/// space proves there is no solution.
#[tracing::instrument(skip_all, fields(positions = machine.positions(), buttons = machine.buttons().len()))]
pub fn solve_counter_bfs(machine: &Machine, limits: &Limits) -> Result<Outcome, SolveError> {
    let targets = machine.targets().ok_or(SolveError::MissingTargetCounts)?;
    Ok(bfs(machine, targets, limits))
}

fn solve_linear(
    machine: &Machine,
    targets: &[u32],
    limits: &Limits,
) -> Result<Vec<u64>, Rejection> {
    let space = LinearSystem::new(machine, targets).reduce()?;
    let counts = free_vars::minimize(
        &space,
        machine.buttons(),
        targets,
        limits.max_free_variables,
    )?;

    if !reproduces(machine, targets, &counts) {
        return Err(Rejection::Unverified);
    }
    Ok(counts)
}

/// Integer check of the reconstructed counts against the targets.
fn reproduces(machine: &Machine, targets: &[u32], counts: &[u64]) -> bool {
    let mut totals = vec![0u64; targets.len()];
    for (button, &count) in machine.buttons().iter().zip(counts) {
        for &pos in button.positions() {
            if let Some(total) = totals.get_mut(pos) {
                *total += count;
            }
        }
    }
    totals
        .iter()
        .zip(targets)
        .all(|(&total, &target)| total == u64::from(target))
}

fn bfs(machine: &Machine, targets: &[u32], limits: &Limits) -> Outcome {
    let len = targets.len();
    let increments: Vec<Vec<u32>> = machine
        .buttons()
        .iter()
        .map(|button| button.increments(len))
        .collect();

    let budget = Budget {
        max_visited: Some(limits.max_visited_states),
        max_expanded: Some(limits.max_expanded_states),
    };
    let goal = targets.to_vec();

    let search = breadth_first(
        vec![0u32; len],
        &goal,
        increments.len(),
        budget,
        |state, button| {
            let mut next = state.clone();
            for ((count, &step), &target) in
                next.iter_mut().zip(&increments[button]).zip(targets)
            {
                *count += step;
                // Overshooting any target can never be undone.
                if *count > target {
                    return None;
                }
            }
            Some(next)
        },
    );

    match search {
        Search::Found(path) => Outcome::Solved(Solution::new(path)),
        Search::Exhausted { visited } => {
            tracing::debug!(visited, "counter goal unreachable");
            Outcome::Unsolvable
        }
        Search::LimitReached { visited, expanded } => {
            tracing::warn!(visited, expanded, "search ceiling reached");
            Outcome::ResourceExhausted
        }
    }
}
