use itertools::Itertools;

use crate::{
    linear::{Rejection, SolutionSpace},
    machine::Button,
};

/// Largest count a free option can take in any exact solution.
///
/// Every coefficient is non-negative, so an option can never be applied more
/// often than the smallest target among the positions it touches. An option
/// touching nothing only adds cost and is pinned to zero.
fn upper_bound(button: &Button, targets: &[u32]) -> u64 {
    let largest = targets.iter().copied().max().unwrap_or(0);
    button
        .positions()
        .iter()
        .filter_map(|&pos| targets.get(pos).copied())
        .min()
        .map_or(0, |smallest| smallest.min(largest))
        .into()
}

/// Exhaustively enumerates the bounded grid of free-variable values and keeps
/// the valid count vector with the smallest total.
///
/// Ties keep the first candidate in enumeration order, which is lexicographic
/// in the free values.
#[tracing::instrument(level = "debug", skip_all, fields(free = space.free.len()))]
pub fn minimize(
    space: &SolutionSpace,
    buttons: &[Button],
    targets: &[u32],
    max_free_variables: usize,
) -> Result<Vec<u64>, Rejection> {
    let k = space.free.len();
    if k > max_free_variables {
        return Err(Rejection::TooManyFreeVariables {
            found: k,
            limit: max_free_variables,
        });
    }

    if k == 0 {
        return space.evaluate(&[]).ok_or(Rejection::NoIntegralAssignment);
    }

    let bounds: Vec<u64> = space
        .free
        .iter()
        .map(|&f| upper_bound(&buttons[f], targets))
        .collect();
    tracing::trace!(?bounds, "enumerating free variables");

    bounds
        .iter()
        .map(|&bound| 0..=bound)
        .multi_cartesian_product()
        .filter_map(|values| space.evaluate(&values))
        .min_by_key(|counts| counts.iter().sum::<u64>())
        .ok_or(Rejection::NoIntegralAssignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    use miette::Result;
    use rstest::rstest;

    use crate::{linear::LinearSystem, machine::Machine};

    fn minimize_line(
        line: &str,
        max_free_variables: usize,
    ) -> Result<std::result::Result<Vec<u64>, Rejection>> {
        let machine: Machine = line.parse()?;
        let targets = machine.targets().unwrap_or_default();
        let space = LinearSystem::new(&machine, targets)
            .reduce()
            .map_err(|rejection| miette::miette!("{rejection}"))?;
        Ok(minimize(&space, machine.buttons(), targets, max_free_variables))
    }

    #[rstest]
    #[case("[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}", 10)]
    #[case("[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}", 12)]
    #[case("[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}", 11)]
    fn reference_fixtures(#[case] line: &str, #[case] expected: u64) -> Result<()> {
        let counts = minimize_line(line, 4)?.map_err(|rejection| miette::miette!("{rejection}"))?;
        assert_eq!(counts.iter().sum::<u64>(), expected);
        Ok(())
    }

    #[test]
    fn prefers_combined_option() -> Result<()> {
        // (0,1) once beats (0) and (1) once each.
        let counts = minimize_line("[..] (0) (1) (0,1) {1,1}", 4)?;
        assert_eq!(counts, Ok(vec![0, 0, 1]));
        Ok(())
    }

    #[test]
    fn too_many_free_variables() -> Result<()> {
        let result = minimize_line("[.] (0) (0) (0) {2}", 1)?;
        assert_eq!(
            result,
            Err(Rejection::TooManyFreeVariables { found: 2, limit: 1 })
        );
        Ok(())
    }

    #[test]
    fn no_integral_assignment() -> Result<()> {
        let result = minimize_line("[.] (0,0) {3}", 4)?;
        assert_eq!(result, Err(Rejection::NoIntegralAssignment));
        Ok(())
    }

    #[rstest]
    #[case(&[0, 2], &[4, 9, 1], 1)]
    #[case(&[1], &[4, 9, 1], 9)]
    #[case(&[], &[4, 9, 1], 0)]
    fn bounds(
        #[case] positions: &[usize],
        #[case] targets: &[u32],
        #[case] expected: u64,
    ) -> Result<()> {
        let machine = Machine::new([false; 3], None, vec![positions.to_vec()])?;
        assert_eq!(upper_bound(&machine.buttons()[0], targets), expected);
        Ok(())
    }
}
