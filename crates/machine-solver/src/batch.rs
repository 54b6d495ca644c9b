//! Line-oriented batches of machines.
//!
//! Every line is parsed and solved on its own; a malformed or unsolvable line
//! is reported and the rest of the batch carries on.

use miette::Diagnostic;
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    machine::Machine,
    outcome::{Limits, Mode, Outcome, SolveError},
    parse::{parse_machine, ParseError},
};

/// One non-blank input line and what it parsed into.
#[derive(Debug)]
pub struct Entry<'a> {
    /// 1-based, counting blank lines.
    pub line_number: usize,
    pub source: &'a str,
    pub machine: Result<Machine, ParseError>,
}

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Solve(#[from] SolveError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReport {
    pub line_number: usize,
    pub source: String,
    pub result: Result<Outcome, LineError>,
}

impl LineReport {
    /// The error as a report carrying its line, so labels render in place.
    pub fn error_report(&self) -> Option<miette::Report> {
        self.result
            .as_ref()
            .err()
            .map(|error| {
                miette::Report::new(error.clone()).with_source_code(self.source.clone())
            })
    }
}

/// Splits `input` into trimmed, non-blank lines and parses each of them.
pub fn load(input: &str) -> Vec<Entry<'_>> {
    input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_number, source)| Entry {
            line_number,
            source,
            machine: parse_machine(source),
        })
        .collect()
}

impl Entry<'_> {
    pub fn run(&self, mode: Mode, limits: &Limits) -> LineReport {
        let result = match &self.machine {
            Ok(machine) => crate::solve(machine, mode, limits).map_err(LineError::from),
            Err(error) => Err(LineError::from(error.clone())),
        };

        LineReport {
            line_number: self.line_number,
            source: self.source.to_string(),
            result,
        }
    }
}

/// Solves every line in parallel. Reports come back in input order.
#[tracing::instrument(skip(input))]
pub fn solve_all(input: &str, mode: Mode, limits: &Limits) -> Vec<LineReport> {
    load(input)
        .par_iter()
        .map(|entry| entry.run(mode, limits))
        .collect()
}

/// Caller-side tally over a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub solved: usize,
    pub unsolvable: usize,
    pub exhausted: usize,
    pub failed: usize,
    /// Sum over solved lines only.
    pub total_applications: usize,
}

impl Summary {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a LineReport>) -> Self {
        reports
            .into_iter()
            .fold(Self::default(), |mut summary, report| {
                match &report.result {
                    Ok(Outcome::Solved(solution)) => {
                        summary.solved += 1;
                        summary.total_applications += solution.total_applications();
                    }
                    Ok(Outcome::Unsolvable) => summary.unsolvable += 1,
                    Ok(Outcome::ResourceExhausted) => summary.exhausted += 1,
                    Err(_) => summary.failed += 1,
                }
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    const INPUT: &str = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";

    fn applications(report: &LineReport) -> Option<usize> {
        report
            .result
            .as_ref()
            .ok()
            .and_then(Outcome::total_applications)
    }

    #[rstest]
    #[case(Mode::Toggle, 7)]
    #[case(Mode::Counter, 33)]
    fn it_works(#[case] mode: Mode, #[case] expected: usize) {
        let reports = solve_all(INPUT, mode, &Limits::default());
        let summary = Summary::from_reports(&reports);
        assert_eq!(summary.solved, 3);
        assert_eq!(summary.total_applications, expected);
    }

    #[test]
    fn bad_lines_do_not_abort_the_batch() {
        let input = "
  [.##.] (3) (1,3) (2) (2,3) (0,2) (0,1)

(0,1) {1}
[#x] (0)
[.#.#] (0) (2)
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4)
";
        let reports = solve_all(input, Mode::Toggle, &Limits::default());
        let line_numbers: Vec<usize> = reports.iter().map(|r| r.line_number).collect();
        assert_eq!(line_numbers, vec![2, 4, 5, 6, 7]);

        assert_eq!(applications(&reports[0]), Some(2));
        assert_eq!(
            reports[1].result,
            Err(LineError::Parse(ParseError::MissingDesiredState))
        );
        assert!(matches!(
            reports[2].result,
            Err(LineError::Parse(ParseError::InvalidStateChar { found: 'x', .. }))
        ));
        assert_eq!(reports[3].result, Ok(Outcome::Unsolvable));
        assert_eq!(applications(&reports[4]), Some(3));
        assert!(reports[2].error_report().is_some());
        assert!(reports[4].error_report().is_none());

        let summary = Summary::from_reports(&reports);
        assert_eq!(
            summary,
            Summary {
                solved: 2,
                unsolvable: 1,
                exhausted: 0,
                failed: 2,
                total_applications: 5,
            }
        );
    }

    #[test]
    fn counter_mode_without_targets_fails_per_line() {
        let reports = solve_all("[#] (0)\n[#] (0) {2}", Mode::Counter, &Limits::default());
        assert_eq!(
            reports[0].result,
            Err(LineError::Solve(SolveError::MissingTargetCounts))
        );
        assert_eq!(applications(&reports[1]), Some(2));
    }
}
