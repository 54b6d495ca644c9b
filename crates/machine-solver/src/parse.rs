//! Parsing of a single machine specification line.
//!
//! ```text
//! [.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
//! ```
//!
//! The grammar only fixes the group structure; the contents of each group are
//! validated afterwards so that every failure maps onto a typed [`ParseError`]
//! pointing at the offending bytes.

use std::str::FromStr;

use chumsky::prelude::*;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::machine::Machine;

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing desired state")]
    #[diagnostic(
        code(machine_solver::missing_desired_state),
        help("a machine starts with a `[...]` group of `#` and `.`")
    )]
    MissingDesiredState,

    #[error("invalid character {found:?} in desired state")]
    #[diagnostic(code(machine_solver::invalid_state_char))]
    InvalidStateChar {
        found: char,
        #[label("expected `#` or `.`")]
        span: SourceSpan,
    },

    #[error("invalid number {token:?}")]
    #[diagnostic(code(machine_solver::invalid_number))]
    InvalidNumber {
        token: String,
        #[label("not a non-negative integer")]
        span: SourceSpan,
    },

    #[error("desired state has {desired} positions but {targets} target counts were given")]
    #[diagnostic(code(machine_solver::dimension_mismatch))]
    DimensionMismatch { desired: usize, targets: usize },

    #[error("malformed machine specification: {reason}")]
    #[diagnostic(code(machine_solver::syntax))]
    Syntax {
        reason: String,
        #[label("here")]
        span: SourceSpan,
    },
}

/// A delimited group before its contents are checked.
#[derive(Debug, Clone, Copy)]
struct Group<'a> {
    text: &'a str,
    /// Byte offset of `text` within the line.
    offset: usize,
}

#[derive(Debug)]
struct RawMachine<'a> {
    diagram: Group<'a>,
    buttons: Vec<Group<'a>>,
    targets: Option<Group<'a>>,
}

fn group<'a>(
    open: char,
    close: char,
) -> impl Parser<'a, &'a str, Group<'a>, extra::Err<Rich<'a, char>>> + Clone {
    any()
        .filter(move |c: &char| *c != close)
        .repeated()
        .to_slice()
        .map_with(|text: &'a str, e: &mut chumsky::input::MapExtra<'a, '_, &'a str, extra::Err<Rich<'a, char>>>| Group {
            text,
            offset: e.span().start,
        })
        .delimited_by(just(open), just(close))
}

fn parser<'a>() -> impl Parser<'a, &'a str, RawMachine<'a>, extra::Err<Rich<'a, char>>> {
    // Custom whitespace parser that excludes newlines
    let hspace = any().filter(|c: &char| *c == ' ' || *c == '\t').repeated();

    // [.##.]
    let diagram = group('[', ']');

    // (0,2) (1,3) ...
    let buttons = group('(', ')')
        .padded_by(hspace.clone())
        .repeated()
        .collect::<Vec<_>>();

    // {3,5,4,7}
    let targets = group('{', '}').or_not();

    hspace
        .clone()
        .ignore_then(diagram)
        .then_ignore(hspace.clone())
        .then(buttons)
        .then(targets)
        .then_ignore(hspace)
        .then_ignore(end())
        .map(|((diagram, buttons), targets)| RawMachine {
            diagram,
            buttons,
            targets,
        })
}

/// Parses one specification line. Total over arbitrary input.
pub fn parse_machine(line: &str) -> Result<Machine, ParseError> {
    if !(line.contains('[') && line.contains(']')) {
        return Err(ParseError::MissingDesiredState);
    }

    let raw = parser().parse(line).into_result().map_err(|errors| {
        match errors.into_iter().next() {
            Some(error) => {
                let span = error.span();
                ParseError::Syntax {
                    reason: error.to_string(),
                    span: (span.start, span.end - span.start).into(),
                }
            }
            None => ParseError::Syntax {
                reason: "unexpected input".to_string(),
                span: (0, line.len()).into(),
            },
        }
    })?;

    let desired = lights(raw.diagram)?;
    let buttons = raw
        .buttons
        .into_iter()
        .map(numbers::<usize>)
        .collect::<Result<Vec<_>, _>>()?;
    let targets = raw.targets.map(numbers::<u32>).transpose()?;

    Machine::new(desired, targets, buttons)
}

fn lights(group: Group<'_>) -> Result<Vec<bool>, ParseError> {
    group
        .text
        .char_indices()
        .map(|(i, c)| match c {
            '#' => Ok(true),
            '.' => Ok(false),
            found => Err(ParseError::InvalidStateChar {
                found,
                span: (group.offset + i, found.len_utf8()).into(),
            }),
        })
        .collect()
}

/// Comma-separated integers. Empty tokens are skipped.
fn numbers<T: FromStr>(group: Group<'_>) -> Result<Vec<T>, ParseError> {
    let mut values = Vec::new();
    let mut cursor = group.offset;

    for part in group.text.split(',') {
        let token = part.trim();
        if !token.is_empty() {
            let start = cursor + (part.len() - part.trim_start().len());
            let value = token.parse().map_err(|_| ParseError::InvalidNumber {
                token: token.to_string(),
                span: (start, token.len()).into(),
            })?;
            values.push(value);
        }
        cursor += part.len() + 1;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    use miette::Result;
    use rstest::rstest;

    #[rstest]
    #[case("[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}", 4, 6)]
    #[case("[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}", 5, 5)]
    #[case("[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}", 6, 4)]
    fn parses_reference_lines(
        #[case] line: &str,
        #[case] positions: usize,
        #[case] buttons: usize,
    ) -> Result<()> {
        let machine = parse_machine(line)?;
        assert_eq!(machine.positions(), positions);
        assert_eq!(machine.buttons().len(), buttons);
        assert_eq!(machine.targets().map(<[u32]>::len), Some(positions));
        Ok(())
    }

    #[test]
    fn desired_state_bits() -> Result<()> {
        let machine = parse_machine("[.##.] (3)")?;
        let bits: Vec<bool> = machine.desired().iter().map(|b| *b).collect();
        assert_eq!(bits, vec![false, true, true, false]);
        assert_eq!(machine.targets(), None);
        Ok(())
    }

    #[test]
    fn empty_groups_keep_option_numbering() -> Result<()> {
        let machine = parse_machine("[##] () (0,,1)")?;
        assert_eq!(machine.buttons().len(), 2);
        assert!(machine.buttons()[0].positions().is_empty());
        assert_eq!(machine.buttons()[1].positions(), &[0, 1]);
        Ok(())
    }

    #[rstest]
    #[case("(0,1) {1,2}")]
    #[case("")]
    #[case(".##. (0)")]
    fn missing_desired_state(#[case] line: &str) {
        assert_eq!(parse_machine(line), Err(ParseError::MissingDesiredState));
    }

    #[test]
    fn invalid_state_char_points_at_char() {
        let err = parse_machine("[.#x.] (0)").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidStateChar {
                found: 'x',
                span: (3, 1).into()
            }
        );
    }

    #[rstest]
    #[case("[..] (0,a)", "a", 8)]
    #[case("[..] (0) (-1)", "-1", 10)]
    #[case("[..] (0) { 1, two}", "two", 14)]
    fn invalid_number(#[case] line: &str, #[case] token: &str, #[case] offset: usize) {
        let err = parse_machine(line).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                token: token.to_string(),
                span: (offset, token.len()).into()
            }
        );
    }

    #[test]
    fn dimension_mismatch() {
        let err = parse_machine("[...] (0) {1,2}").unwrap_err();
        assert_eq!(
            err,
            ParseError::DimensionMismatch {
                desired: 3,
                targets: 2
            }
        );
    }

    #[rstest]
    #[case("[..] (0")]
    #[case("[..] (0) garbage")]
    #[case("[..] {1,2} (0)")]
    fn malformed_structure(#[case] line: &str) {
        assert!(matches!(
            parse_machine(line),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn parse_is_idempotent_on_normalized_input() -> Result<()> {
        let line = "[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";
        let machine = parse_machine(line)?;
        assert_eq!(machine.to_string(), line);
        assert_eq!(parse_machine(&machine.to_string())?, machine);
        Ok(())
    }
}
