use std::{fmt, str::FromStr};

use bitvec::prelude::*;
use itertools::Itertools;

use crate::parse::{self, ParseError};

/// A bit vector backed by `usize` words with Least Significant Bit first ordering.
pub type Row = BitVec<usize, Lsb0>;

/// One selectable option: the positions a single application touches.
///
/// A position may be listed more than once. Every occurrence fires on its own,
/// so a doubled position is flipped twice (net no-op) in toggle mode and
/// incremented twice in counter mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    positions: Vec<usize>,
}

impl Button {
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Positions listed an odd number of times.
    pub fn toggle_mask(&self, len: usize) -> Row {
        let mut mask = Row::repeat(false, len);
        for &pos in &self.positions {
            if pos < len {
                let bit = mask[pos];
                mask.set(pos, !bit);
            }
        }
        mask
    }

    /// How much one application adds to each position.
    pub fn increments(&self, len: usize) -> Vec<u32> {
        let mut increments = vec![0; len];
        for &pos in &self.positions {
            if let Some(slot) = increments.get_mut(pos) {
                *slot += 1;
            }
        }
        increments
    }
}

/// One parsed puzzle instance. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    /// Goal for toggle mode.
    desired: Row,
    /// Goal for counter mode, parallel to `desired`.
    targets: Option<Vec<u32>>,
    buttons: Vec<Button>,
}

impl Machine {
    /// Builds a machine, silently dropping option indices outside the state.
    pub fn new<D, B>(desired: D, targets: Option<Vec<u32>>, buttons: B) -> Result<Self, ParseError>
    where
        D: IntoIterator<Item = bool>,
        B: IntoIterator<Item = Vec<usize>>,
    {
        let desired: Row = desired.into_iter().collect();
        let len = desired.len();

        if let Some(targets) = &targets {
            if targets.len() != len {
                return Err(ParseError::DimensionMismatch {
                    desired: len,
                    targets: targets.len(),
                });
            }
        }

        let buttons = buttons
            .into_iter()
            .map(|positions| Button {
                positions: positions.into_iter().filter(|&pos| pos < len).collect(),
            })
            .collect();

        Ok(Self {
            desired,
            targets,
            buttons,
        })
    }

    /// Number of cells in the state vector.
    pub fn positions(&self) -> usize {
        self.desired.len()
    }

    pub fn desired(&self) -> &Row {
        &self.desired
    }

    pub fn targets(&self) -> Option<&[u32]> {
        self.targets.as_deref()
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// Flips every position `button` touches, once per listed occurrence.
    pub fn apply_toggle(&self, state: &mut BitSlice<usize, Lsb0>, button: usize) {
        let Some(button) = self.buttons.get(button) else {
            return;
        };
        for &pos in &button.positions {
            if pos < state.len() {
                let bit = state[pos];
                state.set(pos, !bit);
            }
        }
    }

    /// Increments every position `button` touches, once per listed occurrence.
    pub fn apply_counter(&self, counts: &mut [u32], button: usize) {
        let Some(button) = self.buttons.get(button) else {
            return;
        };
        for &pos in &button.positions {
            if let Some(count) = counts.get_mut(pos) {
                *count += 1;
            }
        }
    }
}

impl FromStr for Machine {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse_machine(s)
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let diagram: String = self
            .desired
            .iter()
            .map(|bit| if *bit { '#' } else { '.' })
            .collect();
        write!(f, "[{diagram}]")?;
        for button in &self.buttons {
            write!(f, " ({})", button.positions.iter().join(","))?;
        }
        if let Some(targets) = &self.targets {
            write!(f, " {{{}}}", targets.iter().join(","))?;
        }
        Ok(())
    }
}
