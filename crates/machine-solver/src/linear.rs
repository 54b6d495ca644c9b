//! Counter mode as a linear system.
//!
//! Each position gives one equation: the sum of the application counts of the
//! options touching it equals its target. Gauss-Jordan elimination over exact
//! rationals splits the options into pivot columns, whose counts are affine in
//! the remaining free columns, and free columns, which must be searched.

use nalgebra::DMatrix;
use num::{rational::Rational64, One, Signed, Zero};
use num_integer::Integer;
use thiserror::Error;

use crate::machine::Machine;

/// Why the linear path could not produce a count vector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("the system has no solution over the rationals")]
    Inconsistent,
    #[error("{found} free variables exceed the limit of {limit}")]
    TooManyFreeVariables { found: usize, limit: usize },
    #[error("no free-variable assignment gives non-negative integral counts")]
    NoIntegralAssignment,
    #[error("the reconstructed counts do not reproduce the targets")]
    Unverified,
    #[error("a scaled coefficient does not fit in 64 bits")]
    Overflow,
}

/// Augmented matrix `[A | b]` in Reduced Row Echelon Form after [`LinearSystem::reduce`].
#[derive(Debug, Clone)]
pub struct LinearSystem {
    matrix: DMatrix<Rational64>,
    num_vars: usize,
    num_eqs: usize,
}

/// How one option's count is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Index into [`SolutionSpace::pivots`].
    Pivot(usize),
    /// Index into [`SolutionSpace::free`].
    Free(usize),
}

/// `scale * x[column] = constant - Σ coefficients[i] * x[free[i]]`, all integral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotEquation {
    pub column: usize,
    /// Always positive.
    pub scale: i64,
    pub constant: i64,
    /// Parallel to [`SolutionSpace::free`].
    pub coefficients: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionSpace {
    pub columns: Vec<Column>,
    pub pivots: Vec<PivotEquation>,
    /// Free option indices, ascending.
    pub free: Vec<usize>,
}

impl LinearSystem {
    pub fn new(machine: &Machine, targets: &[u32]) -> Self {
        let num_eqs = targets.len();
        let num_vars = machine.buttons().len();

        // Matrix dimensions: num_eqs x (num_vars + 1)
        let mut matrix = DMatrix::from_element(num_eqs, num_vars + 1, Rational64::zero());

        for (c, button) in machine.buttons().iter().enumerate() {
            for &pos in button.positions() {
                if pos < num_eqs {
                    matrix[(pos, c)] += Rational64::one();
                }
            }
        }
        for (r, &target) in targets.iter().enumerate() {
            matrix[(r, num_vars)] = Rational64::from_integer(i64::from(target));
        }

        Self {
            matrix,
            num_vars,
            num_eqs,
        }
    }

    /// Gauss-Jordan elimination with partial pivoting, then extraction of the
    /// pivot equations.
    #[tracing::instrument(level = "trace", skip_all, fields(eqs = self.num_eqs, vars = self.num_vars))]
    pub fn reduce(mut self) -> Result<SolutionSpace, Rejection> {
        let rhs = self.num_vars;
        let mut pivot_row = 0;
        let mut pivot_cols = Vec::new();
        let mut free = Vec::new();

        for c in 0..self.num_vars {
            if pivot_row >= self.num_eqs {
                free.push(c);
                continue;
            }

            // Largest magnitude at or below the pivot row
            let mut best = pivot_row;
            for r in (pivot_row + 1)..self.num_eqs {
                if self.matrix[(r, c)].abs() > self.matrix[(best, c)].abs() {
                    best = r;
                }
            }

            if self.matrix[(best, c)].is_zero() {
                free.push(c);
                continue;
            }

            self.matrix.swap_rows(pivot_row, best);

            let pivot = self.matrix[(pivot_row, c)];
            for j in c..=rhs {
                self.matrix[(pivot_row, j)] /= pivot;
            }

            // Eliminate both below AND above for RREF
            for i in 0..self.num_eqs {
                if i == pivot_row {
                    continue;
                }
                let factor = self.matrix[(i, c)];
                if factor.is_zero() {
                    continue;
                }
                for j in c..=rhs {
                    let delta = factor * self.matrix[(pivot_row, j)];
                    self.matrix[(i, j)] -= delta;
                }
            }

            pivot_cols.push(c);
            pivot_row += 1;
        }

        // 0 = b with b != 0
        if (pivot_row..self.num_eqs).any(|r| !self.matrix[(r, rhs)].is_zero()) {
            return Err(Rejection::Inconsistent);
        }

        let mut columns = vec![Column::Pivot(0); self.num_vars];
        for (i, &f) in free.iter().enumerate() {
            columns[f] = Column::Free(i);
        }

        let pivots = pivot_cols
            .iter()
            .enumerate()
            .map(|(r, &column)| {
                columns[column] = Column::Pivot(r);
                self.pivot_equation(r, column, &free)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SolutionSpace {
            columns,
            pivots,
            free,
        })
    }

    /// Clears the denominators of row `r`.
    fn pivot_equation(
        &self,
        r: usize,
        column: usize,
        free: &[usize],
    ) -> Result<PivotEquation, Rejection> {
        let rhs = self.matrix[(r, self.num_vars)];
        let coefficients: Vec<Rational64> = free.iter().map(|&f| self.matrix[(r, f)]).collect();

        let scale = coefficients
            .iter()
            .fold(*rhs.denom(), |acc, value| acc.lcm(value.denom()));

        let integral = |value: &Rational64| -> Result<i64, Rejection> {
            value
                .numer()
                .checked_mul(scale / value.denom())
                .ok_or(Rejection::Overflow)
        };

        Ok(PivotEquation {
            column,
            scale,
            constant: integral(&rhs)?,
            coefficients: coefficients.iter().map(integral).collect::<Result<_, _>>()?,
        })
    }
}

impl SolutionSpace {
    /// Full per-option counts for the given free values, or `None` when a pivot
    /// count comes out negative or fractional.
    pub fn evaluate(&self, free_values: &[u64]) -> Option<Vec<u64>> {
        let mut counts = vec![0u64; self.columns.len()];
        for (&f, &value) in self.free.iter().zip(free_values) {
            counts[f] = value;
        }

        for equation in &self.pivots {
            let numerator = equation
                .coefficients
                .iter()
                .zip(free_values)
                .fold(i128::from(equation.constant), |acc, (&coef, &value)| {
                    acc - i128::from(coef) * i128::from(value)
                });

            let (count, remainder) = numerator.div_rem(&i128::from(equation.scale));
            if remainder != 0 {
                return None;
            }
            counts[equation.column] = u64::try_from(count).ok()?;
        }

        Some(counts)
    }
}
