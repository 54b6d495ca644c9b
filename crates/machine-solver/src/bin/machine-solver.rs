use std::time::Instant;

use indicatif::ParallelProgressIterator;
use itertools::Itertools;
use miette::*;
use rayon::prelude::*;

use machine_solver::{
    batch::{self, Summary},
    Limits, Mode, Outcome,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| miette!("usage: machine-solver <path> [toggle|counter]"))?;
    let mode = args
        .next()
        .map(|mode| mode.parse::<Mode>())
        .transpose()?
        .unwrap_or_default();

    let input = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {path}"))?;

    let limits = Limits::default();
    let entries = batch::load(&input);

    let reports: Vec<_> = entries
        .par_iter()
        .progress_count(entries.len() as u64)
        .map(|entry| {
            let start = Instant::now();
            let report = entry.run(mode, &limits);
            (report, start.elapsed())
        })
        .collect();

    for (report, elapsed) in &reports {
        let line = report.line_number;
        let seconds = elapsed.as_secs_f64();
        match &report.result {
            Ok(Outcome::Solved(solution)) => println!(
                "Line {line}: {} selections - options [{}] ({seconds:.2}s)",
                solution.total_applications(),
                solution.option_numbers().join(", "),
            ),
            Ok(Outcome::Unsolvable) => println!("Line {line}: no solution found ({seconds:.2}s)"),
            Ok(Outcome::ResourceExhausted) => {
                println!("Line {line}: search limit reached ({seconds:.2}s)")
            }
            Err(_) => {
                if let Some(error) = report.error_report() {
                    println!("Line {line}: {error:?}");
                }
            }
        }
    }

    let summary = Summary::from_reports(reports.iter().map(|(report, _)| report));
    println!("Total selections: {}", summary.total_applications);
    Ok(())
}
