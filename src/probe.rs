use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::{FactorsArgs, ProbeArgs},
    io_utils,
    pipeline::{self, ProbeOutcome},
    report::{self, DtypeReport},
};

pub fn execute(args: &ProbeArgs) -> Result<()> {
    let options = args.inference.resolve()?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let table = io_utils::read_table(&args.input, delimiter, encoding, &options.na_tokens)?;

    let outcome = pipeline::probe_table(&table, &options)
        .with_context(|| format!("Probing {:?}", args.input))?;
    let report = DtypeReport::from_probe(&outcome);
    report::print_table(&DtypeReport::column_headers(), &report.column_rows());
    print_confirmed(&outcome);

    if let Some(path) = &args.report {
        report
            .save(path)
            .with_context(|| format!("Writing dtype report to {path:?}"))?;
        info!("Dtype report written to {path:?}");
    }
    Ok(())
}

pub fn execute_factors(args: &FactorsArgs) -> Result<()> {
    let options = args.inference.resolve()?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let table = io_utils::read_table(&args.input, delimiter, encoding, &options.na_tokens)?;

    let outcome = pipeline::probe_table(&table, &options)
        .with_context(|| format!("Collecting missing-value factors from {:?}", args.input))?;
    let report = DtypeReport::from_probe(&outcome);
    if report.candidate_unknowns.is_empty() {
        info!("No candidate missing-value factors found in {:?}", args.input);
    } else {
        report::print_table(&DtypeReport::factor_headers(), &report.factor_rows());
    }

    if args.show_matches {
        let rows = report
            .nan_diversity
            .iter()
            .map(|value| vec![value.clone()])
            .collect::<Vec<_>>();
        println!();
        report::print_table(&["pattern match".to_string()], &rows);
    }
    info!(
        "{} candidate factor(s), {} confirmed at threshold {}",
        report.candidate_unknowns.len(),
        outcome.confirmed.len(),
        options.threshold
    );
    Ok(())
}

fn print_confirmed(outcome: &ProbeOutcome) {
    if outcome.confirmed.is_empty() {
        info!("No missing-value factor recurs often enough to be confirmed");
        return;
    }
    let rows = outcome
        .confirmed
        .iter()
        .map(|(factor, count)| vec![factor.to_string(), count.to_string()])
        .collect::<Vec<_>>();
    println!();
    report::print_table(&["confirmed factor".to_string(), "columns".to_string()], &rows);
}
