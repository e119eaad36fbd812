use anyhow::{Context, Result};
use log::{debug, info};

use crate::{cli::CleanArgs, io_utils, pipeline, report::DtypeReport};

pub fn execute(args: &CleanArgs) -> Result<()> {
    let options = args.inference.resolve()?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let input_encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let output_path = args.output.as_deref();
    let output_delimiter =
        io_utils::resolve_output_delimiter(output_path, args.output_delimiter, delimiter);

    info!(
        "Cleaning '{}' with delimiter '{}'",
        args.input.display(),
        crate::printable_delimiter(delimiter)
    );
    let table = io_utils::read_table(&args.input, delimiter, input_encoding, &options.na_tokens)?;
    let outcome = pipeline::clean_table(table, &options)
        .with_context(|| format!("Cleaning {:?}", args.input))?;
    for (from, _) in outcome.to_nan.iter() {
        debug!("Replacing '{from}' with native missing");
    }

    io_utils::write_table(&outcome.table, output_path, output_delimiter, output_encoding)?;
    if let Some(path) = &args.report {
        DtypeReport::from_clean(&outcome)
            .save(path)
            .with_context(|| format!("Writing dtype report to {path:?}"))?;
        info!("Dtype report written to {path:?}");
    }
    Ok(())
}
