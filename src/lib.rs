//! Column dtype inference and missing-value factor detection for sample metadata.
//!
//! A run is four stages over one [`Table`]:
//!
//! 1. [`scan()`] tags each column `float64`, `object` or `check` and harvests
//!    candidate missing factors ("not provided", "unknown", ...);
//! 2. [`confirm()`] keeps the factors found in more columns than a threshold;
//! 3. [`finalize()`] substitutes confirmed factors and settles every column on
//!    `O` (textual) or `Q` (quantitative);
//! 4. [`rewrite()`] coerces the cells of each column to that dtype.
//!
//! [`pipeline::clean_table`] chains all four.

pub mod clean;
pub mod cli;
pub mod data;
pub mod dtypes;
pub mod error;
pub mod finalize;
pub mod frequency;
pub mod io_utils;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod rewrite;
pub mod scan;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

pub use crate::{
    data::Value,
    dtypes::{FinalType, FinalTypes, IdentifierColumns, TypeTag},
    error::DtypeError,
    finalize::{ToNan, finalize},
    frequency::{ConfirmedFactors, confirm},
    rewrite::rewrite,
    scan::{CandidateUnknowns, ScanOutcome, scan},
    table::{Column, Table},
};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("md_dtypes", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Probe(args) => probe::execute(&args),
        Commands::Factors(args) => probe::execute_factors(&args),
        Commands::Clean(args) => clean::execute(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
