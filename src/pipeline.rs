//! End-to-end run of the four dtype stages plus the options that drive it.
//!
//! The stages themselves never decide what a missing factor is replaced with;
//! [`build_to_nan`] is the policy used by the command line: every spelling of a
//! confirmed factor becomes a native missing cell.

use std::{collections::BTreeSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    dtypes::{FinalType, FinalTypes, IdentifierColumns},
    finalize::{ToNan, finalize},
    frequency::{ConfirmedFactors, DEFAULT_CONFIRM_THRESHOLD, confirm},
    io_utils::DEFAULT_NA_TOKENS,
    rewrite::rewrite,
    scan::{DEFAULT_MISSING_PATTERN, ScanOutcome, missing_pattern, scan},
    table::Table,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CleanOptions {
    /// Regex flagging values that read as missing; matched case-insensitively.
    pub pattern: String,
    /// A candidate factor is confirmed when found in more columns than this.
    pub threshold: usize,
    /// Replaces the default identifier columns when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_columns: Option<Vec<String>>,
    /// Cell spellings loaded as native missing values.
    pub na_tokens: Vec<String>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_MISSING_PATTERN.to_string(),
            threshold: DEFAULT_CONFIRM_THRESHOLD,
            identifier_columns: None,
            na_tokens: DEFAULT_NA_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl CleanOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let options = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        Ok(options)
    }

    pub fn identifiers(&self) -> IdentifierColumns {
        match &self.identifier_columns {
            Some(names) => IdentifierColumns::new(names.iter().cloned()),
            None => IdentifierColumns::default(),
        }
    }

    pub fn compiled_pattern(&self) -> Result<Regex> {
        missing_pattern(&self.pattern)
            .with_context(|| format!("Compiling missing-value pattern '{}'", self.pattern))
    }
}

/// Scan and confirm only; the table is left untouched.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub scan: ScanOutcome,
    pub confirmed: ConfirmedFactors,
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub scan: ScanOutcome,
    pub confirmed: ConfirmedFactors,
    pub to_nan: ToNan,
    pub final_types: FinalTypes,
    pub table: Table,
}

/// Maps every textual spelling of a confirmed factor present in `table` to a missing cell.
pub fn build_to_nan(table: &Table, confirmed: &ConfirmedFactors) -> ToNan {
    let spellings: BTreeSet<&str> = table
        .columns()
        .iter()
        .flat_map(|column| column.values())
        .filter_map(|value| match value {
            Value::Text(text) if confirmed.contains(&text.to_lowercase()) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    ToNan::to_missing(spellings)
}

pub fn probe_table(table: &Table, options: &CleanOptions) -> Result<ProbeOutcome> {
    let pattern = options.compiled_pattern()?;
    let identifiers = options.identifiers();
    let scan = scan(table, &pattern, &identifiers).context("Scanning column dtypes")?;
    let confirmed = confirm(&scan.candidate_unknowns, table, options.threshold);
    info!(
        "Scanned {} column(s); {} candidate factor(s), {} confirmed",
        scan.column_types.len(),
        scan.candidate_unknowns.len(),
        confirmed.len()
    );
    Ok(ProbeOutcome { scan, confirmed })
}

pub fn clean_table(table: Table, options: &CleanOptions) -> Result<CleanOutcome> {
    let ProbeOutcome {
        mut scan,
        confirmed,
    } = probe_table(&table, options)?;
    let to_nan = build_to_nan(&table, &confirmed);
    let (final_types, working) = finalize(
        &mut scan.column_types,
        table,
        &to_nan,
        &options.identifiers(),
    )
    .context("Resolving final dtypes")?;
    let table = rewrite(&final_types, working).context("Rewriting table dtypes")?;
    let quantitative = final_types
        .iter()
        .filter(|(_, final_type)| *final_type == FinalType::Quantitative)
        .count();
    info!(
        "Finalized {} column(s): {} quantitative, {} textual",
        final_types.len(),
        quantitative,
        final_types.len() - quantitative
    );
    Ok(CleanOutcome {
        scan,
        confirmed,
        to_nan,
        final_types,
        table,
    })
}
