//! Human and machine readable summaries of a dtype run.
//!
//! [`DtypeReport`] is persisted as YAML when the target ends in `.yml`/`.yaml`
//! and as pretty JSON otherwise. [`render_table`] lays rows out as an elastic
//! text table for the terminal.

use std::{borrow::Cow, collections::BTreeMap, fmt::Write as _, fs::File, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    data::NativeType,
    dtypes::{ColumnTypes, FinalType, FinalTypes, TypeTag},
    frequency::ConfirmedFactors,
    pipeline::{CleanOutcome, ProbeOutcome},
    scan::ScanOutcome,
};

#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub name: String,
    pub native: NativeType,
    pub tags: Vec<TypeTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_type: Option<FinalType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub non_float_values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DtypeReport {
    pub columns: Vec<ColumnReport>,
    pub candidate_unknowns: BTreeMap<String, Vec<String>>,
    pub confirmed: ConfirmedFactors,
    pub nan_diversity: Vec<String>,
}

impl DtypeReport {
    pub fn from_probe(outcome: &ProbeOutcome) -> Self {
        Self::build(&outcome.scan, &outcome.scan.column_types, None, &outcome.confirmed)
    }

    pub fn from_clean(outcome: &CleanOutcome) -> Self {
        Self::build(
            &outcome.scan,
            &outcome.scan.column_types,
            Some(&outcome.final_types),
            &outcome.confirmed,
        )
    }

    fn build(
        scan: &ScanOutcome,
        column_types: &ColumnTypes,
        final_types: Option<&FinalTypes>,
        confirmed: &ConfirmedFactors,
    ) -> Self {
        let columns = column_types
            .iter()
            .map(|record| ColumnReport {
                name: record.name.clone(),
                native: record.native,
                tags: record.tags().to_vec(),
                final_type: final_types.and_then(|types| types.get(&record.name)),
                non_float_values: scan
                    .tallies
                    .get(&record.name)
                    .map(|tally| {
                        tally
                            .non_float_values
                            .iter()
                            .map(|value| value.as_display())
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            columns,
            candidate_unknowns: scan.candidate_unknowns.clone(),
            confirmed: confirmed.clone(),
            nan_diversity: scan.nan_diversity.iter().cloned().collect(),
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing dtype report as YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));
        let file = File::create(path).with_context(|| format!("Creating report file {path:?}"))?;
        if yaml {
            serde_yaml::to_writer(file, self).context("Writing report YAML")
        } else {
            serde_json::to_writer_pretty(file, self).context("Writing report JSON")
        }
    }

    pub fn column_headers() -> Vec<String> {
        ["column", "native", "inferred", "final", "non-float"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn column_rows(&self) -> Vec<Vec<String>> {
        self.columns
            .iter()
            .map(|column| {
                vec![
                    column.name.clone(),
                    column.native.to_string(),
                    column
                        .tags
                        .get(1)
                        .map(TypeTag::to_string)
                        .unwrap_or_default(),
                    column
                        .final_type
                        .map(|final_type| final_type.code().to_string())
                        .unwrap_or_default(),
                    column.non_float_values.len().to_string(),
                ]
            })
            .collect()
    }

    pub fn factor_headers() -> Vec<String> {
        ["factor", "columns", "confirmed"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// One row per candidate factor, most widespread first.
    pub fn factor_rows(&self) -> Vec<Vec<String>> {
        self.candidate_unknowns
            .iter()
            .map(|(factor, columns)| (factor.as_str(), columns.len()))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .map(|(factor, count)| {
                let confirmed = if self.confirmed.contains(factor) {
                    "yes"
                } else {
                    "no"
                };
                vec![factor.to_string(), count.to_string(), confirmed.to_string()]
            })
            .collect()
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(1))).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
