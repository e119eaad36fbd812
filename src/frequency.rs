//! Second stage: promote candidate missing factors that recur across columns.
//!
//! Frequency here is the number of distinct table columns a factor appears in,
//! never the number of rows.

use std::collections::{BTreeMap, HashSet};

use log::debug;
use serde::Serialize;

use crate::{scan::CandidateUnknowns, table::Table};

pub const DEFAULT_CONFIRM_THRESHOLD: usize = 10;

/// Binary table columns × candidate factors; a cell is set when the factor occurs in
/// that column. Factors are kept in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidenceMatrix {
    columns: Vec<String>,
    factors: Vec<String>,
    cells: Vec<Vec<bool>>,
}

impl IncidenceMatrix {
    pub fn build(candidates: &CandidateUnknowns, table: &Table) -> Self {
        let factors: Vec<String> = candidates.keys().cloned().collect();
        let occurrences: Vec<HashSet<&str>> = candidates
            .values()
            .map(|columns| columns.iter().map(String::as_str).collect())
            .collect();
        let columns = table.headers();
        let cells = columns
            .iter()
            .map(|column| {
                occurrences
                    .iter()
                    .map(|seen| seen.contains(column.as_str()))
                    .collect()
            })
            .collect();
        Self {
            columns,
            factors,
            cells,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    pub fn is_set(&self, column: &str, factor: &str) -> bool {
        let Some(row) = self.columns.iter().position(|c| c == column) else {
            return false;
        };
        let Some(col) = self.factors.iter().position(|f| f == factor) else {
            return false;
        };
        self.cells[row][col]
    }

    /// Number of table columns containing each factor, in factor order.
    pub fn column_sums(&self) -> Vec<(&str, usize)> {
        self.factors
            .iter()
            .enumerate()
            .map(|(idx, factor)| {
                let sum = self.cells.iter().filter(|row| row[idx]).count();
                (factor.as_str(), sum)
            })
            .collect()
    }
}

/// Factors seen in more columns than the threshold, with their column counts.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConfirmedFactors {
    counts: BTreeMap<String, usize>,
}

impl ConfirmedFactors {
    pub fn contains(&self, factor: &str) -> bool {
        self.counts.contains_key(factor)
    }

    pub fn count(&self, factor: &str) -> Option<usize> {
        self.counts.get(factor).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts
            .iter()
            .map(|(factor, count)| (factor.as_str(), *count))
    }

    pub fn factors(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

pub fn confirm(candidates: &CandidateUnknowns, table: &Table, threshold: usize) -> ConfirmedFactors {
    if candidates.is_empty() {
        return ConfirmedFactors::default();
    }
    let matrix = IncidenceMatrix::build(candidates, table);
    let counts = matrix
        .column_sums()
        .into_iter()
        .filter(|(_, sum)| *sum > threshold)
        .map(|(factor, sum)| (factor.to_string(), sum))
        .collect::<BTreeMap<_, _>>();
    debug!(
        "Confirmed {} of {} candidate factor(s) above threshold {}",
        counts.len(),
        matrix.factors().len(),
        threshold
    );
    ConfirmedFactors { counts }
}
