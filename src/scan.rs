//! First stage: native/inferred dtype per column and candidate missing factors.
//!
//! Every distinct value of a non-identifier column lands in exactly one bucket of
//! a [`ValueTally`]: native missing, float-parseable, or other. The tally decides
//! the preliminary tag (`float64`, `object`, `check`). Non-float values that look
//! like short free-text words are harvested as candidate missing factors, and any
//! value hitting the caller's missing pattern is kept for diagnostics.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::{
    data::Value,
    dtypes::{ColumnTypeRecord, ColumnTypes, IdentifierColumns, TypeTag},
    error::{DtypeError, Result},
    table::{Column, Table},
};

/// Default lexical pattern for values that read as "no data".
pub const DEFAULT_MISSING_PATTERN: &str = r"unk|not ?provided|not ?collected|not ?applicable|missing|unspecified|restricted|^n/?a$|^none$|^null$";

const UNSPECIFIED_MARKER: &str = ":Unspecified";
const CANDIDATE_MAX_CHARS: usize = 20;

/// Lowercased factor → columns where it was seen, iterated in sorted factor order.
pub type CandidateUnknowns = BTreeMap<String, Vec<String>>;

/// Compiles a missing-value pattern, matching case-insensitively.
pub fn missing_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTally {
    pub missing_count: usize,
    pub float_count: usize,
    pub non_float_count: usize,
    pub non_float_values: Vec<Value>,
}

impl ValueTally {
    pub fn classify(&self) -> TypeTag {
        if self.non_float_count == 0 {
            // a column of only native missing values is still numeric
            TypeTag::Float64
        } else if self.float_count > 0 || self.missing_count > 0 {
            TypeTag::Check
        } else {
            TypeTag::Object
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub column_types: ColumnTypes,
    pub candidate_unknowns: CandidateUnknowns,
    /// Every value, in its original case, that hit the missing pattern.
    pub nan_diversity: BTreeSet<String>,
    /// Tallies of the scanned (non-identifier) columns.
    pub tallies: BTreeMap<String, ValueTally>,
}

/// True when the lowercased value hits the caller's missing pattern.
pub fn matches_missing_pattern(pattern: &Regex, lowered: &str) -> bool {
    pattern.is_match(lowered)
}

/// Short word-like value: under 20 chars, no `/`, no `-`, no digit.
pub fn is_unknown_candidate(lowered: &str) -> bool {
    lowered.chars().count() < CANDIDATE_MAX_CHARS
        && !lowered.contains(['/', '-'])
        && !lowered.chars().any(is_digit_char)
}

/// Decimal digits in any script plus superscript and circled digits.
///
/// Vulgar fractions and Roman numerals are numeric but not digits, so
/// "½ portion" still reads as a word.
fn is_digit_char(c: char) -> bool {
    c.is_ascii_digit()
        || (c.is_numeric()
            && !matches!(c, '\u{00BC}'..='\u{00BE}' | '\u{2150}'..='\u{218B}'))
}

pub fn scan(
    table: &Table,
    pattern: &Regex,
    identifiers: &IdentifierColumns,
) -> Result<ScanOutcome> {
    if table.column_count() == 0 {
        return Err(DtypeError::EmptyTable);
    }
    identifiers.validate(table)?;

    let mut outcome = ScanOutcome::default();
    for column in table.columns() {
        let mut record = ColumnTypeRecord::new(column.name(), column.native_type());
        if identifiers.contains(column.name()) {
            record.push(TypeTag::Object);
            debug!("Column '{}' is an identifier; forced to object", column.name());
            outcome.column_types.push(record);
            continue;
        }

        let tally = scan_column(column, pattern, &mut outcome);
        let tag = tally.classify();
        debug!(
            "Column '{}' native={} inferred={} (missing={}, float={}, non-float={})",
            column.name(),
            record.native,
            tag,
            tally.missing_count,
            tally.float_count,
            tally.non_float_count
        );
        record.push(tag);
        outcome.column_types.push(record);
        outcome.tallies.insert(column.name().to_string(), tally);
    }
    Ok(outcome)
}

fn scan_column(column: &Column, pattern: &Regex, outcome: &mut ScanOutcome) -> ValueTally {
    let mut tally = ValueTally::default();
    for value in column.distinct_values() {
        let display = value.as_display();
        let lowered = display.to_lowercase();

        if matches_missing_pattern(pattern, &lowered) && !display.contains(UNSPECIFIED_MARKER) {
            outcome.nan_diversity.insert(display.clone());
        }

        if value.is_native_missing() {
            tally.missing_count += 1;
        } else if value.parse_float().is_some() {
            tally.float_count += 1;
        } else {
            tally.non_float_count += 1;
            tally.non_float_values.push(value.clone());
            if is_unknown_candidate(&lowered) {
                let columns = outcome.candidate_unknowns.entry(lowered).or_default();
                // differently cased spellings of one factor share a lowercase key
                if columns.last().map(String::as_str) != Some(column.name()) {
                    columns.push(column.name().to_string());
                }
            }
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Regex {
        missing_pattern(DEFAULT_MISSING_PATTERN).expect("default pattern compiles")
    }

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::text(*v)).collect()
    }

    #[test]
    fn unknown_candidate_rejects_digits_slashes_and_long_values() {
        assert!(is_unknown_candidate("not provided"));
        assert!(is_unknown_candidate("omnivore"));
        assert!(!is_unknown_candidate("n/a"));
        assert!(!is_unknown_candidate("not-applicable"));
        assert!(!is_unknown_candidate("sample 2"));
        assert!(!is_unknown_candidate("no sample collected at all"));
        assert!(is_unknown_candidate("exactly nineteen ch"));
        assert!(!is_unknown_candidate("exactly twenty chars"));
    }

    #[test]
    fn unknown_candidate_only_rejects_digit_characters() {
        assert!(is_unknown_candidate("½ portion"));
        assert!(is_unknown_candidate("stage ⅳ"));
        assert!(is_unknown_candidate("stage Ⅳ"));
        assert!(!is_unknown_candidate("stage ²"));
        assert!(!is_unknown_candidate("sample ٣"));
        assert!(!is_unknown_candidate("sample ３"));
    }

    #[test]
    fn tally_classification_matches_bucket_mix() {
        let mut tally = ValueTally::default();
        assert_eq!(tally.classify(), TypeTag::Float64);
        tally.missing_count = 1;
        assert_eq!(tally.classify(), TypeTag::Float64);
        tally.non_float_count = 1;
        assert_eq!(tally.classify(), TypeTag::Check);
        tally.missing_count = 0;
        assert_eq!(tally.classify(), TypeTag::Object);
        tally.float_count = 2;
        assert_eq!(tally.classify(), TypeTag::Check);
    }

    #[test]
    fn scan_classifies_and_collects_candidates() {
        let table = Table::from_columns([
            ("sample_name", texts(&["1", "2", "3", "4"])),
            (
                "age",
                vec![
                    Value::Float(25.0),
                    Value::Float(30.0),
                    Value::Missing,
                    Value::Float(40.0),
                ],
            ),
            (
                "host_diet",
                texts(&["missing", "omnivore", "Not provided", "herbivore"]),
            ),
            ("weight_kg", texts(&["55.2", "unk", "60.0", "60.0"])),
        ])
        .expect("table");

        let outcome = scan(&table, &pattern(), &IdentifierColumns::default()).expect("scan");
        let tags: Vec<_> = outcome
            .column_types
            .iter()
            .map(|r| (r.name.as_str(), r.tags().to_vec()))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("sample_name", vec![TypeTag::Object, TypeTag::Object]),
                ("age", vec![TypeTag::Float64, TypeTag::Float64]),
                ("host_diet", vec![TypeTag::Object, TypeTag::Object]),
                ("weight_kg", vec![TypeTag::Object, TypeTag::Check]),
            ]
        );

        assert_eq!(
            outcome.candidate_unknowns.keys().collect::<Vec<_>>(),
            vec!["herbivore", "missing", "not provided", "omnivore", "unk"]
        );
        assert_eq!(outcome.candidate_unknowns["unk"], vec!["weight_kg"]);
        assert_eq!(
            outcome.nan_diversity.iter().collect::<Vec<_>>(),
            vec!["Not provided", "missing", "unk"]
        );

        let weight = &outcome.tallies["weight_kg"];
        assert_eq!(weight.float_count, 2);
        assert_eq!(weight.non_float_values, vec![Value::text("unk")]);
        assert!(!outcome.tallies.contains_key("sample_name"));
    }

    #[test]
    fn unspecified_values_are_not_diagnostic() {
        let table = Table::from_columns([(
            "env",
            texts(&["missing: not provided", "Missing:Unspecified"]),
        )])
        .expect("table");
        let outcome = scan(&table, &pattern(), &IdentifierColumns::default()).expect("scan");
        assert_eq!(
            outcome.nan_diversity.into_iter().collect::<Vec<_>>(),
            vec!["missing: not provided".to_string()]
        );
    }

    #[test]
    fn case_variants_register_column_once() {
        let table =
            Table::from_columns([("diet", texts(&["Unknown", "unknown", "UNKNOWN"]))])
                .expect("table");
        let outcome = scan(&table, &pattern(), &IdentifierColumns::default()).expect("scan");
        assert_eq!(outcome.candidate_unknowns["unknown"], vec!["diet"]);
        assert_eq!(outcome.tallies["diet"].non_float_count, 3);
    }

    #[test]
    fn scan_rejects_empty_table_and_unknown_identifier() {
        let empty = Table::default();
        assert_eq!(
            scan(&empty, &pattern(), &IdentifierColumns::default()).unwrap_err(),
            DtypeError::EmptyTable
        );

        let table = Table::from_columns([("age", vec![Value::Float(1.0)])]).expect("table");
        let custom = IdentifierColumns::new(["host_id"]);
        assert_eq!(
            scan(&table, &pattern(), &custom).unwrap_err(),
            DtypeError::MissingIdentifierColumn("host_id".into())
        );
    }
}
