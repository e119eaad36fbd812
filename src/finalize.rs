//! Third stage: settle every column on textual (`O`) or quantitative (`Q`).
//!
//! Columns the scanner left as `check` or `object` get the caller's [`ToNan`]
//! substitutions applied before a second float scan. Substitutions are written to
//! the table that is handed back, so the rewriter sees the same cells the decision
//! was based on.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    data::Value,
    dtypes::{ColumnTypes, FinalType, FinalTypes, IdentifierColumns, TypeTag},
    error::{DtypeError, Result},
    table::{Column, Table},
};

/// Exact textual value → replacement, applied column-wide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToNan {
    replacements: BTreeMap<String, Value>,
}

impl ToNan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps every given value to the native missing marker.
    pub fn to_missing<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replacements: values
                .into_iter()
                .map(|value| (value.into(), Value::Missing))
                .collect(),
        }
    }

    pub fn insert(&mut self, from: impl Into<String>, to: Value) {
        self.replacements.insert(from.into(), to);
    }

    pub fn lookup(&self, value: &Value) -> Option<&Value> {
        match value {
            Value::Text(text) => self.replacements.get(text),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.replacements
            .iter()
            .map(|(from, to)| (from.as_str(), to))
    }

    /// Replaces matching cells in place and returns how many changed.
    pub fn apply(&self, column: &mut Column) -> usize {
        if self.is_empty() {
            return 0;
        }
        let mut replaced = 0usize;
        column.map_values(|value| {
            let replacement = self.lookup(value).cloned();
            if replacement.is_some() {
                replaced += 1;
            }
            replacement
        });
        replaced
    }
}

pub fn finalize(
    column_types: &mut ColumnTypes,
    mut table: Table,
    to_nan: &ToNan,
    identifiers: &IdentifierColumns,
) -> Result<(FinalTypes, Table)> {
    if let Some(untyped) = table
        .columns()
        .iter()
        .find(|column| column_types.get(column.name()).is_none())
    {
        return Err(DtypeError::InconsistentColumnReference(
            untyped.name().to_string(),
        ));
    }
    if let Some(orphan) = column_types
        .iter()
        .find(|record| !table.contains(&record.name))
    {
        return Err(DtypeError::InconsistentColumnReference(orphan.name.clone()));
    }

    let mut final_types = FinalTypes::default();
    for record in column_types.iter_mut() {
        let final_type = if identifiers.contains(&record.name) {
            FinalType::Textual
        } else {
            match record.latest() {
                TypeTag::Check | TypeTag::Object => {
                    let column = table.column_mut(&record.name).ok_or_else(|| {
                        DtypeError::InconsistentColumnReference(record.name.clone())
                    })?;
                    let replaced = to_nan.apply(column);
                    let resolved = resolve_column(column);
                    debug!(
                        "Column '{}' resolved {} -> {} after {} substitution(s)",
                        record.name,
                        record.latest(),
                        resolved,
                        replaced
                    );
                    resolved
                }
                TypeTag::Float64 => FinalType::Quantitative,
            }
        };
        record.push(final_type.tag());
        final_types.insert(record.name.clone(), final_type);
    }
    Ok((final_types, table))
}

/// `Q` when every non-missing distinct value parses as float, `O` on the first that does not.
fn resolve_column(column: &Column) -> FinalType {
    let textual = column
        .distinct_values()
        .into_iter()
        .filter(|value| !value.is_native_missing())
        .any(|value| value.parse_float().is_none());
    if textual {
        FinalType::Textual
    } else {
        FinalType::Quantitative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NativeType;
    use crate::dtypes::ColumnTypeRecord;

    fn record(name: &str, native: NativeType, inferred: TypeTag) -> ColumnTypeRecord {
        let mut record = ColumnTypeRecord::new(name, native);
        record.push(inferred);
        record
    }

    #[test]
    fn to_nan_replaces_only_exact_text() {
        let to_nan = ToNan::to_missing(["unk"]);
        let mut column = Column::new(
            "weight_kg",
            vec![
                Value::text("unk"),
                Value::text("UNK"),
                Value::Float(1.0),
                Value::text("unk"),
            ],
        );
        assert_eq!(to_nan.apply(&mut column), 2);
        assert_eq!(
            column.values(),
            &[
                Value::Missing,
                Value::text("UNK"),
                Value::Float(1.0),
                Value::Missing
            ]
        );
    }

    #[test]
    fn check_column_depends_on_substitution() {
        let table = Table::from_columns([(
            "weight_kg",
            vec![Value::text("55.2"), Value::text("unk"), Value::text("60.0")],
        )])
        .expect("table");
        let mut types = ColumnTypes::default();
        types.push(record("weight_kg", NativeType::Object, TypeTag::Check));

        let mut unconfirmed = types.clone();
        let (finals, _) = finalize(
            &mut unconfirmed,
            table.clone(),
            &ToNan::new(),
            &IdentifierColumns::default(),
        )
        .expect("finalize");
        assert_eq!(finals.get("weight_kg"), Some(FinalType::Textual));

        let (finals, working) = finalize(
            &mut types,
            table,
            &ToNan::to_missing(["unk"]),
            &IdentifierColumns::default(),
        )
        .expect("finalize");
        assert_eq!(finals.get("weight_kg"), Some(FinalType::Quantitative));
        assert_eq!(
            types.get("weight_kg").unwrap().tags(),
            &[TypeTag::Object, TypeTag::Check, TypeTag::Float64]
        );
        assert_eq!(working.column("weight_kg").unwrap().values()[1], Value::Missing);
    }

    #[test]
    fn identifiers_and_float_columns_skip_rescan() {
        let table = Table::from_columns([
            ("#SampleID", vec![Value::Float(1.0), Value::Float(2.0)]),
            ("age", vec![Value::Float(25.0), Value::Missing]),
        ])
        .expect("table");
        let mut types = ColumnTypes::default();
        types.push(record("#SampleID", NativeType::Float64, TypeTag::Object));
        types.push(record("age", NativeType::Float64, TypeTag::Float64));

        let (finals, working) =
            finalize(&mut types, table.clone(), &ToNan::new(), &IdentifierColumns::default())
                .expect("finalize");
        assert_eq!(finals.get("#SampleID"), Some(FinalType::Textual));
        assert_eq!(finals.get("age"), Some(FinalType::Quantitative));
        assert_eq!(working, table);
    }

    #[test]
    fn untyped_table_column_is_rejected() {
        let table = Table::from_columns([("age", vec![Value::Float(1.0)])]).expect("table");
        let mut types = ColumnTypes::default();
        let err = finalize(&mut types, table, &ToNan::new(), &IdentifierColumns::default())
            .unwrap_err();
        assert_eq!(err, DtypeError::InconsistentColumnReference("age".into()));
    }

    #[test]
    fn record_without_column_fails_before_any_tag_is_added() {
        let table = Table::from_columns([("diet", vec![Value::text("unk")])]).expect("table");
        let mut types = ColumnTypes::default();
        types.push(record("diet", NativeType::Object, TypeTag::Object));
        types.push(record("ghost", NativeType::Object, TypeTag::Check));
        let before = types.clone();

        let err = finalize(&mut types, table, &ToNan::new(), &IdentifierColumns::default())
            .unwrap_err();
        assert_eq!(err, DtypeError::InconsistentColumnReference("ghost".into()));
        assert_eq!(types, before);
    }
}
