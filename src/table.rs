//! In-memory table handed between the dtype stages.
//!
//! A [`Table`] is an ordered set of uniquely named [`Column`]s of equal length.
//! Stages take the table by value when they rewrite cells and return it, so a
//! caller never observes a half-substituted table.

use std::collections::HashSet;

use crate::{
    data::{NativeType, Value},
    error::{DtypeError, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn native_type(&self) -> NativeType {
        NativeType::of_values(&self.values)
    }

    /// Distinct values in first-occurrence order.
    ///
    /// Every value whose string form is the native missing marker collapses into one entry.
    pub fn distinct_values(&self) -> Vec<&Value> {
        let mut seen = HashSet::new();
        self.values
            .iter()
            .filter(|value| seen.insert(DistinctKey::of(value)))
            .collect()
    }

    pub fn set_values(&mut self, values: Vec<Value>) {
        self.values = values;
    }

    pub fn map_values<F>(&mut self, mut f: F)
    where
        F: FnMut(&Value) -> Option<Value>,
    {
        for value in &mut self.values {
            if let Some(replacement) = f(value) {
                *value = replacement;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DistinctKey<'a> {
    Missing,
    Float(u64),
    Text(&'a str),
}

impl<'a> DistinctKey<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Missing => DistinctKey::Missing,
            Value::Float(f) if f.is_nan() => DistinctKey::Missing,
            // -0.0 and 0.0 are the same cell value
            Value::Float(f) => DistinctKey::Float((f + 0.0).to_bits()),
            Value::Text(s) => DistinctKey::Text(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name()) {
                return Err(DtypeError::DuplicateColumn(column.name().to_string()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(ragged) = columns.iter().find(|c| c.len() != expected) {
                return Err(DtypeError::RaggedColumn {
                    column: ragged.name().to_string(),
                    expected,
                    found: ragged.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        Self::new(
            columns
                .into_iter()
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Replaces the values of an existing column in place.
    pub fn replace_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        let expected = self.row_count();
        let column = self
            .column_mut(name)
            .ok_or_else(|| DtypeError::InconsistentColumnReference(name.to_string()))?;
        if values.len() != expected {
            return Err(DtypeError::RaggedColumn {
                column: name.to_string(),
                expected,
                found: values.len(),
            });
        }
        column.set_values(values);
        Ok(())
    }

    /// Cells of row `index` in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count()).filter_map(move |idx| self.row(idx))
    }
}
