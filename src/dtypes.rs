//! Per-column dtype bookkeeping shared by the scan, finalize and rewrite stages.
//!
//! Each column owns a [`ColumnTypeRecord`]: the native storage type followed by
//! one tag per stage. Tags are only ever appended, so the record doubles as a
//! history of how the column was classified.

use std::fmt;

use serde::Serialize;

use crate::{
    data::NativeType,
    error::{DtypeError, Result},
    table::Table,
};

pub const DEFAULT_IDENTIFIER_COLUMNS: &[&str] = &["#SampleID", "sample_name"];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Float64,
    Object,
    /// Mixture of float-parseable and other values, resolved by the finalizer.
    Check,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Float64 => "float64",
            TypeTag::Object => "object",
            TypeTag::Check => "check",
        }
    }
}

impl From<NativeType> for TypeTag {
    fn from(native: NativeType) -> Self {
        match native {
            NativeType::Float64 => TypeTag::Float64,
            NativeType::Object => TypeTag::Object,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTypeRecord {
    pub name: String,
    pub native: NativeType,
    tags: Vec<TypeTag>,
}

impl ColumnTypeRecord {
    pub fn new(name: impl Into<String>, native: NativeType) -> Self {
        Self {
            name: name.into(),
            native,
            tags: vec![TypeTag::from(native)],
        }
    }

    /// Full tag history, starting with the native type.
    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    pub fn push(&mut self, tag: TypeTag) {
        self.tags.push(tag);
    }

    pub fn latest(&self) -> TypeTag {
        // the native tag is always present
        *self.tags.last().unwrap_or(&TypeTag::from(self.native))
    }

    /// Tag assigned by the scanner, if it ran.
    pub fn inferred(&self) -> Option<TypeTag> {
        self.tags.get(1).copied()
    }
}

/// Column type records in table column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTypes {
    records: Vec<ColumnTypeRecord>,
}

impl ColumnTypes {
    pub fn push(&mut self, record: ColumnTypeRecord) {
        self.records.push(record);
    }

    pub fn get(&self, name: &str) -> Option<&ColumnTypeRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ColumnTypeRecord> {
        self.records.iter_mut().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnTypeRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ColumnTypeRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolved dtype of a column.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum FinalType {
    #[serde(rename = "O")]
    Textual,
    #[serde(rename = "Q")]
    Quantitative,
}

impl FinalType {
    pub fn code(&self) -> char {
        match self {
            FinalType::Textual => 'O',
            FinalType::Quantitative => 'Q',
        }
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            FinalType::Textual => TypeTag::Object,
            FinalType::Quantitative => TypeTag::Float64,
        }
    }
}

impl fmt::Display for FinalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Final dtype per column, in the order columns were resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalTypes {
    entries: Vec<(String, FinalType)>,
}

impl FinalTypes {
    pub fn insert(&mut self, name: impl Into<String>, final_type: FinalType) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = final_type,
            None => self.entries.push((name, final_type)),
        }
    }

    pub fn get(&self, name: &str) -> Option<FinalType> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, final_type)| *final_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FinalType)> {
        self.entries
            .iter()
            .map(|(name, final_type)| (name.as_str(), *final_type))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FinalType)> for FinalTypes {
    fn from_iter<T: IntoIterator<Item = (S, FinalType)>>(iter: T) -> Self {
        let mut types = FinalTypes::default();
        for (name, final_type) in iter {
            types.insert(name, final_type);
        }
        types
    }
}

/// Columns holding sample identifiers. They are always textual and never scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierColumns {
    names: Vec<String>,
    explicit: bool,
}

impl Default for IdentifierColumns {
    fn default() -> Self {
        Self {
            names: DEFAULT_IDENTIFIER_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            explicit: false,
        }
    }
}

impl IdentifierColumns {
    /// Overrides the default identifier set. Every name must then exist in the table.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            explicit: true,
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.names.iter().any(|name| name == column)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn validate(&self, table: &Table) -> Result<()> {
        if !self.explicit {
            return Ok(());
        }
        match self.names.iter().find(|name| !table.contains(name)) {
            Some(absent) => Err(DtypeError::MissingIdentifierColumn(absent.clone())),
            None => Ok(()),
        }
    }
}
