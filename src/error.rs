use thiserror::Error;

/// Result alias used by the dtype stages.
pub type Result<T> = std::result::Result<T, DtypeError>;

/// Errors surfaced by the dtype stages.
///
/// Float parse failures are never reported here; they only steer classification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DtypeError {
    /// The table has no columns to classify.
    #[error("table has no columns")]
    EmptyTable,

    /// Two columns share the same name.
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// A column does not have as many values as the first column.
    #[error("column '{column}' has {found} value(s) but the table has {expected} row(s)")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    /// An explicitly requested identifier column is not part of the table.
    #[error("identifier column '{0}' not found in table")]
    MissingIdentifierColumn(String),

    /// A stage output references a column the table does not contain.
    #[error("column '{0}' is referenced by the dtype map but absent from the table")]
    InconsistentColumnReference(String),

    /// A value could not be coerced to float while rewriting a quantitative column.
    #[error("cannot coerce '{raw}' in column '{column}' to float")]
    Coercion { column: String, raw: String },
}
