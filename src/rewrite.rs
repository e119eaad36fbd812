//! Final stage: coerce each column's cells to its resolved dtype.

use log::debug;

use crate::{
    data::{Value, parse_float_str},
    dtypes::{FinalType, FinalTypes},
    error::{DtypeError, Result},
    table::Table,
};

/// Coerces every column named in `final_types`.
///
/// `Q` columns hold only `Float` and `Missing` afterwards; `O` columns hold only `Text`,
/// with missing cells spelled `nan`. Applying it to its own output changes nothing.
pub fn rewrite(final_types: &FinalTypes, mut table: Table) -> Result<Table> {
    if let Some((missing, _)) = final_types.iter().find(|(name, _)| !table.contains(name)) {
        return Err(DtypeError::InconsistentColumnReference(missing.to_string()));
    }

    // Coerce everything before touching the table so a failure leaves it intact.
    let mut coerced = Vec::with_capacity(final_types.len());
    for (name, final_type) in final_types.iter() {
        let column = table
            .column(name)
            .ok_or_else(|| DtypeError::InconsistentColumnReference(name.to_string()))?;
        let values = match final_type {
            FinalType::Quantitative => column
                .values()
                .iter()
                .map(|value| to_float(name, value))
                .collect::<Result<Vec<_>>>()?,
            FinalType::Textual => column.values().iter().map(to_text).collect(),
        };
        coerced.push((name, final_type, values));
    }

    for (name, final_type, values) in coerced {
        if let Some(column) = table.column_mut(name) {
            column.set_values(values);
        }
        debug!("Rewrote column '{name}' as {}", final_type.tag());
    }
    Ok(table)
}

fn to_float(column: &str, value: &Value) -> Result<Value> {
    let coerced = match value {
        Value::Missing => Value::Missing,
        Value::Float(f) if f.is_nan() => Value::Missing,
        Value::Float(f) => Value::Float(*f),
        Value::Text(text) => match parse_float_str(text) {
            Some(f) if f.is_nan() => Value::Missing,
            Some(f) => Value::Float(f),
            None => {
                return Err(DtypeError::Coercion {
                    column: column.to_string(),
                    raw: text.clone(),
                });
            }
        },
    };
    Ok(coerced)
}

fn to_text(value: &Value) -> Value {
    Value::Text(value.as_display())
}
