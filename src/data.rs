use std::fmt;

use serde::Serialize;

/// String form shared by every native missing value.
pub const NATIVE_MISSING: &str = "nan";

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Float(f64),
    Text(String),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Missing => NATIVE_MISSING.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(s) => s.clone(),
        }
    }

    /// True when the string form of the value is the native missing marker.
    ///
    /// A `Float(NaN)` and a literal `Text("nan")` both qualify.
    pub fn is_native_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(f) => f.is_nan(),
            Value::Text(s) => s == NATIVE_MISSING,
        }
    }

    /// Attempts a float conversion of the value.
    ///
    /// `None` means the value is not numeric; callers use it as a classification signal.
    pub fn parse_float(&self) -> Option<f64> {
        match self {
            Value::Missing => Some(f64::NAN),
            Value::Float(f) => Some(*f),
            Value::Text(s) => parse_float_str(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Parses a textual cell as a float, ignoring surrounding whitespace.
///
/// Single underscores between digits are accepted as grouping (`1_000`).
pub fn parse_float_str(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains('_') {
        return strip_digit_separators(trimmed)?.parse::<f64>().ok();
    }
    trimmed.parse::<f64>().ok()
}

fn strip_digit_separators(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte != b'_' {
            continue;
        }
        let before = idx.checked_sub(1).map(|prev| bytes[prev]);
        let after = bytes.get(idx + 1).copied();
        if !before.is_some_and(|b| b.is_ascii_digit()) || !after.is_some_and(|b| b.is_ascii_digit())
        {
            return None;
        }
    }
    Some(value.replace('_', ""))
}

/// Renders a float the way the native table storage prints it (`25.0`, `0.5`, `nan`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        NATIVE_MISSING.to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "inf".to_string()
        } else {
            "-inf".to_string()
        }
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Storage type of a column as loaded, before any inference.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NativeType {
    Float64,
    Object,
}

impl NativeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeType::Float64 => "float64",
            NativeType::Object => "object",
        }
    }

    pub fn of_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let all_numeric = values
            .into_iter()
            .all(|value| matches!(value, Value::Missing | Value::Float(_)));
        if all_numeric {
            NativeType::Float64
        } else {
            NativeType::Object
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_float_keeps_one_decimal_for_whole_numbers() {
        assert_eq!(format_float(25.0), "25.0");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(55.2), "55.2");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn parse_float_handles_text_and_native_variants() {
        assert_eq!(Value::text(" 42 ").parse_float(), Some(42.0));
        assert_eq!(Value::text("1e3").parse_float(), Some(1000.0));
        assert_eq!(Value::text("unknown").parse_float(), None);
        assert_eq!(Value::text("").parse_float(), None);
        assert_eq!(Value::Float(1.5).parse_float(), Some(1.5));
        assert!(Value::Missing.parse_float().is_some_and(f64::is_nan));
    }

    #[test]
    fn parse_float_accepts_underscore_grouping_between_digits() {
        assert_eq!(parse_float_str("1_000"), Some(1000.0));
        assert_eq!(parse_float_str(" 12_345.5_0 "), Some(12345.5));
        assert_eq!(parse_float_str("_1"), None);
        assert_eq!(parse_float_str("1_"), None);
        assert_eq!(parse_float_str("1__0"), None);
        assert_eq!(parse_float_str("1_.5"), None);
    }

    #[test]
    fn native_missing_matches_string_form() {
        assert!(Value::Missing.is_native_missing());
        assert!(Value::Float(f64::NAN).is_native_missing());
        assert!(Value::text("nan").is_native_missing());
        assert!(!Value::text("NaN").is_native_missing());
        assert!(!Value::text("missing").is_native_missing());
    }

    #[test]
    fn native_type_follows_storage() {
        let numeric = [Value::Float(1.0), Value::Missing];
        assert_eq!(NativeType::of_values(&numeric), NativeType::Float64);
        let mixed = [Value::Float(1.0), Value::text("a")];
        assert_eq!(NativeType::of_values(&mixed), NativeType::Object);
        let empty: Vec<Value> = Vec::new();
        assert_eq!(NativeType::of_values(&empty), NativeType::Float64);
    }
}
